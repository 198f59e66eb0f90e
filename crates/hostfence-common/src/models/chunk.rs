//! 地址列表分片
//!
//! 单个地址集合资源能容纳的条目数有硬上限，因此需要把任意长度的地址列表
//! 切分为多个有序分片，每个分片对应一个地址集合清单。

use std::num::NonZeroUsize;

use super::address::AddressRange;

/// 每个地址集合清单的默认最大条目数
pub const DEFAULT_MAX_ENTRIES_PER_MANIFEST: usize = 10_000;

/// 地址列表的一个分片
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// 从 0 开始的连续序号，用于生成资源名称
    pub index: usize,
    /// 属于该分片的地址
    pub addresses: &'a [AddressRange],
}

impl Chunk<'_> {
    /// 分片中的条目数
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// 分片是否为空（仅当整个列表为空时出现）
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// 按 `max_per_chunk` 切分地址列表
///
/// 保持输入顺序，分片数为 `ceil(len / max_per_chunk)`；输入为空时返回一个空分片，
/// 以便仍能渲染出格式完整的清单。
pub fn chunk(addresses: &[AddressRange], max_per_chunk: NonZeroUsize) -> Vec<Chunk<'_>> {
    if addresses.is_empty() {
        return vec![Chunk {
            index: 0,
            addresses,
        }];
    }

    addresses
        .chunks(max_per_chunk.get())
        .enumerate()
        .map(|(index, addresses)| Chunk { index, addresses })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::net::{IpAddr, Ipv4Addr};

    fn addresses(n: usize) -> Vec<AddressRange> {
        (0..n)
            .map(|i| AddressRange::host(IpAddr::V4(Ipv4Addr::from(0x0a00_0000 + i as u32))))
            .collect()
    }

    fn max(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[rstest]
    #[case(0, 3, vec![0])]
    #[case(1, 3, vec![1])]
    #[case(3, 3, vec![3])]
    #[case(4, 3, vec![3, 1])]
    #[case(6, 3, vec![3, 3])]
    #[case(7, 1, vec![1, 1, 1, 1, 1, 1, 1])]
    #[case(25_000, 10_000, vec![10_000, 10_000, 5_000])]
    #[case(20_000, 10_000, vec![10_000, 10_000])]
    fn test_chunk_sizes(#[case] n: usize, #[case] per_chunk: usize, #[case] expected: Vec<usize>) {
        let input = addresses(n);
        let chunks = chunk(&input, max(per_chunk));

        let sizes: Vec<usize> = chunks.iter().map(Chunk::len).collect();
        assert_eq!(sizes, expected);

        let expected_count = if n == 0 { 1 } else { n.div_ceil(per_chunk) };
        assert_eq!(chunks.len(), expected_count);
    }

    #[test]
    fn test_chunk_indices_are_contiguous() {
        let input = addresses(10);
        let chunks = chunk(&input, max(4));
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        for n in [0, 1, 9, 10, 11, 57] {
            let input = addresses(n);
            let rebuilt: Vec<AddressRange> = chunk(&input, max(10))
                .iter()
                .flat_map(|c| c.addresses.iter().copied())
                .collect();
            assert_eq!(rebuilt, input);
        }
    }

    #[test]
    fn test_empty_input_yields_single_empty_chunk() {
        let chunks = chunk(&[], max(DEFAULT_MAX_ENTRIES_PER_MANIFEST));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_empty());
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_no_chunk_exceeds_limit() {
        let input = addresses(1_001);
        assert!(chunk(&input, max(100)).iter().all(|c| c.len() <= 100 && !c.is_empty()));
    }
}
