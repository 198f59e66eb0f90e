//! 地址来源
//!
//! 过滤规则的地址可以来自三处，按以下顺序拼接：配置中的内联列表、
//! 地址文件、按种子生成的伪随机主机地址。

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use tracing::info;

use hostfence_common::AddressRange;

use crate::config::AgentConfig;

/// 解析地址文件内容：每行一个 CIDR，忽略空行与 `#` 注释
pub fn parse_lines(content: &str) -> Result<Vec<AddressRange>> {
    let mut ranges = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = match line.split_once('#') {
            Some((before, _)) => before,
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        let range = line
            .parse::<AddressRange>()
            .with_context(|| format!("第 {} 行", lineno + 1))?;
        ranges.push(range);
    }
    Ok(ranges)
}

/// 读取地址文件
pub fn load_file(path: &Path) -> Result<Vec<AddressRange>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取地址文件: {:?}", path))?;
    parse_lines(&content).with_context(|| format!("地址文件格式错误: {:?}", path))
}

/// 由种子确定性地生成 `count` 个 IPv4 主机地址
pub fn generate(count: usize, seed: u64) -> Vec<AddressRange> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| AddressRange::host(IpAddr::V4(Ipv4Addr::from(rng.gen::<u32>()))))
        .collect()
}

/// 按配置收集全部地址
pub fn collect(config: &AgentConfig) -> Result<Vec<AddressRange>> {
    let mut ranges = config.addresses.clone();

    if let Some(path) = &config.addresses_file {
        let loaded = load_file(path)?;
        info!("从 {:?} 读取 {} 条地址", path, loaded.len());
        ranges.extend(loaded);
    }

    if let Some(generate_config) = &config.generate {
        ranges.extend(generate(generate_config.count, generate_config.seed));
        info!(
            "按种子 {} 生成 {} 条地址",
            generate_config.seed, generate_config.count
        );
    }

    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{create_default_config, GenerateConfig};
    use std::io::Write;

    #[test]
    fn test_parse_lines_skips_comments_and_blanks() {
        let ranges = parse_lines("# 允许列表\n10.0.0.0/8\n\n  192.168.0.1  # 网关\n2001:db8::/32\n").unwrap();
        let rendered: Vec<String> = ranges.iter().map(|r| r.to_string()).collect();
        assert_eq!(rendered, vec!["10.0.0.0/8", "192.168.0.1/32", "2001:db8::/32"]);
    }

    #[test]
    fn test_parse_lines_reports_line_number() {
        let err = parse_lines("10.0.0.0/8\nbogus\n").unwrap_err();
        assert!(format!("{:#}", err).contains("第 2 行"));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let first = generate(1000, 7);
        assert_eq!(first.len(), 1000);
        assert_eq!(first, generate(1000, 7));
        assert_ne!(first, generate(1000, 8));
        assert!(first.iter().all(|r| r.prefix_len() == 32));
        assert!(generate(0, 7).is_empty());
    }

    #[test]
    fn test_collect_concatenates_sources_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "172.16.0.0/12").unwrap();

        let mut config = create_default_config();
        config.addresses = vec!["10.0.0.0/8".parse().unwrap()];
        config.addresses_file = Some(file.path().to_path_buf());
        config.generate = Some(GenerateConfig { count: 2, seed: 1 });

        let ranges = collect(&config).unwrap();

        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[0].to_string(), "10.0.0.0/8");
        assert_eq!(ranges[1].to_string(), "172.16.0.0/12");
        assert_eq!(&ranges[2..], generate(2, 1).as_slice());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut config = create_default_config();
        config.addresses_file = Some("/nonexistent/hostfence/addresses.txt".into());
        assert!(collect(&config).is_err());
    }
}
