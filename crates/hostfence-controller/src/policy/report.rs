//! 清理结果报告
//!
//! cleanup 按“尽力而为”执行：每一次删除都会尝试，失败只记录不中断。
//! 报告把每条清单的结果交还给调用方，调用方不能把完成视为集群已经干净。

use std::fmt;
use tracing::{debug, info, warn};

use hostfence_common::{Error, ManifestKind, Result};

/// 单条清单的删除结果
#[derive(Debug)]
pub struct CleanupOutcome {
    /// 清单种类
    pub kind: ManifestKind,
    /// 资源名称
    pub name: String,
    /// 删除结果
    pub result: Result<()>,
}

impl CleanupOutcome {
    /// 资源在删除前已不存在
    pub fn is_absent(&self) -> bool {
        matches!(&self.result, Err(e) if e.is_not_found())
    }

    /// 删除失败（资源不存在不算失败）
    pub fn is_failure(&self) -> bool {
        self.result.is_err() && !self.is_absent()
    }

    /// 失败原因
    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}

/// 清理报告
#[derive(Debug, Default)]
pub struct CleanupReport {
    outcomes: Vec<CleanupOutcome>,
}

impl CleanupReport {
    /// 创建空报告
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条结果并输出日志
    pub fn record(&mut self, kind: ManifestKind, name: String, result: Result<()>) {
        match &result {
            Ok(()) => debug!("已删除 {} {}", kind, name),
            Err(e) if e.is_not_found() => info!("{} {} 不存在，跳过", kind, name),
            Err(e) => warn!("删除 {} {} 失败: {}", kind, name, e),
        }
        self.outcomes.push(CleanupOutcome { kind, name, result });
    }

    /// 全部结果，按删除顺序排列
    pub fn outcomes(&self) -> &[CleanupOutcome] {
        &self.outcomes
    }

    /// 失败的结果
    pub fn failures(&self) -> impl Iterator<Item = &CleanupOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    /// 所有删除都成功或资源本就不存在
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// 尝试过的删除次数
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        let absent = self.outcomes.iter().filter(|o| o.is_absent()).count();
        writeln!(
            f,
            "清理完成: 共 {} 项，失败 {} 项，不存在 {} 项",
            self.outcomes.len(),
            failed,
            absent
        )?;
        for outcome in &self.outcomes {
            let state = match &outcome.result {
                Ok(()) => "deleted".to_string(),
                Err(e) if e.is_not_found() => "absent".to_string(),
                Err(e) => format!("failed: {}", e),
            };
            writeln!(f, "  {:<16} {:<32} {}", outcome.kind, outcome.name, state)?;
        }
        Ok(())
    }
}
