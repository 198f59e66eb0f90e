//! 子命令实现
//!
//! 各命令只依赖 `TrafficFilter`，便于替换过滤后端。

use anyhow::{bail, Result};
use std::time::Duration;
use tracing::{error, info};

use hostfence_common::AddressRange;
use hostfence_controller::utils::format_duration;
use hostfence_controller::{CleanupReport, TrafficFilter};

/// 安装过滤规则并返回耗时
pub async fn setup<F>(filter: &mut F, nets: &[AddressRange], iface: &str) -> Result<Duration>
where
    F: TrafficFilter + ?Sized,
{
    let elapsed = filter.set_up(nets, iface).await?;
    info!("安装完成，耗时 {}", format_duration(elapsed));
    Ok(elapsed)
}

/// 移除过滤规则；有删除失败时返回错误，报告仍然交给调用方
pub async fn cleanup<F>(filter: &mut F) -> (CleanupReport, Result<()>)
where
    F: TrafficFilter + ?Sized,
{
    let report = filter.clean_up().await;
    let result = if report.is_clean() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "清理未完成: {} 项删除失败",
            report.failures().count()
        ))
    };
    (report, result)
}

/// 计时安装后立即清理
///
/// 安装失败时同样执行清理，移除已经创建的部分资源。
pub async fn measure<F>(
    filter: &mut F,
    nets: &[AddressRange],
    iface: &str,
) -> Result<(Duration, CleanupReport)>
where
    F: TrafficFilter + ?Sized,
{
    let setup_result = filter.set_up(nets, iface).await;
    let report = filter.clean_up().await;

    match setup_result {
        Ok(elapsed) => {
            info!("安装耗时 {} 微秒", elapsed.as_micros());
            Ok((elapsed, report))
        }
        Err(e) => {
            error!("安装失败，已尝试清理: {}", e);
            bail!("安装失败: {}\n{}", e, report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hostfence_common::{ApplyAction, Error, ManifestKind};

    /// 记录调用的过滤器替身
    #[derive(Default)]
    struct RecordingFilter {
        fail_setup: bool,
        fail_cleanup: bool,
        calls: Vec<&'static str>,
    }

    #[async_trait]
    impl TrafficFilter for RecordingFilter {
        async fn set_up(&mut self, _nets: &[AddressRange], _iface: &str) -> hostfence_common::Result<Duration> {
            self.calls.push("set_up");
            if self.fail_setup {
                return Err(Error::Discovery("未知资源类型".to_string()));
            }
            Ok(Duration::from_micros(1500))
        }

        async fn clean_up(&mut self) -> CleanupReport {
            self.calls.push("clean_up");
            let mut report = CleanupReport::new();
            let result = if self.fail_cleanup {
                Err(Error::apply(ApplyAction::Delete, "hostfence-host", Some(500), "internal error"))
            } else {
                Ok(())
            };
            report.record(ManifestKind::GeneralPolicy, "hostfence-host".to_string(), result);
            report
        }
    }

    #[tokio::test]
    async fn test_measure_runs_setup_then_cleanup() {
        let mut filter = RecordingFilter::default();

        let (elapsed, report) = measure(&mut filter, &[], "eth0").await.unwrap();

        assert_eq!(elapsed.as_micros(), 1500);
        assert!(report.is_clean());
        assert_eq!(filter.calls, vec!["set_up", "clean_up"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_measure_cleans_up_after_failed_setup() {
        let mut filter = RecordingFilter {
            fail_setup: true,
            ..RecordingFilter::default()
        };

        assert!(measure(&mut filter, &[], "eth0").await.is_err());
        assert_eq!(filter.calls, vec!["set_up", "clean_up"]);
    }

    #[tokio::test]
    async fn test_cleanup_failure_is_reported() {
        let mut filter = RecordingFilter {
            fail_cleanup: true,
            ..RecordingFilter::default()
        };

        let (report, result) = cleanup(&mut filter).await;

        assert!(result.is_err());
        assert_eq!(report.failures().count(), 1);
    }

    #[tokio::test]
    async fn test_setup_through_trait_object() {
        let mut filter: Box<dyn TrafficFilter> = Box::new(RecordingFilter::default());
        let elapsed = setup(filter.as_mut(), &[], "eth0").await.unwrap();
        assert_eq!(elapsed, Duration::from_micros(1500));
    }
}
