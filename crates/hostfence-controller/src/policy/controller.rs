//! 策略控制器
//!
//! 对外提供 setup / cleanup 两个操作。setup 将地址列表分片，渲染每个分片的地址集合
//! 清单以及两条策略清单，再按确定顺序逐条创建；cleanup 以尽力而为的方式删除它们。
//!
//! 状态只有两个：未下发与已下发。setup 中途失败时已创建的资源不会回滚，
//! 集群处于部分下发状态，需要调用方再次执行 cleanup。

use async_trait::async_trait;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use hostfence_common::{
    address_set_name, chunk, general_policy_name, workload_policy_name, AddressRange,
    AppliedManifest, ApplyAction, ManifestKind, PolicyConfig, Result,
    DEFAULT_MAX_ENTRIES_PER_MANIFEST, DEFAULT_NAME_PREFIX,
};

use super::report::CleanupReport;
use crate::apply::{ClusterClient, ResourceApplier};
use crate::manifest::ManifestRenderer;

/// 控制器参数
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// 每个地址集合清单的最大条目数
    pub max_entries_per_manifest: NonZeroUsize,
    /// 资源名称前缀
    pub name_prefix: String,
    /// 创建时遇到“已存在”是否跳过（不会更新已有资源）
    pub skip_existing: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_entries_per_manifest: NonZeroUsize::new(DEFAULT_MAX_ENTRIES_PER_MANIFEST)
                .unwrap_or(NonZeroUsize::MIN),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            skip_existing: false,
        }
    }
}

/// 一条渲染完成的清单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedManifest {
    /// 清单种类
    pub kind: ManifestKind,
    /// 资源名称
    pub name: String,
    /// 清单文本
    pub text: String,
}

/// 按下发顺序渲染全部清单：各分片的地址集合、通用策略、工作负载策略
pub fn render_manifests(
    renderer: &ManifestRenderer,
    settings: &ControllerSettings,
    config: &PolicyConfig,
) -> Result<Vec<RenderedManifest>> {
    let prefix = settings.name_prefix.as_str();
    let chunks = chunk(&config.nets, settings.max_entries_per_manifest);
    let mut manifests = Vec::with_capacity(chunks.len() + 2);

    for chunk in &chunks {
        manifests.push(RenderedManifest {
            kind: ManifestKind::AddressSet,
            name: address_set_name(prefix, chunk.index),
            text: renderer.render_address_set(prefix, chunk)?,
        });
    }

    manifests.push(RenderedManifest {
        kind: ManifestKind::GeneralPolicy,
        name: general_policy_name(prefix),
        text: renderer.render_general_policy(prefix, config)?,
    });
    manifests.push(RenderedManifest {
        kind: ManifestKind::WorkloadPolicy,
        name: workload_policy_name(prefix),
        text: renderer.render_workload_policy(prefix, config)?,
    });

    Ok(manifests)
}

/// 流量过滤器
///
/// setup 返回下发耗时；cleanup 从不返回错误，结果体现在报告中。
#[async_trait]
pub trait TrafficFilter: Send {
    /// 在网卡上安装过滤规则
    async fn set_up(&mut self, nets: &[AddressRange], iface: &str) -> Result<Duration>;

    /// 移除过滤规则
    async fn clean_up(&mut self) -> CleanupReport;
}

/// 策略控制器
pub struct PolicyController<C> {
    /// 资源下发器
    applier: ResourceApplier<C>,
    /// 清单渲染器
    renderer: ManifestRenderer,
    /// 控制器参数
    settings: ControllerSettings,
    /// 策略配置
    config: PolicyConfig,
}

impl<C: ClusterClient> PolicyController<C> {
    /// 创建新的策略控制器
    pub fn new(
        applier: ResourceApplier<C>,
        renderer: ManifestRenderer,
        config: PolicyConfig,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            applier,
            renderer,
            settings,
            config,
        }
    }

    /// 当前策略配置
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// 控制器参数
    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// 资源下发器
    pub fn applier(&self) -> &ResourceApplier<C> {
        &self.applier
    }

    /// 按当前配置渲染全部清单，不访问集群
    pub fn render(&self) -> Result<Vec<RenderedManifest>> {
        render_manifests(&self.renderer, &self.settings, &self.config)
    }

    /// 接管已由其他进程下发的过滤规则
    ///
    /// 按给定地址重新渲染地址集合并记录为已下发，不访问集群。
    /// 之后的 cleanup 会删除这些地址集合。返回记录的地址集合数量。
    pub fn adopt(&mut self, nets: &[AddressRange], iface: &str) -> Result<usize> {
        self.config.reset(nets, iface);
        let sets: Vec<RenderedManifest> = self
            .render()?
            .into_iter()
            .filter(|m| m.kind == ManifestKind::AddressSet)
            .collect();
        let count = sets.len();
        for manifest in sets {
            self.config
                .retain_manifest(AppliedManifest::new(manifest.name, manifest.text));
        }
        info!("接管网卡 {} 上的 {} 个地址集合", iface, count);
        Ok(count)
    }

    /// 安装过滤规则
    ///
    /// 传入的地址与网卡会覆盖构造时的配置。所有清单先全部渲染，再依次创建；
    /// 遇到第一个失败立即返回，之前创建的资源保留在集群中并继续记录，
    /// 此前调用记录的地址集合同样保留。
    pub async fn set_up(&mut self, nets: &[AddressRange], iface: &str) -> Result<Duration> {
        let start = Instant::now();

        self.config.reset(nets, iface);
        let manifests = self.render()?;
        info!(
            "开始下发过滤规则: 网卡 {}，地址 {} 条，清单 {} 个",
            iface,
            nets.len(),
            manifests.len()
        );

        for manifest in manifests {
            self.create(&manifest).await?;
            if manifest.kind == ManifestKind::AddressSet {
                self.config
                    .retain_manifest(AppliedManifest::new(manifest.name, manifest.text));
            }
        }

        let elapsed = start.elapsed();
        info!("过滤规则下发完成，耗时 {:?}", elapsed);
        Ok(elapsed)
    }

    async fn create(&self, manifest: &RenderedManifest) -> Result<()> {
        match self.applier.apply(&manifest.text, ApplyAction::Create).await {
            Ok(()) => Ok(()),
            Err(e) if self.settings.skip_existing && e.is_already_exists() => {
                warn!("{} {} 已存在，跳过创建", manifest.kind, manifest.name);
                Ok(())
            }
            Err(e) => {
                error!("创建 {} {} 失败: {}", manifest.kind, manifest.name, e);
                Err(e)
            }
        }
    }

    /// 移除过滤规则
    ///
    /// 先删除从配置重新渲染的两条策略，再按记录顺序删除已下发的地址集合。
    /// 每次删除都会尝试，失败只记录在报告中；删除失败的地址集合继续保留，
    /// 再次调用 cleanup 时会重试。
    pub async fn clean_up(&mut self) -> CleanupReport {
        let mut report = CleanupReport::new();
        let prefix = self.settings.name_prefix.as_str();

        let policies = [
            (
                ManifestKind::GeneralPolicy,
                general_policy_name(prefix),
                self.renderer.render_general_policy(prefix, &self.config),
            ),
            (
                ManifestKind::WorkloadPolicy,
                workload_policy_name(prefix),
                self.renderer.render_workload_policy(prefix, &self.config),
            ),
        ];

        for (kind, name, rendered) in policies {
            let result = match rendered {
                Ok(text) => self.applier.apply(&text, ApplyAction::Delete).await,
                Err(e) => Err(e),
            };
            report.record(kind, name, result);
        }

        for manifest in self.config.take_manifests() {
            let result = self.applier.apply(&manifest.text, ApplyAction::Delete).await;
            let failed = matches!(&result, Err(e) if !e.is_not_found());
            report.record(ManifestKind::AddressSet, manifest.name.clone(), result);
            if failed {
                self.config.retain_manifest(manifest);
            }
        }

        info!(
            "过滤规则清理结束: 共 {} 项，失败 {} 项",
            report.len(),
            report.failures().count()
        );
        report
    }
}

#[async_trait]
impl<C: ClusterClient> TrafficFilter for PolicyController<C> {
    async fn set_up(&mut self, nets: &[AddressRange], iface: &str) -> Result<Duration> {
        PolicyController::set_up(self, nets, iface).await
    }

    async fn clean_up(&mut self) -> CleanupReport {
        PolicyController::clean_up(self).await
    }
}
