//! HostFence Agent
//!
//! 该模块实现了 HostFence 的命令行代理：加载配置、收集地址、
//! 构造策略控制器，并执行安装、清理、渲染与计时操作。

pub mod addresses;
pub mod commands;
pub mod config;

use anyhow::{Context, Result};
use tracing::info;

use hostfence_common::{AddressRange, PolicyConfig};
use hostfence_controller::policy::render_manifests;
use hostfence_controller::utils::join_documents;
use hostfence_controller::{
    ClusterClient, ControllerSettings, KubeClusterClient, ManifestRenderer, PolicyController,
    ResourceApplier, TemplateSources,
};

use crate::config::{AgentConfig, ClusterMode};

/// Agent 主结构体
pub struct Agent {
    /// 生效的配置
    config: AgentConfig,
}

impl Agent {
    /// 创建新的 Agent 实例
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// 获取配置
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// 收集所有来源的地址
    pub fn addresses(&self) -> Result<Vec<AddressRange>> {
        addresses::collect(&self.config)
    }

    /// 控制器参数
    pub fn settings(&self) -> Result<ControllerSettings> {
        Ok(self.config.controller_settings()?)
    }

    /// 构造清单渲染器，配置了模板目录时从目录加载
    pub fn renderer(&self) -> Result<ManifestRenderer> {
        let sources = match &self.config.template_dir {
            Some(dir) => {
                info!("从 {:?} 加载模板", dir);
                TemplateSources::load_dir(dir)
                    .with_context(|| format!("无法加载模板目录: {:?}", dir))?
            }
            None => TemplateSources::default(),
        };
        Ok(ManifestRenderer::from_sources(sources)?)
    }

    /// 渲染全部清单为 YAML 多文档流，不访问集群
    pub fn render(&self) -> Result<String> {
        let policy = PolicyConfig::new(self.addresses()?, self.config.interface.as_str());
        let manifests = render_manifests(&self.renderer()?, &self.settings()?, &policy)?;
        Ok(join_documents(manifests.iter().map(|m| m.text.as_str())))
    }

    /// 按配置建立集群连接
    pub async fn connect(&self) -> Result<KubeClusterClient> {
        let client = match self.config.cluster.mode {
            ClusterMode::InCluster => KubeClusterClient::in_cluster()?,
            ClusterMode::Infer => KubeClusterClient::infer().await?,
        };
        info!("已连接集群 ({:?})", self.config.cluster.mode);
        Ok(client)
    }

    /// 构造连接到集群的策略控制器
    pub async fn controller(&self) -> Result<PolicyController<KubeClusterClient>> {
        let client = self.connect().await.context("无法建立集群连接")?;
        self.controller_with(client)
    }

    /// 使用给定的集群客户端构造策略控制器
    pub fn controller_with<C: ClusterClient>(&self, client: C) -> Result<PolicyController<C>> {
        let applier = ResourceApplier::new(client)
            .with_fallback_namespace(self.config.fallback_namespace.as_str());
        Ok(PolicyController::new(
            applier,
            self.renderer()?,
            PolicyConfig::new(Vec::new(), self.config.interface.as_str()),
            self.settings()?,
        ))
    }

    /// 让控制器接管按当前配置下发的地址集合
    ///
    /// cleanup 通常运行在与 setup 不同的进程中，需要按相同的地址与分片参数
    /// 重新得到地址集合清单。
    pub fn adopt<C: ClusterClient>(&self, controller: &mut PolicyController<C>) -> Result<usize> {
        let nets = self.addresses()?;
        Ok(controller.adopt(&nets, &self.config.interface)?)
    }
}
