//! 配置管理模块
//!
//! 该模块负责加载 Agent 的配置文件，支持 YAML/JSON 格式，
//! 并允许通过 `HOSTFENCE_*` 环境变量覆盖文件中的配置项。

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

use hostfence_common::error::IntoError;
use hostfence_common::{AddressRange, Error, DEFAULT_MAX_ENTRIES_PER_MANIFEST, DEFAULT_NAME_PREFIX};
use hostfence_controller::apply::DEFAULT_FALLBACK_NAMESPACE;
use hostfence_controller::ControllerSettings;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "HOSTFENCE";

/// Agent 配置结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// 目标网卡
    pub interface: String,
    /// 内联地址列表
    pub addresses: Vec<AddressRange>,
    /// 地址文件，每行一个 CIDR
    pub addresses_file: Option<PathBuf>,
    /// 伪随机地址生成
    pub generate: Option<GenerateConfig>,
    /// 每个地址集合清单的最大条目数
    pub max_entries_per_manifest: usize,
    /// 资源名称前缀
    pub name_prefix: String,
    /// 命名空间资源缺省使用的命名空间
    pub fallback_namespace: String,
    /// 创建时跳过已存在的资源
    pub skip_existing: bool,
    /// 覆盖模板目录
    pub template_dir: Option<PathBuf>,
    /// 集群连接配置
    pub cluster: ClusterConfig,
    /// 日志级别
    pub log_level: String,
}

/// 伪随机地址生成配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// 生成的主机地址数量
    pub count: usize,
    /// 随机种子
    #[serde(default)]
    pub seed: u64,
}

/// 集群连接配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// 凭据来源
    pub mode: ClusterMode,
}

/// 集群凭据来源
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMode {
    /// Pod 内的服务账号
    InCluster,
    /// 从 kubeconfig 或环境推断
    #[default]
    Infer,
}

/// 命令行覆盖项
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub interface: Option<String>,
    pub addresses_file: Option<PathBuf>,
    pub count: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        create_default_config()
    }
}

impl AgentConfig {
    /// 加载配置：文件（可选）叠加进程环境变量
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// 加载配置，`env` 为 `None` 时读取进程环境变量
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            let format = file_format(path)?;
            let file = path.to_str().ok_or_else(|| anyhow!("配置路径无效"))?;
            builder = builder.add_source(File::with_name(file).format(format));
            debug!("加载配置文件: {}", file);
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config = builder
            .build()
            .with_context(|| format!("构建配置失败: {:?}", path))?
            .try_deserialize::<AgentConfig>()
            .context("配置格式错误")?;

        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> hostfence_common::Result<()> {
        if self.max_entries_per_manifest == 0 {
            return "max_entries_per_manifest 必须大于 0".into_error(Error::Config);
        }
        if self.interface.trim().is_empty() {
            return "interface 不能为空".into_error(Error::Config);
        }
        if self.name_prefix.is_empty() {
            return "name_prefix 不能为空".into_error(Error::Config);
        }
        Ok(())
    }

    /// 应用命令行覆盖项
    pub fn apply_overrides(&mut self, overrides: Overrides) -> hostfence_common::Result<()> {
        if let Some(iface) = overrides.interface {
            self.interface = iface;
        }
        if let Some(file) = overrides.addresses_file {
            self.addresses_file = Some(file);
        }
        if overrides.count.is_some() || overrides.seed.is_some() {
            let mut generate = self.generate.unwrap_or(GenerateConfig { count: 0, seed: 0 });
            if let Some(count) = overrides.count {
                generate.count = count;
            }
            if let Some(seed) = overrides.seed {
                generate.seed = seed;
            }
            self.generate = Some(generate);
        }
        self.validate()
    }

    /// 控制器参数
    pub fn controller_settings(&self) -> hostfence_common::Result<ControllerSettings> {
        let max = NonZeroUsize::new(self.max_entries_per_manifest)
            .ok_or_else(|| Error::Config("max_entries_per_manifest 必须大于 0".to_string()))?;
        Ok(ControllerSettings {
            max_entries_per_manifest: max,
            name_prefix: self.name_prefix.clone(),
            skip_existing: self.skip_existing,
        })
    }
}

fn file_format(path: &Path) -> Result<FileFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
        Some("json") => Ok(FileFormat::Json),
        _ => Err(anyhow!("不支持的配置文件格式，仅支持 YAML 或 JSON: {:?}", path)),
    }
}

/// 创建默认配置
pub fn create_default_config() -> AgentConfig {
    AgentConfig {
        interface: "eth0".to_string(),
        addresses: Vec::new(),
        addresses_file: None,
        generate: None,
        max_entries_per_manifest: DEFAULT_MAX_ENTRIES_PER_MANIFEST,
        name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        fallback_namespace: DEFAULT_FALLBACK_NAMESPACE.to_string(),
        skip_existing: false,
        template_dir: None,
        cluster: ClusterConfig::default(),
        log_level: "info".to_string(),
    }
}
