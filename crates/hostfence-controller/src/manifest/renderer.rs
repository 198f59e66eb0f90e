//! 清单渲染器
//!
//! 使用 minijinja 将策略描述渲染为 YAML 清单文本。每种清单对应一个固定模板，
//! 模板引用缺失字段时严格报错。渲染是纯函数：相同输入总是得到相同文本。

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use hostfence_common::{
    address_set_name, general_policy_name, workload_policy_name, AddressRange, Chunk, Error,
    ManifestKind, PolicyConfig, Result,
};

const ADDRESS_SET_TEMPLATE: &str = include_str!("templates/address-set.yaml");
const GENERAL_POLICY_TEMPLATE: &str = include_str!("templates/general-policy.yaml");
const WORKLOAD_POLICY_TEMPLATE: &str = include_str!("templates/workload-policy.yaml");

/// 三种清单的模板源码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSources {
    /// 地址集合模板
    pub address_set: String,
    /// 通用策略模板
    pub general_policy: String,
    /// 工作负载策略模板
    pub workload_policy: String,
}

impl Default for TemplateSources {
    fn default() -> Self {
        Self {
            address_set: ADDRESS_SET_TEMPLATE.to_string(),
            general_policy: GENERAL_POLICY_TEMPLATE.to_string(),
            workload_policy: WORKLOAD_POLICY_TEMPLATE.to_string(),
        }
    }
}

impl TemplateSources {
    /// 从目录加载覆盖模板
    ///
    /// 目录中的 `<模板名>.yaml` 会替换对应的内置模板，缺失的文件沿用内置模板。
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::Config(format!("模板目录不存在: {}", dir.display())));
        }
        let mut sources = Self::default();
        for kind in ManifestKind::ALL {
            let path = dir.join(format!("{}.yaml", kind.template_name()));
            if !path.exists() {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            info!("使用覆盖模板 {}: {}", kind, path.display());
            *sources.get_mut(kind) = content;
        }
        Ok(sources)
    }

    /// 获取指定种类的模板源码
    pub fn get(&self, kind: ManifestKind) -> &str {
        match kind {
            ManifestKind::AddressSet => &self.address_set,
            ManifestKind::GeneralPolicy => &self.general_policy,
            ManifestKind::WorkloadPolicy => &self.workload_policy,
        }
    }

    fn get_mut(&mut self, kind: ManifestKind) -> &mut String {
        match kind {
            ManifestKind::AddressSet => &mut self.address_set,
            ManifestKind::GeneralPolicy => &mut self.general_policy,
            ManifestKind::WorkloadPolicy => &mut self.workload_policy,
        }
    }
}

/// 地址集合模板的渲染数据
#[derive(Debug, Serialize)]
pub struct AddressSetData<'a> {
    pub name: String,
    pub prefix: &'a str,
    pub index: usize,
    pub nets: &'a [AddressRange],
}

impl<'a> AddressSetData<'a> {
    pub fn new(prefix: &'a str, chunk: &Chunk<'a>) -> Self {
        Self {
            name: address_set_name(prefix, chunk.index),
            prefix,
            index: chunk.index,
            nets: chunk.addresses,
        }
    }
}

/// 策略模板的渲染数据
#[derive(Debug, Serialize)]
pub struct PolicyData<'a> {
    pub name: String,
    pub prefix: &'a str,
    pub iface: &'a str,
    pub nets: &'a [AddressRange],
}

/// 清单渲染器
pub struct ManifestRenderer {
    env: Environment<'static>,
}

impl ManifestRenderer {
    /// 使用内置模板创建渲染器
    pub fn new() -> Result<Self> {
        Self::from_sources(TemplateSources::default())
    }

    /// 使用指定模板创建渲染器，模板语法错误在此时报告
    pub fn from_sources(sources: TemplateSources) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        for kind in ManifestKind::ALL {
            env.add_template_owned(kind.template_name(), sources.get(kind).to_string())
                .map_err(|e| Error::Template(format!("{} 模板语法错误: {}", kind, e)))?;
        }

        Ok(Self { env })
    }

    /// 渲染指定种类的清单
    pub fn render<S: Serialize>(&self, kind: ManifestKind, data: &S) -> Result<String> {
        let template = self
            .env
            .get_template(kind.template_name())
            .map_err(|e| Error::Template(format!("{}: {}", kind, e)))?;

        let rendered = template
            .render(data)
            .map_err(|e| Error::Template(format!("渲染 {} 失败: {}", kind, e)))?;

        debug!("已渲染 {} 清单，长度 {} 字节", kind, rendered.len());
        Ok(rendered)
    }

    /// 渲染一个分片对应的地址集合清单
    pub fn render_address_set(&self, prefix: &str, chunk: &Chunk<'_>) -> Result<String> {
        self.render(ManifestKind::AddressSet, &AddressSetData::new(prefix, chunk))
    }

    /// 渲染通用策略清单
    pub fn render_general_policy(&self, prefix: &str, config: &PolicyConfig) -> Result<String> {
        let data = PolicyData {
            name: general_policy_name(prefix),
            prefix,
            iface: &config.iface,
            nets: &config.nets,
        };
        self.render(ManifestKind::GeneralPolicy, &data)
    }

    /// 渲染工作负载策略清单
    pub fn render_workload_policy(&self, prefix: &str, config: &PolicyConfig) -> Result<String> {
        let data = PolicyData {
            name: workload_policy_name(prefix),
            prefix,
            iface: &config.iface,
            nets: &config.nets,
        };
        self.render(ManifestKind::WorkloadPolicy, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostfence_common::chunk;
    use std::num::NonZeroUsize;

    fn nets(items: &[&str]) -> Vec<AddressRange> {
        items.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn yaml(text: &str) -> serde_yaml::Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_address_set_lists_chunk_nets() {
        let renderer = ManifestRenderer::new().unwrap();
        let input = nets(&["10.0.0.0/8", "192.168.1.1", "fd00::/64"]);
        let chunks = chunk(&input, NonZeroUsize::new(2).unwrap());

        let text = renderer.render_address_set("hostfence", &chunks[1]).unwrap();
        let doc = yaml(&text);

        assert_eq!(doc["kind"], "GlobalNetworkSet");
        assert_eq!(doc["metadata"]["name"], "hostfence-netset-1");
        assert_eq!(doc["metadata"]["labels"]["hostfence-netset"], "true");
        let listed: Vec<&str> = doc["spec"]["nets"]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(listed, vec!["fd00::/64"]);
    }

    #[test]
    fn test_empty_chunk_renders_empty_list() {
        let renderer = ManifestRenderer::new().unwrap();
        let chunks = chunk(&[], NonZeroUsize::new(10).unwrap());

        let text = renderer.render_address_set("hostfence", &chunks[0]).unwrap();
        let doc = yaml(&text);
        assert_eq!(doc["metadata"]["name"], "hostfence-netset-0");
        assert!(doc["spec"]["nets"].as_sequence().unwrap().is_empty());
    }

    #[test]
    fn test_policies_select_interface_and_sets() {
        let renderer = ManifestRenderer::new().unwrap();
        let config = PolicyConfig::new(nets(&["10.1.0.0/16"]), "eth1");

        let general = yaml(&renderer.render_general_policy("hostfence", &config).unwrap());
        assert_eq!(general["kind"], "GlobalNetworkPolicy");
        assert_eq!(general["metadata"]["name"], "hostfence-host");
        assert_eq!(general["spec"]["selector"], "hostfence-iface == 'eth1'");

        let workload = yaml(&renderer.render_workload_policy("hostfence", &config).unwrap());
        assert_eq!(workload["metadata"]["name"], "hostfence-workloads");
        assert_ne!(workload["spec"]["selector"], general["spec"]["selector"]);
        assert_eq!(
            workload["spec"]["egress"][0]["destination"]["selector"],
            "hostfence-netset == 'true'"
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let renderer = ManifestRenderer::new().unwrap();
        let input = nets(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        let chunks = chunk(&input, NonZeroUsize::new(10).unwrap());
        let config = PolicyConfig::new(input.clone(), "eth0");

        assert_eq!(
            renderer.render_address_set("hostfence", &chunks[0]).unwrap(),
            renderer.render_address_set("hostfence", &chunks[0]).unwrap()
        );
        assert_eq!(
            renderer.render_general_policy("hostfence", &config).unwrap(),
            renderer.render_general_policy("hostfence", &config).unwrap()
        );
    }

    #[test]
    fn test_missing_field_is_template_error() {
        let sources = TemplateSources {
            general_policy: "name: {{ name }}\nowner: {{ owner }}".to_string(),
            ..TemplateSources::default()
        };
        let renderer = ManifestRenderer::from_sources(sources).unwrap();
        let config = PolicyConfig::new(Vec::new(), "eth0");

        let err = renderer.render_general_policy("hostfence", &config).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_syntax_error_is_reported_at_construction() {
        let sources = TemplateSources {
            workload_policy: "name: {% for x in %}".to_string(),
            ..TemplateSources::default()
        };
        assert!(matches!(
            ManifestRenderer::from_sources(sources),
            Err(Error::Template(_))
        ));
    }

    #[test]
    fn test_load_dir_overrides_only_present_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("address-set.yaml"), "custom: {{ name }}").unwrap();

        let sources = TemplateSources::load_dir(dir.path()).unwrap();
        assert_eq!(sources.address_set, "custom: {{ name }}");
        assert_eq!(sources.general_policy, GENERAL_POLICY_TEMPLATE);
    }
}
