//! docker-compose 文件模型
//!
//! 只对迁移关心的字段建立类型（version、services.*.networks、networks），
//! 其余字段通过 `extra` 原样保留，写回时不会丢失。
//! 映射均使用 `IndexMap`，写回时保持文件中的键顺序。

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

type Extra = IndexMap<String, serde_yaml::Value>;

/// compose 文件版本，如 `3.5`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComposeVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ComposeVersion {
    pub const fn new(major: u64, minor: u64) -> Self {
        Self {
            major,
            minor,
            patch: 0,
        }
    }

    /// 解析 `3`、`3.5`、`3.5.1`，无法识别时返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for ComposeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

/// 服务在某个网络上的配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceNetworkSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ServiceNetworkSettings {
    pub fn aliases(&self) -> &[String] {
        self.aliases.as_deref().unwrap_or(&[])
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases().iter().any(|a| a == alias)
    }
}

/// `services.<name>.networks` 的两种写法
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceNetworks {
    /// `networks: [dncore_network]`
    List(Vec<String>),
    /// `networks: {dncore_network: {aliases: [...]}}`，值可以为 null
    Map(IndexMap<String, Option<ServiceNetworkSettings>>),
}

impl ServiceNetworks {
    pub fn to_map(&self) -> IndexMap<String, Option<ServiceNetworkSettings>> {
        match self {
            ServiceNetworks::List(names) => names.iter().map(|n| (n.clone(), None)).collect(),
            ServiceNetworks::Map(map) => map.clone(),
        }
    }

    /// 已声明的网络返回其配置（null 视为空配置），未声明返回 None
    pub fn get(&self, name: &str) -> Option<ServiceNetworkSettings> {
        match self {
            ServiceNetworks::List(names) => names
                .iter()
                .any(|n| n == name)
                .then(ServiceNetworkSettings::default),
            ServiceNetworks::Map(map) => map.get(name).map(|s| s.clone().unwrap_or_default()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            ServiceNetworks::List(names) => names.iter().any(|n| n == name),
            ServiceNetworks::Map(map) => map.contains_key(name),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self {
            ServiceNetworks::List(names) => {
                let before = names.len();
                names.retain(|n| n != name);
                names.len() != before
            }
            ServiceNetworks::Map(map) => map.shift_remove(name).is_some(),
        }
    }

    /// 写入网络配置，列表写法会被转换成映射写法
    pub fn insert(&mut self, name: &str, settings: ServiceNetworkSettings) {
        let mut map = self.to_map();
        map.insert(name.to_string(), Some(settings));
        *self = ServiceNetworks::Map(map);
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ServiceNetworks::List(names) => names.is_empty(),
            ServiceNetworks::Map(map) => map.is_empty(),
        }
    }
}

/// compose 服务
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeService {
    #[serde(flatten)]
    pub extra: Extra,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networks: Option<ServiceNetworks>,
}

impl ComposeService {
    pub fn network(&self, name: &str) -> Option<ServiceNetworkSettings> {
        self.networks.as_ref().and_then(|n| n.get(name))
    }

    pub fn uses_network(&self, name: &str) -> bool {
        self.networks
            .as_ref()
            .map(|n| n.contains(name))
            .unwrap_or(false)
    }
}

/// 顶层 `networks.<name>` 声明
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeNetwork {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ComposeNetwork {
    /// 指向已存在的外部网络
    pub fn external(name: impl Into<String>) -> Self {
        Self {
            external: Some(true),
            name: Some(name.into()),
            extra: Extra::new(),
        }
    }

    pub fn is_external(&self) -> bool {
        self.external.unwrap_or(false)
    }
}

/// compose 文件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeFile {
    #[serde(
        default,
        deserialize_with = "deserialize_version",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    #[serde(default)]
    pub services: IndexMap<String, ComposeService>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub networks: IndexMap<String, Option<ComposeNetwork>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ComposeFile {
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn parsed_version(&self) -> Option<ComposeVersion> {
        self.version.as_deref().and_then(ComposeVersion::parse)
    }

    /// 版本是否不低于 `minimum`，缺失或无法解析视为过低
    pub fn meets_version(&self, minimum: ComposeVersion) -> bool {
        self.parsed_version().map(|v| v >= minimum).unwrap_or(false)
    }

    /// 低于 `minimum` 时升级，返回是否修改
    pub fn ensure_version(&mut self, minimum: ComposeVersion) -> bool {
        if self.meets_version(minimum) {
            return false;
        }
        self.version = Some(minimum.to_string());
        true
    }

    pub fn service(&self, name: &str) -> Option<&ComposeService> {
        self.services.get(name)
    }

    /// 顶层网络声明，值为 null 时视为空声明
    pub fn network(&self, name: &str) -> Option<ComposeNetwork> {
        self.networks.get(name).map(|n| n.clone().unwrap_or_default())
    }

    /// 从服务中移除网络；若已无其他服务使用，同时移除顶层声明
    pub fn remove_service_network(&mut self, service: &str, network: &str) -> bool {
        let removed = match self.services.get_mut(service) {
            Some(svc) => {
                let removed = svc
                    .networks
                    .as_mut()
                    .map(|n| n.remove(network))
                    .unwrap_or(false);
                if svc.networks.as_ref().map(|n| n.is_empty()).unwrap_or(false) {
                    svc.networks = None;
                }
                removed
            }
            None => false,
        };

        if !self.services.values().any(|s| s.uses_network(network)) {
            self.networks.shift_remove(network);
        }
        removed
    }

    /// 为服务写入网络配置与顶层声明
    pub fn add_service_network(
        &mut self,
        service: &str,
        network: &str,
        settings: ServiceNetworkSettings,
        declaration: ComposeNetwork,
    ) -> bool {
        let Some(svc) = self.services.get_mut(service) else {
            return false;
        };
        svc.networks
            .get_or_insert_with(|| ServiceNetworks::Map(IndexMap::new()))
            .insert(network, settings);
        self.networks.insert(network.to_string(), Some(declaration));
        true
    }
}

/// `version` 可以是字符串也可以是 YAML 数字（`version: 3.5`）
fn deserialize_version<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "invalid compose version: {:?}",
            other
        ))),
    }
}
