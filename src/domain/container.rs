//! 容器相关领域模型

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::chain::ChainSpec;
use super::network::LiveNetworkAttachment;

/// 核心包容器名前缀
pub const CORE_CONTAINER_PREFIX: &str = "DAppNodeCore-";
/// 普通包容器名前缀
pub const PACKAGE_CONTAINER_PREFIX: &str = "DAppNodePackage-";

/// 容器标签
pub mod labels {
    pub const DNP_NAME: &str = "dappnode.dnp.dnpName";
    pub const SERVICE_NAME: &str = "dappnode.dnp.serviceName";
    pub const IS_CORE: &str = "dappnode.dnp.isCore";
    pub const CHAIN: &str = "dappnode.dnp.chain";
}

/// 受管理的包容器
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedContainer {
    pub container_name: String,
    pub dnp_name: String,
    pub service_name: String,
    pub is_core: bool,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub chain: Option<ChainSpec>,
}

impl ManagedContainer {
    pub fn new(
        container_name: impl Into<String>,
        dnp_name: impl Into<String>,
        service_name: impl Into<String>,
        is_core: bool,
    ) -> Self {
        Self {
            container_name: container_name.into(),
            dnp_name: dnp_name.into(),
            service_name: service_name.into(),
            is_core,
            ip: None,
            ports: Vec::new(),
            chain: None,
        }
    }

    /// 从 docker inspect 结果构建，非 DAppNode 容器返回 None
    pub fn from_inspect(raw: &InspectedContainer) -> Option<Self> {
        let container_name = raw.name.trim_start_matches('/').to_string();
        let label_map = raw.config.labels.clone().unwrap_or_default();

        let (prefix_dnp, prefix_core) =
            if let Some(rest) = container_name.strip_prefix(CORE_CONTAINER_PREFIX) {
                (Some(rest.to_string()), true)
            } else if let Some(rest) = container_name.strip_prefix(PACKAGE_CONTAINER_PREFIX) {
                (Some(rest.to_string()), false)
            } else {
                (None, false)
            };

        let dnp_name = label_map
            .get(labels::DNP_NAME)
            .filter(|s| !s.is_empty())
            .cloned()
            .or(prefix_dnp)?;
        let service_name = label_map
            .get(labels::SERVICE_NAME)
            .filter(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| dnp_name.clone());
        let is_core = label_map
            .get(labels::IS_CORE)
            .map(|v| v == "true")
            .unwrap_or(prefix_core);
        let chain = label_map.get(labels::CHAIN).and_then(|v| ChainSpec::from_label(v));

        let networks = raw.network_settings.networks.clone().unwrap_or_default();
        let ip = networks
            .values()
            .filter_map(|n| n.ip_address.clone())
            .find(|ip| !ip.is_empty());

        Some(Self {
            container_name,
            dnp_name,
            service_name,
            is_core,
            ip,
            ports: raw.network_settings.port_list(),
            chain,
        })
    }
}

/// `docker inspect` 输出中用到的字段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectedContainer {
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Config", default)]
    pub config: InspectedConfig,
    #[serde(rename = "NetworkSettings", default)]
    pub network_settings: InspectedNetworkSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectedConfig {
    #[serde(rename = "Labels", default)]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectedNetworkSettings {
    #[serde(rename = "Networks", default)]
    pub networks: Option<BTreeMap<String, LiveNetworkAttachment>>,
    #[serde(rename = "Ports", default)]
    pub ports: Option<BTreeMap<String, Option<Vec<PortBinding>>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortBinding {
    #[serde(rename = "HostIp", default)]
    pub host_ip: String,
    #[serde(rename = "HostPort", default)]
    pub host_port: String,
}

impl InspectedNetworkSettings {
    /// `8545/tcp` 或 `0.0.0.0:30303->30303/udp`
    pub fn port_list(&self) -> Vec<String> {
        let Some(ports) = &self.ports else {
            return Vec::new();
        };
        let mut list = Vec::new();
        for (container_port, bindings) in ports {
            match bindings.as_deref() {
                Some(bindings) if !bindings.is_empty() => {
                    for b in bindings {
                        let host = if b.host_ip.is_empty() { "0.0.0.0" } else { &b.host_ip };
                        list.push(format!("{}:{}->{}", host, b.host_port, container_port));
                    }
                }
                _ => list.push(container_port.clone()),
            }
        }
        list
    }
}

/// 按包分组的已安装包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub dnp_name: String,
    pub is_core: bool,
    pub chain: Option<ChainSpec>,
    pub containers: Vec<ManagedContainer>,
}

impl InstalledPackage {
    /// 将容器按 dnp_name 分组，保持首次出现的顺序
    pub fn group(containers: &[ManagedContainer]) -> Vec<InstalledPackage> {
        let mut packages: Vec<InstalledPackage> = Vec::new();
        for container in containers {
            match packages.iter_mut().find(|p| p.dnp_name == container.dnp_name) {
                Some(pkg) => {
                    if pkg.chain.is_none() {
                        pkg.chain = container.chain.clone();
                    }
                    pkg.containers.push(container.clone());
                }
                None => packages.push(InstalledPackage {
                    dnp_name: container.dnp_name.clone(),
                    is_core: container.is_core,
                    chain: container.chain.clone(),
                    containers: vec![container.clone()],
                }),
            }
        }
        packages
    }
}
