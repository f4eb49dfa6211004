//! 私有网络相关领域模型

use serde::{Deserialize, Serialize};

/// IPAM 配置（子网与网关）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamConfig {
    pub subnet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
}

impl IpamConfig {
    pub fn new(subnet: impl Into<String>, gateway: impl Into<String>) -> Self {
        Self {
            subnet: subnet.into(),
            gateway: Some(gateway.into()),
        }
    }
}

/// 需要维护的私有网络
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTarget {
    pub name: String,
    pub ipam: IpamConfig,
}

impl NetworkTarget {
    pub fn new(name: impl Into<String>, ipam: IpamConfig) -> Self {
        Self {
            name: name.into(),
            ipam,
        }
    }
}

/// docker inspect 中 `NetworkSettings.Networks.<name>` 的 IPAM 部分
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointIpamConfig {
    #[serde(rename = "IPv4Address", default, skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
}

/// 运行中容器在某个网络上的实际端点配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveNetworkAttachment {
    /// docker 对未设置别名的端点返回 null
    #[serde(rename = "Aliases", default)]
    pub aliases: Option<Vec<String>>,
    #[serde(rename = "IPAddress", default)]
    pub ip_address: Option<String>,
    #[serde(rename = "IPAMConfig", default)]
    pub ipam_config: Option<EndpointIpamConfig>,
}

impl LiveNetworkAttachment {
    pub fn with_aliases(aliases: Vec<String>) -> Self {
        Self {
            aliases: Some(aliases),
            ..Default::default()
        }
    }

    pub fn aliases(&self) -> &[String] {
        self.aliases.as_deref().unwrap_or(&[])
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases().iter().any(|a| a == alias)
    }

    /// 静态分配的 IPv4（重新连接时需要保留）
    pub fn static_ipv4(&self) -> Option<&str> {
        self.ipam_config
            .as_ref()
            .and_then(|c| c.ipv4_address.as_deref())
            .filter(|ip| !ip.is_empty())
    }
}

/// 端点存在且包含别名时返回 true
pub fn has_alias(attachment: Option<&LiveNetworkAttachment>, alias: &str) -> bool {
    attachment.map(|a| a.has_alias(alias)).unwrap_or(false)
}

/// 合并别名，保持原有顺序并去重
pub fn merge_alias(existing: &[String], alias: &str) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + 1);
    for a in existing.iter().map(String::as_str).chain(std::iter::once(alias)) {
        if !merged.iter().any(|m| m == a) {
            merged.push(a.to_string());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_docker_endpoint() {
        let raw = r#"{
            "IPAMConfig": {"IPv4Address": "172.33.1.7"},
            "Links": null,
            "Aliases": ["geth.dappnode", "a1b2c3"],
            "NetworkID": "f00",
            "IPAddress": "172.33.1.7"
        }"#;
        let attachment: LiveNetworkAttachment = serde_json::from_str(raw).unwrap();
        assert!(attachment.has_alias("geth.dappnode"));
        assert_eq!(attachment.static_ipv4(), Some("172.33.1.7"));
    }

    #[test]
    fn test_null_aliases() {
        let raw = r#"{"IPAMConfig": null, "Aliases": null, "IPAddress": ""}"#;
        let attachment: LiveNetworkAttachment = serde_json::from_str(raw).unwrap();
        assert!(attachment.aliases().is_empty());
        assert!(attachment.static_ipv4().is_none());
        assert!(!has_alias(Some(&attachment), "x.dappnode"));
        assert!(!has_alias(None, "x.dappnode"));
    }

    #[test]
    fn test_merge_alias_dedupes() {
        let existing = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(merge_alias(&existing, "b"), vec!["a", "b"]);
        assert_eq!(merge_alias(&existing, "c"), vec!["a", "b", "c"]);
        assert_eq!(merge_alias(&[], "c"), vec!["c"]);
    }
}
