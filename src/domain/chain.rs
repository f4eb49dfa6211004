//! 链驱动声明（`dappnode.dnp.chain` 标签）

use serde::{Deserialize, Serialize};

/// 包声明的链驱动，字符串写法或结构化写法
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainSpec {
    /// `"ethereum"`
    Preset(String),
    /// `{"preset": "ethereum", "service": "rpc", "port": 8545}`
    Custom {
        preset: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        service: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<u16>,
    },
}

impl ChainSpec {
    pub fn preset(&self) -> &str {
        match self {
            ChainSpec::Preset(preset) => preset,
            ChainSpec::Custom { preset, .. } => preset,
        }
    }

    pub fn service(&self) -> Option<&str> {
        match self {
            ChainSpec::Preset(_) => None,
            ChainSpec::Custom { service, .. } => service.as_deref(),
        }
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            ChainSpec::Preset(_) => None,
            ChainSpec::Custom { port, .. } => *port,
        }
    }

    /// 解析标签值：JSON 对象按结构化写法解析，其余按字符串写法
    pub fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with('{') || raw.starts_with('"') {
            return serde_json::from_str(raw).ok();
        }
        Some(ChainSpec::Preset(raw.to_string()))
    }
}
