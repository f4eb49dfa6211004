//! 迁移配置加载

use std::env;
use std::path::PathBuf;
use tracing::warn;

use crate::domain::compose::ComposeVersion;
use crate::domain::network::{IpamConfig, NetworkTarget};

/// 常量
pub mod constants {
    use crate::domain::compose::ComposeVersion;

    /// 旧私有网络
    pub const LEGACY_NETWORK_NAME: &str = "dnprivate_network";
    pub const LEGACY_NETWORK_SUBNET: &str = "10.20.0.0/24";
    pub const LEGACY_NETWORK_GATEWAY: &str = "10.20.0.1";

    /// 当前私有网络
    pub const CURRENT_NETWORK_NAME: &str = "dncore_network";
    pub const CURRENT_NETWORK_SUBNET: &str = "172.33.0.0/16";
    pub const CURRENT_NETWORK_GATEWAY: &str = "172.33.0.1";

    /// 核心包在网络外置前使用的 compose 内部网络名
    pub const LEGACY_COMPOSE_NETWORK: &str = "network";

    /// external 网络 + aliases 需要的最低 compose 版本
    pub const MINIMUM_COMPOSE_VERSION: ComposeVersion = ComposeVersion::new(3, 5);

    pub const VPN_CONTAINER_NAME: &str = "DAppNodeCore-vpn.dnp.dappnode.eth";
    pub const WIFI_CONTAINER_NAME: &str = "DAppNodeCore-wifi.dnp.dappnode.eth";

    pub const DEFAULT_DNCORE_DIR: &str = "/usr/src/app/DNCORE";
    pub const DEFAULT_REPO_DIR: &str = "/usr/src/app/dnp_repo";
    pub const DEFAULT_DOCKER_BIN: &str = "docker";

    /// 别名后缀
    pub const ALIAS_DOMAIN: &str = "dappnode";

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// 迁移配置，进程启动时确定，之后只读
#[derive(Clone, Debug)]
pub struct MigrationConfig {
    /// 需要维护的私有网络，按顺序处理（旧网络在前，当前网络最后）
    pub targets: Vec<NetworkTarget>,
    /// 迁移时从服务中移除的旧 compose 网络名
    pub legacy_compose_network: String,
    pub minimum_compose_version: ComposeVersion,
    /// 自己管理网络命名空间、只能整体重建的容器
    pub recreate_containers: Vec<String>,
    /// 核心包 compose 目录
    pub dncore_dir: PathBuf,
    /// 普通包 compose 目录
    pub repo_dir: PathBuf,
    pub docker_bin: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        use constants::*;

        Self {
            targets: vec![
                NetworkTarget::new(
                    LEGACY_NETWORK_NAME,
                    IpamConfig::new(LEGACY_NETWORK_SUBNET, LEGACY_NETWORK_GATEWAY),
                ),
                NetworkTarget::new(
                    CURRENT_NETWORK_NAME,
                    IpamConfig::new(CURRENT_NETWORK_SUBNET, CURRENT_NETWORK_GATEWAY),
                ),
            ],
            legacy_compose_network: LEGACY_COMPOSE_NETWORK.to_string(),
            minimum_compose_version: MINIMUM_COMPOSE_VERSION,
            recreate_containers: vec![
                VPN_CONTAINER_NAME.to_string(),
                WIFI_CONTAINER_NAME.to_string(),
            ],
            dncore_dir: PathBuf::from(DEFAULT_DNCORE_DIR),
            repo_dir: PathBuf::from(DEFAULT_REPO_DIR),
            docker_bin: DEFAULT_DOCKER_BIN.to_string(),
        }
    }
}

impl MigrationConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key))
    }

    /// 通过 `lookup` 读取覆盖项，空值或非 UTF-8 值沿用默认
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let mut config = Self::default();

        if let Some(dir) = non_empty_var(&lookup, "DNCORE_DIR") {
            config.dncore_dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty_var(&lookup, "REPO_DIR") {
            config.repo_dir = PathBuf::from(dir);
        }
        if let Some(bin) = non_empty_var(&lookup, "DOCKER_BIN") {
            config.docker_bin = bin;
        }

        config
    }

    /// 该容器是否只能通过 compose 重建来刷新网络
    pub fn requires_recreate(&self, container_name: &str) -> bool {
        self.recreate_containers.iter().any(|c| c == container_name)
    }
}

/// 读取环境变量，空值视为未设置
fn non_empty_var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        Ok(_) => {
            warn!(key = %key, "Empty environment variable, using default");
            None
        }
        Err(env::VarError::NotUnicode(_)) => {
            warn!(key = %key, "Non-unicode environment variable, using default");
            None
        }
        Err(env::VarError::NotPresent) => None,
    }
}
