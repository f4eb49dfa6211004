//! 检查与变更能力接口
//!
//! 容器运行时与 compose 文件都通过 trait 注入，编排器不关心具体实现

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::compose::ComposeFile;
use crate::domain::container::ManagedContainer;
use crate::domain::network::{IpamConfig, LiveNetworkAttachment};
use crate::error::Result;

/// 容器运行时（查询 + 网络变更）
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// 列出所有受管理的容器
    async fn list_containers(&self) -> Result<Vec<ManagedContainer>>;

    /// 列出当前存在的网络名
    async fn list_networks(&self) -> Result<Vec<String>>;

    /// 容器在某网络上的端点配置，未连接时返回 None
    async fn live_attachment(
        &self,
        container_name: &str,
        network: &str,
    ) -> Result<Option<LiveNetworkAttachment>>;

    async fn create_network(&self, network: &str, ipam: &IpamConfig) -> Result<()>;

    /// 断开网络，容器本就未连接时视为成功
    async fn disconnect_network(&self, network: &str, container_name: &str) -> Result<()>;

    async fn connect_network(
        &self,
        network: &str,
        container_name: &str,
        endpoint: &LiveNetworkAttachment,
    ) -> Result<()>;

    /// `docker compose up -d --force-recreate`
    async fn compose_up_force_recreate(&self, compose_path: &Path) -> Result<()>;
}

/// compose 文件读写
#[async_trait]
pub trait ComposeStore: Send + Sync {
    fn compose_path(&self, dnp_name: &str, is_core: bool) -> PathBuf;

    async fn load(&self, dnp_name: &str, is_core: bool) -> Result<ComposeFile>;

    /// 原子写入
    async fn write(&self, dnp_name: &str, is_core: bool, compose: &ComposeFile) -> Result<()>;
}
