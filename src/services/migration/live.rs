//! 运行中容器的网络迁移
//!
//! 普通容器通过 disconnect + connect 刷新别名；
//! VPN / WiFi 容器自己管理网络命名空间，只能 compose 强制重建

use tracing::{debug, info};

use crate::config::MigrationConfig;
use crate::domain::container::ManagedContainer;
use crate::domain::network::{merge_alias, EndpointIpamConfig, LiveNetworkAttachment, NetworkTarget};
use crate::error::{MigrationError, Result};

use super::inspect::{ComposeStore, ContainerRuntime};

/// 计算重新连接时使用的端点配置，保留原有别名与静态 IP
pub fn next_endpoint(current: Option<&LiveNetworkAttachment>, alias: &str) -> LiveNetworkAttachment {
    let existing = current.map(|c| c.aliases()).unwrap_or(&[]);
    let ipv4 = current.and_then(|c| c.static_ipv4()).map(str::to_string);

    LiveNetworkAttachment {
        aliases: Some(merge_alias(existing, alias)),
        ip_address: None,
        ipam_config: ipv4.map(|ip| EndpointIpamConfig {
            ipv4_address: Some(ip),
        }),
    }
}

/// 迁移运行中容器的网络别名，有变更时返回 true
pub async fn reconcile_live<R, S>(
    runtime: &R,
    store: &S,
    config: &MigrationConfig,
    container: &ManagedContainer,
    target: &NetworkTarget,
    alias: &str,
) -> Result<bool>
where
    R: ContainerRuntime + ?Sized,
    S: ComposeStore + ?Sized,
{
    let current = runtime
        .live_attachment(&container.container_name, &target.name)
        .await?;

    if current.as_ref().map(|c| c.has_alias(alias)).unwrap_or(false) {
        debug!(
            network = %target.name,
            alias = %alias,
            container = %container.container_name,
            "Container already has alias"
        );
        return Ok(false);
    }

    if config.requires_recreate(&container.container_name) {
        let compose_path = store.compose_path(&container.dnp_name, container.is_core);
        info!(
            container = %container.container_name,
            compose = %compose_path.display(),
            "Recreating container to refresh its networks"
        );
        runtime.compose_up_force_recreate(&compose_path).await?;
        return Ok(true);
    }

    let endpoint = next_endpoint(current.as_ref(), alias);

    runtime
        .disconnect_network(&target.name, &container.container_name)
        .await?;

    // 已断开，重连失败时容器暂时离开该网络，下次启动重试
    runtime
        .connect_network(&target.name, &container.container_name, &endpoint)
        .await
        .map_err(|e| MigrationError::LiveNetwork {
            container: container.container_name.clone(),
            network: target.name.clone(),
            reason: e.to_string(),
        })?;

    Ok(true)
}
