//! compose 声明迁移
//!
//! 读取服务的 compose 网络声明，缺少外部网络或别名时补齐并写回

use tracing::debug;

use crate::config::MigrationConfig;
use crate::domain::compose::{ComposeFile, ComposeNetwork, ServiceNetworkSettings};
use crate::domain::container::ManagedContainer;
use crate::domain::network::{merge_alias, NetworkTarget};
use crate::error::{MigrationError, Result};

use super::inspect::ComposeStore;

/// compose 中的服务是否已完成迁移
///
/// 顶层声明存在且为指向目标网络的 external 网络、版本满足要求、服务网络包含别名
pub fn is_compose_migrated(
    compose: &ComposeFile,
    service_name: &str,
    config: &MigrationConfig,
    target: &NetworkTarget,
    alias: &str,
) -> bool {
    let Some(declaration) = compose.network(&target.name) else {
        return false;
    };
    let Some(service_network) = compose
        .service(service_name)
        .and_then(|s| s.network(&target.name))
    else {
        return false;
    };

    declaration.name.as_deref() == Some(target.name.as_str())
        && declaration.is_external()
        && compose.meets_version(config.minimum_compose_version)
        && service_network.has_alias(alias)
}

/// 在内存中迁移 compose，返回是否有修改
pub fn migrate_compose(
    compose: &mut ComposeFile,
    service_name: &str,
    config: &MigrationConfig,
    target: &NetworkTarget,
    alias: &str,
) -> bool {
    if is_compose_migrated(compose, service_name, config, target, alias) {
        return false;
    }

    compose.ensure_version(config.minimum_compose_version);

    // 同一服务只保留一代私有网络声明
    if config.legacy_compose_network != target.name {
        compose.remove_service_network(service_name, &config.legacy_compose_network);
    }

    let existing = compose
        .service(service_name)
        .and_then(|s| s.network(&target.name))
        .unwrap_or_default();
    let aliases = merge_alias(existing.aliases(), alias);

    compose.add_service_network(
        service_name,
        &target.name,
        ServiceNetworkSettings {
            aliases: Some(aliases),
            ..existing
        },
        ComposeNetwork::external(&target.name),
    )
}

/// 迁移容器所属服务的 compose 声明，写入时返回 true
pub async fn reconcile_compose<S>(
    store: &S,
    config: &MigrationConfig,
    container: &ManagedContainer,
    target: &NetworkTarget,
    alias: &str,
) -> Result<bool>
where
    S: ComposeStore + ?Sized,
{
    let mut compose = store.load(&container.dnp_name, container.is_core).await?;

    if compose.service(&container.service_name).is_none() {
        return Err(MigrationError::ServiceNotFound {
            dnp_name: container.dnp_name.clone(),
            service: container.service_name.clone(),
        });
    }

    if !migrate_compose(&mut compose, &container.service_name, config, target, alias) {
        debug!(
            network = %target.name,
            alias = %alias,
            service = %container.service_name,
            "Compose already migrated"
        );
        return Ok(false);
    }

    store
        .write(&container.dnp_name, container.is_core, &compose)
        .await?;
    Ok(true)
}
