//! 私有网络与别名迁移
//!
//! 每次进程启动时运行一次：确保私有网络存在，并让每个容器的 compose 声明
//! 与运行时端点都带上确定的别名。状态不做持久化，每次都从检查结果重新推导，
//! 单个容器失败只记录日志，下次启动自动重试。

pub mod alias;
pub mod compose;
pub mod inspect;
pub mod live;

#[cfg(test)]
mod testing;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::MigrationConfig;
use crate::domain::container::ManagedContainer;
use crate::domain::network::NetworkTarget;
use crate::error::Result;

pub use alias::compute_alias;
pub use compose::reconcile_compose;
pub use inspect::{ComposeStore, ContainerRuntime};
pub use live::reconcile_live;

/// 单个 (容器, 网络) 的迁移状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    Unmigrated,
    ComposeMigrated,
    FullyMigrated,
}

/// 状态查询结果
#[derive(Debug, Clone, Serialize)]
pub struct PairStatus {
    pub container: String,
    pub network: String,
    pub alias: String,
    pub state: MigrationState,
}

/// 单个容器的迁移失败
#[derive(Debug, Clone, Serialize)]
pub struct ContainerFailure {
    pub container: String,
    pub network: String,
    pub error: String,
}

/// 一次迁移的汇总
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub networks_created: Vec<String>,
    pub compose_writes: usize,
    pub live_changes: usize,
    pub failures: Vec<ContainerFailure>,
}

impl MigrationReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            networks_created: Vec::new(),
            compose_writes: 0,
            live_changes: 0,
            failures: Vec::new(),
        }
    }

    /// 没有任何写入
    pub fn is_noop(&self) -> bool {
        self.networks_created.is_empty() && self.compose_writes == 0 && self.live_changes == 0
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 迁移编排器
pub struct NetworkMigration<R, S> {
    config: Arc<MigrationConfig>,
    runtime: R,
    store: S,
}

impl<R, S> NetworkMigration<R, S>
where
    R: ContainerRuntime,
    S: ComposeStore,
{
    pub fn new(config: Arc<MigrationConfig>, runtime: R, store: S) -> Self {
        Self {
            config,
            runtime,
            store,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 执行迁移
    ///
    /// 只有列出容器或网络失败时返回错误；单个容器的失败记录在报告中
    pub async fn run(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::new();

        let containers = self.runtime.list_containers().await?;
        let mut existing: HashSet<String> =
            self.runtime.list_networks().await?.into_iter().collect();

        info!(
            containers = containers.len(),
            networks = self.config.targets.len(),
            "Starting private network alias migration"
        );

        for target in &self.config.targets {
            if !existing.contains(&target.name) {
                match self.runtime.create_network(&target.name, &target.ipam).await {
                    Ok(()) => {
                        info!(network = %target.name, subnet = %target.ipam.subnet, "Created new network");
                        existing.insert(target.name.clone());
                        report.networks_created.push(target.name.clone());
                    }
                    Err(e) => {
                        error!(network = %target.name, error = %e, "Failed to create network, skipping");
                        report.failures.push(ContainerFailure {
                            container: String::new(),
                            network: target.name.clone(),
                            error: e.to_string(),
                        });
                        continue;
                    }
                }
            }

            for container in &containers {
                if let Err(e) = self.migrate_container(container, target, &mut report).await {
                    error!(
                        container = %container.container_name,
                        network = %target.name,
                        error = %e,
                        "Error alias migrate"
                    );
                    report.failures.push(ContainerFailure {
                        container: container.container_name.clone(),
                        network: target.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.finished_at = Some(Utc::now());
        if report.is_clean() {
            info!(
                compose_writes = report.compose_writes,
                live_changes = report.live_changes,
                "Private network alias migration finished"
            );
        } else {
            warn!(
                compose_writes = report.compose_writes,
                live_changes = report.live_changes,
                failures = report.failures.len(),
                "Private network alias migration finished with failures"
            );
        }
        Ok(report)
    }

    /// compose 先于运行时迁移：重建类容器会读取刚写入的 compose
    async fn migrate_container(
        &self,
        container: &ManagedContainer,
        target: &NetworkTarget,
        report: &mut MigrationReport,
    ) -> Result<()> {
        let alias = compute_alias(container);

        if reconcile_compose(&self.store, &self.config, container, target, &alias).await? {
            info!(network = %target.name, alias = %alias, "Migrated compose alias");
            report.compose_writes += 1;
        }

        if reconcile_live(&self.runtime, &self.store, &self.config, container, target, &alias)
            .await?
        {
            info!(network = %target.name, alias = %alias, "Migrated container alias");
            report.live_changes += 1;
        }

        Ok(())
    }

    /// 只读地推导每个 (容器, 网络) 的迁移状态
    pub async fn status(&self) -> Result<Vec<PairStatus>> {
        let containers = self.runtime.list_containers().await?;
        let mut statuses = Vec::with_capacity(containers.len() * self.config.targets.len());

        for target in &self.config.targets {
            for container in &containers {
                let alias = compute_alias(container);
                let state = match self.pair_state(container, target, &alias).await {
                    Ok(state) => state,
                    Err(e) => {
                        warn!(
                            container = %container.container_name,
                            network = %target.name,
                            error = %e,
                            "Failed to inspect migration state"
                        );
                        MigrationState::Unmigrated
                    }
                };
                statuses.push(PairStatus {
                    container: container.container_name.clone(),
                    network: target.name.clone(),
                    alias,
                    state,
                });
            }
        }
        Ok(statuses)
    }

    async fn pair_state(
        &self,
        container: &ManagedContainer,
        target: &NetworkTarget,
        alias: &str,
    ) -> Result<MigrationState> {
        let file = self.store.load(&container.dnp_name, container.is_core).await?;
        if !compose::is_compose_migrated(&file, &container.service_name, &self.config, target, alias)
        {
            return Ok(MigrationState::Unmigrated);
        }

        let live = self
            .runtime
            .live_attachment(&container.container_name, &target.name)
            .await?;
        Ok(match live {
            Some(attachment) if attachment.has_alias(alias) => MigrationState::FullyMigrated,
            _ => MigrationState::ComposeMigrated,
        })
    }
}

/// 启动迁移入口：从环境变量加载配置，使用 docker CLI 与本地 compose 文件
pub async fn run_startup_migration() -> Result<MigrationReport> {
    use crate::infra::{DockerCli, FsComposeStore};

    let config = Arc::new(MigrationConfig::from_env());
    let runtime = DockerCli::new(config.docker_bin.clone());
    let store = FsComposeStore::new(config.dncore_dir.clone(), config.repo_dir.clone());

    NetworkMigration::new(config, runtime, store).run().await
}
