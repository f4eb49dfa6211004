//! docker CLI 适配器
//!
//! 通过 `docker` 命令实现 `ContainerRuntime`

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::domain::container::{InspectedContainer, ManagedContainer};
use crate::domain::network::{IpamConfig, LiveNetworkAttachment};
use crate::error::{MigrationError, Result};
use crate::services::migration::ContainerRuntime;

use super::command::{display_command, CommandRunner};

/// 容器名过滤条件，覆盖 DAppNodeCore- 与 DAppNodePackage-
const CONTAINER_NAME_FILTER: &str = "name=DAppNode";

/// docker CLI 客户端
pub struct DockerCli {
    docker_bin: String,
    compose_cmd: OnceCell<(String, Vec<String>)>,
}

impl DockerCli {
    pub fn new(docker_bin: impl Into<String>) -> Self {
        Self {
            docker_bin: docker_bin.into(),
            compose_cmd: OnceCell::new(),
        }
    }

    async fn docker(&self, args: &[&str]) -> Result<String> {
        CommandRunner::run_checked(&self.docker_bin, args).await
    }

    /// 优先使用 docker-compose，否则使用 `docker compose`
    async fn compose_command(&self) -> &(String, Vec<String>) {
        self.compose_cmd
            .get_or_init(|| async {
                let found = CommandRunner::run_simple("which", &["docker-compose"])
                    .await
                    .map(|o| o.status.success())
                    .unwrap_or(false);
                if found {
                    ("docker-compose".to_string(), vec![])
                } else {
                    (self.docker_bin.clone(), vec!["compose".to_string()])
                }
            })
            .await
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn list_containers(&self) -> Result<Vec<ManagedContainer>> {
        let ids = self
            .docker(&["ps", "-aq", "--no-trunc", "--filter", CONTAINER_NAME_FILTER])
            .await?;
        let ids: Vec<&str> = ids.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec!["inspect"];
        args.extend(ids.iter().copied());
        let output = CommandRunner::run_simple(&self.docker_bin, &args).await?;

        // 容器在 ps 与 inspect 之间消失时，inspect 仍会输出其余容器并返回非零
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if output.stdout.is_empty() {
                return Err(MigrationError::command_failed("docker inspect", stderr.trim()));
            }
            warn!(stderr = %stderr.trim(), "Some containers could not be inspected, skipping them");
        }

        parse_inspect_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn list_networks(&self) -> Result<Vec<String>> {
        let stdout = self.docker(&["network", "ls", "--format", "{{.Name}}"]).await?;
        Ok(parse_network_names(&stdout))
    }

    async fn live_attachment(
        &self,
        container_name: &str,
        network: &str,
    ) -> Result<Option<LiveNetworkAttachment>> {
        let stdout = self
            .docker(&[
                "inspect",
                "--format",
                "{{json .NetworkSettings.Networks}}",
                container_name,
            ])
            .await?;
        let mut networks = parse_endpoints(container_name, &stdout)?;
        Ok(networks.remove(network))
    }

    async fn create_network(&self, network: &str, ipam: &IpamConfig) -> Result<()> {
        let args = create_network_args(network, ipam);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.docker(&args).await?;
        Ok(())
    }

    async fn disconnect_network(&self, network: &str, container_name: &str) -> Result<()> {
        let args = ["network", "disconnect", network, container_name];
        let output = CommandRunner::run_simple(&self.docker_bin, &args).await?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_not_connected_error(&stderr) {
            debug!(network = %network, container = %container_name, "Container was not connected");
            return Ok(());
        }
        Err(MigrationError::command_failed(
            display_command(&self.docker_bin, &args),
            stderr.trim(),
        ))
    }

    async fn connect_network(
        &self,
        network: &str,
        container_name: &str,
        endpoint: &LiveNetworkAttachment,
    ) -> Result<()> {
        let args = connect_network_args(network, container_name, endpoint);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.docker(&args).await?;
        Ok(())
    }

    async fn compose_up_force_recreate(&self, compose_path: &Path) -> Result<()> {
        let (program, base) = self.compose_command().await;
        let path = compose_path.to_string_lossy().into_owned();

        let mut args: Vec<&str> = base.iter().map(String::as_str).collect();
        args.extend(["-f", path.as_str(), "up", "-d", "--force-recreate"]);

        CommandRunner::run_checked(program, &args).await?;
        Ok(())
    }
}

/// 解析 `docker inspect <ids...>` 输出，跳过非 DAppNode 容器
pub fn parse_inspect_output(stdout: &str) -> Result<Vec<ManagedContainer>> {
    let raw: Vec<InspectedContainer> =
        serde_json::from_str(stdout).map_err(|e| MigrationError::json("docker inspect", e))?;
    Ok(raw.iter().filter_map(ManagedContainer::from_inspect).collect())
}

pub fn parse_network_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// 解析 `{{json .NetworkSettings.Networks}}`，容器没有网络时 docker 输出 null
pub fn parse_endpoints(
    container_name: &str,
    stdout: &str,
) -> Result<BTreeMap<String, LiveNetworkAttachment>> {
    let parsed: Option<BTreeMap<String, LiveNetworkAttachment>> =
        serde_json::from_str(stdout.trim()).map_err(|e| {
            MigrationError::json(format!("docker inspect {}", container_name), e)
        })?;
    Ok(parsed.unwrap_or_default())
}

pub fn create_network_args(network: &str, ipam: &IpamConfig) -> Vec<String> {
    let mut args = vec![
        "network".to_string(),
        "create".to_string(),
        "--driver".to_string(),
        "bridge".to_string(),
        "--subnet".to_string(),
        ipam.subnet.clone(),
    ];
    if let Some(gateway) = &ipam.gateway {
        args.push("--gateway".to_string());
        args.push(gateway.clone());
    }
    args.push(network.to_string());
    args
}

pub fn connect_network_args(
    network: &str,
    container_name: &str,
    endpoint: &LiveNetworkAttachment,
) -> Vec<String> {
    let mut args = vec!["network".to_string(), "connect".to_string()];
    for alias in endpoint.aliases() {
        args.push("--alias".to_string());
        args.push(alias.clone());
    }
    if let Some(ip) = endpoint.static_ipv4() {
        args.push("--ip".to_string());
        args.push(ip.to_string());
    }
    args.push(network.to_string());
    args.push(container_name.to_string());
    args
}

/// `container ... is not connected to network ...`
pub fn is_not_connected_error(stderr: &str) -> bool {
    stderr.contains("is not connected")
}
