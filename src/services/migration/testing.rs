//! 测试用的内存运行时与 compose 存储

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::domain::compose::ComposeFile;
use crate::domain::container::ManagedContainer;
use crate::domain::network::{IpamConfig, LiveNetworkAttachment};
use crate::error::{MigrationError, Result};

use super::inspect::{ComposeStore, ContainerRuntime};

/// 记录下来的变更调用
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCall {
    CreateNetwork(String),
    Disconnect { network: String, container: String },
    Connect { network: String, container: String },
    Recreate(PathBuf),
}

type ComposeFiles = Arc<Mutex<BTreeMap<(String, bool), ComposeFile>>>;

#[derive(Default)]
struct RuntimeState {
    networks: Vec<String>,
    attachments: BTreeMap<(String, String), LiveNetworkAttachment>,
    calls: Vec<RuntimeCall>,
    fail_connect: HashSet<String>,
    fail_create: bool,
    fail_listing: bool,
    compose_files: Option<ComposeFiles>,
}

pub struct FakeRuntime {
    containers: Vec<ManagedContainer>,
    state: Mutex<RuntimeState>,
}

impl FakeRuntime {
    pub fn new(containers: Vec<ManagedContainer>, networks: Vec<&str>) -> Self {
        Self {
            containers,
            state: Mutex::new(RuntimeState {
                networks: networks.into_iter().map(String::from).collect(),
                ..Default::default()
            }),
        }
    }

    pub fn set_attachment(&self, container: &str, network: &str, attachment: LiveNetworkAttachment) {
        self.state
            .lock()
            .unwrap()
            .attachments
            .insert((container.to_string(), network.to_string()), attachment);
    }

    pub fn attachment(&self, container: &str, network: &str) -> Option<LiveNetworkAttachment> {
        self.state
            .lock()
            .unwrap()
            .attachments
            .get(&(container.to_string(), network.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn fail_connect_for(&self, container: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_connect
            .insert(container.to_string());
    }

    pub fn fail_create_network(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_listing(&self) {
        self.state.lock().unwrap().fail_listing = true;
    }

    /// 强制重建时按 store 中的 compose 声明重新挂载网络
    pub fn recreate_from(&self, store: &MemoryComposeStore) {
        self.state.lock().unwrap().compose_files = Some(store.files.clone());
    }

    /// 重建后容器的网络端点完全来自 compose 声明
    fn apply_compose(&self, state: &mut RuntimeState, compose_path: &Path) {
        let Some(files) = &state.compose_files else {
            return;
        };
        let files = files.lock().unwrap().clone();
        let Some(((dnp_name, is_core), compose)) = files
            .into_iter()
            .find(|((dnp, core), _)| MemoryComposeStore::path_for(dnp, *core) == compose_path)
        else {
            return;
        };

        for container in self
            .containers
            .iter()
            .filter(|c| c.dnp_name == dnp_name && c.is_core == is_core)
        {
            state.attachments.retain(|(name, _), _| name != &container.container_name);
            let Some(networks) = compose
                .service(&container.service_name)
                .and_then(|svc| svc.networks.as_ref())
            else {
                continue;
            };
            for (key, settings) in networks.to_map() {
                let network = compose
                    .network(&key)
                    .and_then(|n| n.name)
                    .unwrap_or(key);
                let aliases = settings.map(|s| s.aliases().to_vec()).unwrap_or_default();
                state.attachments.insert(
                    (container.container_name.clone(), network),
                    LiveNetworkAttachment::with_aliases(aliases),
                );
            }
        }
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self) -> Result<Vec<ManagedContainer>> {
        if self.state.lock().unwrap().fail_listing {
            return Err(MigrationError::command_failed("docker ps", "daemon unreachable"));
        }
        Ok(self.containers.clone())
    }

    async fn list_networks(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().networks.clone())
    }

    async fn live_attachment(
        &self,
        container_name: &str,
        network: &str,
    ) -> Result<Option<LiveNetworkAttachment>> {
        Ok(self.attachment(container_name, network))
    }

    async fn create_network(&self, network: &str, _ipam: &IpamConfig) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(MigrationError::command_failed("docker network create", "pool overlaps"));
        }
        state.networks.push(network.to_string());
        state.calls.push(RuntimeCall::CreateNetwork(network.to_string()));
        Ok(())
    }

    async fn disconnect_network(&self, network: &str, container_name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .attachments
            .remove(&(container_name.to_string(), network.to_string()));
        state.calls.push(RuntimeCall::Disconnect {
            network: network.to_string(),
            container: container_name.to_string(),
        });
        Ok(())
    }

    async fn connect_network(
        &self,
        network: &str,
        container_name: &str,
        endpoint: &LiveNetworkAttachment,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_connect.contains(container_name) {
            return Err(MigrationError::command_failed("docker network connect", "endpoint busy"));
        }
        state.attachments.insert(
            (container_name.to_string(), network.to_string()),
            endpoint.clone(),
        );
        state.calls.push(RuntimeCall::Connect {
            network: network.to_string(),
            container: container_name.to_string(),
        });
        Ok(())
    }

    async fn compose_up_force_recreate(&self, compose_path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.apply_compose(&mut state, compose_path);
        state
            .calls
            .push(RuntimeCall::Recreate(compose_path.to_path_buf()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryComposeStore {
    files: ComposeFiles,
    writes: Mutex<usize>,
}

impl MemoryComposeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn path_for(dnp_name: &str, is_core: bool) -> PathBuf {
        let dir = if is_core { "core" } else { "repo" };
        PathBuf::from(format!("/mem/{}/{}/docker-compose.yml", dir, dnp_name))
    }

    pub fn insert(&self, dnp_name: &str, is_core: bool, compose: ComposeFile) {
        self.files
            .lock()
            .unwrap()
            .insert((dnp_name.to_string(), is_core), compose);
    }

    pub fn get(&self, dnp_name: &str, is_core: bool) -> Option<ComposeFile> {
        self.files
            .lock()
            .unwrap()
            .get(&(dnp_name.to_string(), is_core))
            .cloned()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl ComposeStore for MemoryComposeStore {
    fn compose_path(&self, dnp_name: &str, is_core: bool) -> PathBuf {
        Self::path_for(dnp_name, is_core)
    }

    async fn load(&self, dnp_name: &str, is_core: bool) -> Result<ComposeFile> {
        self.get(dnp_name, is_core).ok_or_else(|| {
            MigrationError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no compose for {}", dnp_name),
            ))
        })
    }

    async fn write(&self, dnp_name: &str, is_core: bool, compose: &ComposeFile) -> Result<()> {
        self.insert(dnp_name, is_core, compose.clone());
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}
