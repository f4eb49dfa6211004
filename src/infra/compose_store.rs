//! 本地 compose 文件读写
//!
//! 核心包：`<DNCORE_DIR>/docker-compose-<short>.yml`
//! 普通包：`<REPO_DIR>/<dnpName>/docker-compose.yml`

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use crate::domain::compose::ComposeFile;
use crate::error::{MigrationError, Result};
use crate::services::migration::ComposeStore;

/// 基于文件系统的 compose 存储
pub struct FsComposeStore {
    dncore_dir: PathBuf,
    repo_dir: PathBuf,
}

impl FsComposeStore {
    pub fn new(dncore_dir: impl Into<PathBuf>, repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            dncore_dir: dncore_dir.into(),
            repo_dir: repo_dir.into(),
        }
    }
}

#[async_trait]
impl ComposeStore for FsComposeStore {
    fn compose_path(&self, dnp_name: &str, is_core: bool) -> PathBuf {
        if is_core {
            let short = dnp_name.split('.').next().unwrap_or(dnp_name);
            self.dncore_dir.join(format!("docker-compose-{}.yml", short))
        } else {
            self.repo_dir.join(dnp_name).join("docker-compose.yml")
        }
    }

    async fn load(&self, dnp_name: &str, is_core: bool) -> Result<ComposeFile> {
        let path = self.compose_path(dnp_name, is_core);
        let content = fs::read_to_string(&path).await?;
        ComposeFile::from_yaml(&content)
            .map_err(|e| MigrationError::yaml(path.display().to_string(), e))
    }

    /// 先写临时文件再重命名
    async fn write(&self, dnp_name: &str, is_core: bool, compose: &ComposeFile) -> Result<()> {
        let path = self.compose_path(dnp_name, is_core);
        let temp_path = path.with_extension("yml.tmp");

        let content = compose
            .to_yaml()
            .map_err(|e| MigrationError::yaml(path.display().to_string(), e))?;

        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &path).await?;

        debug!(path = %path.display(), "Wrote compose file");
        Ok(())
    }
}
