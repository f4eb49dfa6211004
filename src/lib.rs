//! DAppNode 私有网络迁移
//!
//! 启动时把所有包容器迁移到共享私有网络，并保证 compose 声明与运行时别名一致

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod services;

pub use config::MigrationConfig;
pub use error::{MigrationError, Result};
pub use services::migration::{run_startup_migration, MigrationReport, NetworkMigration};
