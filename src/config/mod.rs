//! 配置模块
//!
//! 环境变量解析与迁移常量

pub mod env;

pub use env::MigrationConfig;
