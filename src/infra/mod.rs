//! 基础设施模块
//!
//! 封装外部依赖（docker CLI、compose 文件等）

pub mod command;
pub mod compose_store;
pub mod docker;

pub use command::CommandRunner;
pub use compose_store::FsComposeStore;
pub use docker::DockerCli;
