//! 领域模型模块
//!
//! 纯数据结构，不依赖 tokio

pub mod chain;
pub mod compose;
pub mod container;
pub mod network;

// Re-exports for convenience
pub use chain::ChainSpec;
pub use compose::{ComposeFile, ComposeNetwork, ComposeVersion, ServiceNetworkSettings, ServiceNetworks};
pub use container::{InstalledPackage, ManagedContainer};
pub use network::{IpamConfig, LiveNetworkAttachment, NetworkTarget};
