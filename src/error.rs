//! 统一错误处理
//!
//! 迁移过程中所有失败都归结为 `MigrationError`，由编排器按容器隔离处理

use thiserror::Error;

/// 迁移错误类型
#[derive(Debug, Error)]
pub enum MigrationError {
    /// 命令启动失败（docker 不存在等）
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// docker 命令返回非零退出码
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// docker 输出无法解析
    #[error("Invalid JSON from {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// compose 文件解析或序列化失败
    #[error("Invalid compose file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// compose 文件中没有该服务
    #[error("Service {service} not found in compose of {dnp_name}")]
    ServiceNotFound { dnp_name: String, service: String },

    /// 断开网络后重新连接失败，容器暂时不在该网络上
    #[error("Container {container} left {network} without reconnecting: {reason}")]
    LiveNetwork {
        container: String,
        network: String,
        reason: String,
    },
}

impl MigrationError {
    pub fn command_failed(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    pub fn yaml(path: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }
}

/// 便捷类型别名
pub type Result<T> = std::result::Result<T, MigrationError>;
