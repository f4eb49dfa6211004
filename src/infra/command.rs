//! 命令执行器
//!
//! docker CLI 调用统一走这里：一次性收集 stdout/stderr，失败时带上 stderr

use std::process::Output;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MigrationError, Result};

/// 命令执行器
pub struct CommandRunner;

impl CommandRunner {
    /// 执行命令并返回原始输出（不检查退出码）
    pub async fn run_simple(program: &str, args: &[&str]) -> Result<Output> {
        debug!(program = %program, args = ?args, "Running command");
        Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|source| MigrationError::Spawn {
                program: program.to_string(),
                source,
            })
    }

    /// 执行命令，非零退出码转换为 `CommandFailed`，成功时返回 stdout
    pub async fn run_checked(program: &str, args: &[&str]) -> Result<String> {
        let output = Self::run_simple(program, args).await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(MigrationError::command_failed(
                display_command(program, args),
                String::from_utf8_lossy(&output.stderr).trim(),
            ))
        }
    }
}

/// `docker network ls` 形式的命令描述，用于错误信息
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
