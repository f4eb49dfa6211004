//! DAppNode 私有网络迁移
//!
//! Usage:
//! - Run migration once: `dncore-netmigrate`
//! - Show per-container state without changing anything: `dncore-netmigrate status`

use std::sync::Arc;

use dncore_netmigrate::config::env::constants::VERSION;
use dncore_netmigrate::infra::{DockerCli, FsComposeStore};
use dncore_netmigrate::{run_startup_migration, MigrationConfig, NetworkMigration};
use tracing_subscriber::EnvFilter;

enum Command {
    Migrate,
    Status,
}

/// 解析命令行参数
fn parse_args() -> Command {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("status") => Command::Status,
        Some("--help") | Some("-h") => {
            print_help();
            std::process::exit(0);
        }
        _ => Command::Migrate,
    }
}

fn print_help() {
    println!("dncore-netmigrate {} - DAppNode private network alias migration", VERSION);
    println!();
    println!("USAGE:");
    println!("    dncore-netmigrate [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("    status           Print migration state per container and network");
    println!();
    println!("ENVIRONMENT:");
    println!("    DNCORE_DIR       Core package compose directory");
    println!("    REPO_DIR         Package compose directory");
    println!("    DOCKER_BIN       Docker binary (default: docker)");
    println!("    RUST_LOG         Log filter (default: info)");
}

async fn print_status() -> anyhow::Result<()> {
    let config = Arc::new(MigrationConfig::from_env());
    let runtime = DockerCli::new(config.docker_bin.clone());
    let store = FsComposeStore::new(config.dncore_dir.clone(), config.repo_dir.clone());

    let statuses = NetworkMigration::new(config, runtime, store).status().await?;
    println!("{}", serde_json::to_string_pretty(&statuses)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let command = parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        match command {
            Command::Status => print_status().await,
            Command::Migrate => {
                // 迁移失败不影响宿主进程，下次启动重试
                match run_startup_migration().await {
                    Ok(report) => tracing::info!(
                        version = VERSION,
                        networks_created = ?report.networks_created,
                        failures = report.failures.len(),
                        "Migration done"
                    ),
                    Err(e) => tracing::error!(error = %e, "Alias migration could not inspect containers"),
                }
                Ok(())
            }
        }
    })
}
