//! 链驱动解析
//!
//! 根据包声明的链驱动与私有网络别名，得到同步状态探测使用的驱动名与 API 地址

use thiserror::Error;

use crate::domain::container::{InstalledPackage, ManagedContainer};
use crate::services::migration::compute_alias;

/// 链解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Package {0} has no chain driver")]
    MissingChain(String),

    #[error("Package {0} has no containers")]
    NoContainers(String),

    #[error("The container of service {0} does not exist")]
    ServiceNotFound(String),
}

/// 尚未在 manifest 中声明链驱动的已知包
const KNOWN_CHAINS: &[(&str, &str)] = &[
    ("openethereum.dnp.dappnode.eth", "ethereum"),
    ("ropsten.dnp.dappnode.eth", "ethereum"),
    ("rinkeby.dnp.dappnode.eth", "ethereum"),
    ("kovan.dnp.dappnode.eth", "ethereum"),
    ("bitcoin.dnp.dappnode.eth", "bitcoin"),
    ("monero.dnp.dappnode.eth", "monero"),
    ("prysm.dnp.dappnode.eth", "ethereum2-beacon-chain-prysm"),
    ("prysm-pyrmont.dnp.dappnode.eth", "ethereum2-beacon-chain-prysm"),
];

pub fn known_chain(dnp_name: &str) -> Option<&'static str> {
    KNOWN_CHAINS
        .iter()
        .find(|(name, _)| *name == dnp_name)
        .map(|(_, driver)| *driver)
}

/// 包的链驱动名，未声明时回退到已知包列表
pub fn driver_name(package: &InstalledPackage) -> Result<String, ChainError> {
    match &package.chain {
        Some(chain) => Ok(chain.preset().to_string()),
        None => known_chain(&package.dnp_name)
            .map(str::to_string)
            .ok_or_else(|| ChainError::MissingChain(package.dnp_name.clone())),
    }
}

/// 按服务名查找容器并返回其私有网络别名
pub fn search_container_by_service(
    service: &str,
    containers: &[ManagedContainer],
) -> Result<String, ChainError> {
    containers
        .iter()
        .find(|c| c.service_name == service)
        .map(compute_alias)
        .ok_or_else(|| ChainError::ServiceNotFound(service.to_string()))
}

/// `http://<alias>:<port>`，结构化声明可以覆盖服务与端口
pub fn api_url(package: &InstalledPackage, default_port: u16) -> Result<String, ChainError> {
    let chain = package
        .chain
        .as_ref()
        .ok_or_else(|| ChainError::MissingChain(package.dnp_name.clone()))?;
    let first = package
        .containers
        .first()
        .ok_or_else(|| ChainError::NoContainers(package.dnp_name.clone()))?;

    let domain = match chain.service() {
        Some(service) => search_container_by_service(service, &package.containers)?,
        None => compute_alias(first),
    };
    let port = chain.port().unwrap_or(default_port);

    Ok(format!("http://{}:{}", domain, port))
}

/// 改写常见的链连接错误
pub fn parse_chain_error(message: &str) -> String {
    if message.contains("ECONNREFUSED") || message.contains("Connection refused") {
        return "DAppNode Package stopped or unreachable (connection refused)".to_string();
    }
    if message.contains("Invalid JSON RPC response") {
        return "DAppNode Package stopped or unreachable (invalid response)".to_string();
    }
    message.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::ChainSpec;

    fn package(chain: Option<ChainSpec>) -> InstalledPackage {
        InstalledPackage {
            dnp_name: "geth.dnp.dappnode.eth".to_string(),
            is_core: false,
            chain,
            containers: vec![
                ManagedContainer::new(
                    "DAppNodePackage-p2p.geth.dnp.dappnode.eth",
                    "geth.dnp.dappnode.eth",
                    "p2p",
                    false,
                ),
                ManagedContainer::new(
                    "DAppNodePackage-rpc.geth.dnp.dappnode.eth",
                    "geth.dnp.dappnode.eth",
                    "rpc",
                    false,
                ),
            ],
        }
    }

    #[test]
    fn test_driver_name() {
        let pkg = package(Some(ChainSpec::Preset("ethereum".to_string())));
        assert_eq!(driver_name(&pkg).unwrap(), "ethereum");

        let pkg = package(Some(ChainSpec::Custom {
            preset: "ethereum".to_string(),
            service: Some("rpc".to_string()),
            port: None,
        }));
        assert_eq!(driver_name(&pkg).unwrap(), "ethereum");

        let pkg = package(None);
        assert_eq!(
            driver_name(&pkg),
            Err(ChainError::MissingChain("geth.dnp.dappnode.eth".to_string()))
        );
    }

    #[test]
    fn test_driver_name_known_registry() {
        let mut pkg = package(None);
        pkg.dnp_name = "bitcoin.dnp.dappnode.eth".to_string();
        assert_eq!(driver_name(&pkg).unwrap(), "bitcoin");
    }

    #[test]
    fn test_api_url_preset_uses_first_container() {
        let pkg = package(Some(ChainSpec::Preset("ethereum".to_string())));
        assert_eq!(api_url(&pkg, 8545).unwrap(), "http://p2p.geth.dappnode:8545");
    }

    #[test]
    fn test_api_url_custom_service_and_port() {
        let pkg = package(Some(ChainSpec::Custom {
            preset: "ethereum".to_string(),
            service: Some("rpc".to_string()),
            port: Some(8546),
        }));
        assert_eq!(api_url(&pkg, 8545).unwrap(), "http://rpc.geth.dappnode:8546");
    }

    #[test]
    fn test_api_url_unknown_service() {
        let pkg = package(Some(ChainSpec::Custom {
            preset: "ethereum".to_string(),
            service: Some("archive".to_string()),
            port: None,
        }));
        assert_eq!(
            api_url(&pkg, 8545),
            Err(ChainError::ServiceNotFound("archive".to_string()))
        );
    }

    #[test]
    fn test_parse_chain_error() {
        assert_eq!(
            parse_chain_error("connect ECONNREFUSED 172.33.0.5:8545"),
            "DAppNode Package stopped or unreachable (connection refused)"
        );
        assert_eq!(parse_chain_error("timeout"), "timeout");
    }
}
