//! 私有网络别名规则
//!
//! 别名只由包名与服务名决定，重复计算结果必须完全一致

use crate::config::env::constants::ALIAS_DOMAIN;
use crate::domain::container::ManagedContainer;

/// 官方包后缀，整体去掉
const DNP_SUFFIX: &str = ".dnp.dappnode.eth";
/// 社区包后缀，保留 `public` 段以区分同名官方包
const PUBLIC_SUFFIX: &str = ".public.dappnode.eth";
const DAPPNODE_ENS: &str = ".dappnode.eth";

/// `geth.dnp.dappnode.eth` -> `geth`，`geth.public.dappnode.eth` -> `geth.public`
///
/// 其他 ENS 名原样保留，不同包名不会得到相同结果
pub fn short_dnp_name(dnp_name: &str) -> &str {
    let short = if let Some(rest) = dnp_name.strip_suffix(DNP_SUFFIX) {
        rest
    } else if dnp_name.ends_with(PUBLIC_SUFFIX) {
        dnp_name.strip_suffix(DAPPNODE_ENS).unwrap_or(dnp_name)
    } else {
        dnp_name
    };
    if short.is_empty() {
        dnp_name
    } else {
        short
    }
}

/// 容器域名：单服务包为包名，多服务包为 `<service>.<包名>`
pub fn container_domain(dnp_name: &str, service_name: &str) -> String {
    let short = short_dnp_name(dnp_name);
    if service_name.is_empty() || service_name == dnp_name || service_name == short {
        short.to_string()
    } else {
        format!("{}.{}", service_name, short)
    }
}

/// 容器在私有网络上的别名
pub fn compute_alias(container: &ManagedContainer) -> String {
    format!(
        "{}.{}",
        container_domain(&container.dnp_name, &container.service_name),
        ALIAS_DOMAIN
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_multi_service() {
        let c = ManagedContainer::new("C1", "mypkg", "s1", false);
        assert_eq!(compute_alias(&c), "s1.mypkg.dappnode");
    }

    #[test]
    fn test_alias_single_service_core() {
        let c = ManagedContainer::new(
            "DAppNodeCore-bind.dnp.dappnode.eth",
            "bind.dnp.dappnode.eth",
            "bind.dnp.dappnode.eth",
            true,
        );
        assert_eq!(compute_alias(&c), "bind.dappnode");
    }

    #[test]
    fn test_alias_keeps_public_segment() {
        let c = ManagedContainer::new(
            "DAppNodePackage-rpc.nethermind.public.dappnode.eth",
            "nethermind.public.dappnode.eth",
            "rpc",
            false,
        );
        assert_eq!(compute_alias(&c), "rpc.nethermind.public.dappnode");
    }

    #[test]
    fn test_distinct_packages_get_distinct_aliases() {
        let names = [
            "geth.dnp.dappnode.eth",
            "geth.public.dappnode.eth",
            "geth.dappnode.eth",
            "geth.eth",
        ];
        let aliases: Vec<String> = names
            .iter()
            .map(|name| compute_alias(&ManagedContainer::new("C", *name, *name, false)))
            .collect();
        assert_eq!(
            aliases,
            vec![
                "geth.dappnode",
                "geth.public.dappnode",
                "geth.dappnode.eth.dappnode",
                "geth.eth.dappnode",
            ]
        );
        let unique: std::collections::HashSet<&String> = aliases.iter().collect();
        assert_eq!(unique.len(), aliases.len());
    }

    #[test]
    fn test_alias_is_deterministic() {
        let c = ManagedContainer::new("C1", "prysm.dnp.dappnode.eth", "beacon-chain", false);
        let first = compute_alias(&c);
        for _ in 0..10 {
            assert_eq!(compute_alias(&c.clone()), first);
        }
        assert_eq!(first, "beacon-chain.prysm.dappnode");
    }

    #[test]
    fn test_short_name_keeps_bare_suffix() {
        assert_eq!(short_dnp_name(".eth"), ".eth");
        assert_eq!(short_dnp_name(".dnp.dappnode.eth"), ".dnp.dappnode.eth");
        assert_eq!(short_dnp_name("public.dappnode.eth"), "public.dappnode.eth");
        assert_eq!(short_dnp_name("mypkg"), "mypkg");
    }
}
