//! DHCP server artifacts (dhcpd.conf and the isc-dhcp-server defaults file)

use crate::settings::{DhcpScope, InterfaceSettings, ScopeTarget};
use std::collections::BTreeMap;

/// Server configuration artifact.
pub const DHCPD_FILE: &str = "dhcpd.conf";
/// Listen-interface defaults artifact (/etc/default/isc-dhcp-server shape).
pub const DEFAULTS_FILE: &str = "isc-dhcp-server";

/// Render dhcpd.conf: fixed globals plus one subnet stanza per enabled scope.
///
/// Subnet math is /24-only by design: the network address is `range_start`
/// with its last octet zeroed and the advertised router is the `.1` host.
/// A range that does not really live in a /24 produces a syntactically
/// valid but wrong stanza. Disabled scopes and scopes without a start
/// address are skipped without error.
pub fn generate_dhcpd(scopes: &BTreeMap<String, DhcpScope>) -> String {
    let mut conf = String::from("default-lease-time 600;\nmax-lease-time 7200;\nauthoritative;\n\n");

    for scope in scopes.values() {
        if !scope.enabled {
            continue;
        }
        let start = match scope.range_start.as_deref().filter(|s| !s.is_empty()) {
            Some(start) => start,
            None => continue,
        };
        let prefix = match start.rsplit_once('.') {
            Some((prefix, _)) => prefix,
            None => continue,
        };
        let end = scope.range_end.as_deref().unwrap_or_default();

        conf.push_str(&format!("subnet {}.0 netmask 255.255.255.0 {{\n", prefix));
        conf.push_str(&format!("  range {} {};\n", start, end));
        conf.push_str(&format!("  option routers {}.1;\n", prefix));
        conf.push_str("  option domain-name-servers 8.8.8.8, 8.8.4.4;\n");
        conf.push_str("}\n\n");
    }

    conf
}

/// Render the listen-interface defaults file.
///
/// This is the single place where bridge aliasing of DHCP scopes is
/// enforced: an enabled scope keyed by a bridged LAN port listens on the
/// bridge device instead, and several ports collapse to one listener.
pub fn generate_defaults(
    scopes: &BTreeMap<String, DhcpScope>,
    network: &BTreeMap<String, InterfaceSettings>,
    bridge_exists: bool,
) -> String {
    let mut devices: Vec<String> = Vec::new();

    for (key, scope) in scopes {
        if !scope.enabled {
            continue;
        }
        let target = ScopeTarget::from_key(key).resolve(network, bridge_exists);
        let device = target.device().to_string();
        if !devices.contains(&device) {
            devices.push(device);
        }
    }

    format!("INTERFACESv4=\"{}\"\nINTERFACESv6=\"\"\n", devices.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Role;

    fn scope(enabled: bool, start: &str, end: &str) -> DhcpScope {
        DhcpScope {
            enabled,
            range_start: Some(start.to_string()),
            range_end: Some(end.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_subnet_stanza_assumes_slash_24() {
        let mut scopes = BTreeMap::new();
        scopes.insert(
            "br0".to_string(),
            scope(true, "192.168.172.2", "192.168.172.254"),
        );

        let conf = generate_dhcpd(&scopes);
        assert!(conf.contains("subnet 192.168.172.0 netmask 255.255.255.0 {\n"));
        assert!(conf.contains("  range 192.168.172.2 192.168.172.254;\n"));
        assert!(conf.contains("  option routers 192.168.172.1;\n"));
        assert!(conf.contains("  option domain-name-servers 8.8.8.8, 8.8.4.4;\n"));
    }

    #[test]
    fn test_globals_are_fixed() {
        let conf = generate_dhcpd(&BTreeMap::new());
        assert_eq!(
            conf,
            "default-lease-time 600;\nmax-lease-time 7200;\nauthoritative;\n\n"
        );
    }

    #[test]
    fn test_disabled_and_startless_scopes_are_skipped() {
        let mut scopes = BTreeMap::new();
        scopes.insert(
            "eth1".to_string(),
            scope(false, "192.168.172.2", "192.168.172.254"),
        );
        scopes.insert(
            "eth2".to_string(),
            DhcpScope {
                enabled: true,
                ..Default::default()
            },
        );

        let conf = generate_dhcpd(&scopes);
        assert!(!conf.contains("subnet"));
        assert!(!conf.contains("range"));
    }

    fn lan(address: &str) -> InterfaceSettings {
        InterfaceSettings {
            role: Role::Lan,
            address: if address.is_empty() {
                None
            } else {
                Some(address.to_string())
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_bridge_keyed_scope_binds_to_bridge() {
        let mut network = BTreeMap::new();
        network.insert(
            "eth0".to_string(),
            InterfaceSettings {
                role: Role::Wan,
                ..Default::default()
            },
        );
        network.insert("eth1".to_string(), lan("192.168.172.1"));
        network.insert("eth2".to_string(), lan(""));

        let mut scopes = BTreeMap::new();
        scopes.insert(
            "br0".to_string(),
            scope(true, "192.168.172.100", "192.168.172.200"),
        );
        scopes.insert(
            "eth1".to_string(),
            scope(false, "192.168.172.2", "192.168.172.254"),
        );

        let content = generate_defaults(&scopes, &network, true);
        assert_eq!(content, "INTERFACESv4=\"br0\"\nINTERFACESv6=\"\"\n");
    }

    #[test]
    fn test_lan_keyed_scopes_collapse_to_one_bridge_listener() {
        let mut network = BTreeMap::new();
        network.insert("eth1".to_string(), lan("192.168.172.1"));
        network.insert("eth2".to_string(), lan(""));

        let mut scopes = BTreeMap::new();
        scopes.insert(
            "eth1".to_string(),
            scope(true, "192.168.172.2", "192.168.172.100"),
        );
        scopes.insert(
            "eth2".to_string(),
            scope(true, "192.168.172.101", "192.168.172.200"),
        );

        let content = generate_defaults(&scopes, &network, true);
        assert_eq!(content, "INTERFACESv4=\"br0\"\nINTERFACESv6=\"\"\n");
    }

    #[test]
    fn test_non_lan_keys_listen_on_their_own_name() {
        let mut network = BTreeMap::new();
        network.insert(
            "eth0".to_string(),
            InterfaceSettings {
                role: Role::Wan,
                ..Default::default()
            },
        );

        let mut scopes = BTreeMap::new();
        scopes.insert("eth0".to_string(), scope(true, "10.10.0.2", "10.10.0.100"));

        let content = generate_defaults(&scopes, &network, false);
        assert_eq!(content, "INTERFACESv4=\"eth0\"\nINTERFACESv6=\"\"\n");
    }

    #[test]
    fn test_no_enabled_scopes_yields_empty_listener_list() {
        let content = generate_defaults(&BTreeMap::new(), &BTreeMap::new(), false);
        assert_eq!(content, "INTERFACESv4=\"\"\nINTERFACESv6=\"\"\n");
    }
}
