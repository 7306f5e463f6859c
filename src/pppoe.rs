//! PPPoE server artifacts (options file and startup script)

use crate::settings::PppoeScope;
use std::collections::BTreeMap;

/// rp-pppoe options artifact, shared by all server instances.
pub const OPTIONS_FILE: &str = "pppoe-server-options";
/// Startup script artifact, one `pppoe-server` invocation per scope.
pub const SCRIPT_FILE: &str = "start_pppoe.sh";

/// The two PPPoE artifacts produced by one pass over the scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PppoeArtifacts {
    pub options: String,
    pub start_script: String,
}

/// Render both PPPoE artifacts.
///
/// The options file is global to every server instance and carries a single
/// ms-dns directive, so the first enabled scope's DNS wins and the rest is
/// dropped. The startup script kills prior instances unconditionally, then
/// starts one server per enabled scope; enabled scopes missing an address
/// get no server line.
pub fn generate(scopes: &BTreeMap<String, PppoeScope>) -> PppoeArtifacts {
    let mut options = String::from("# PPPoE Server Configuration\n");
    options.push_str("require-chap\n");
    options.push_str("lcp-echo-interval 10\n");
    options.push_str("lcp-echo-failure 2\n");

    let mut script = String::from("#!/bin/bash\n# Start PPPoE Servers\n\n");
    script.push_str("killall pppoe-server 2>/dev/null\n\n");

    let mut dns_set = false;
    for (device, scope) in scopes {
        if !scope.enabled {
            continue;
        }
        if !dns_set {
            options.push_str(&format!("ms-dns {}\n", scope.dns));
            dns_set = true;
        }

        let local_ip = match scope.local_ip.as_deref().filter(|s| !s.is_empty()) {
            Some(local_ip) => local_ip,
            None => continue,
        };
        let remote_start = match scope.remote_start.as_deref().filter(|s| !s.is_empty()) {
            Some(remote_start) => remote_start,
            None => continue,
        };

        script.push_str(&format!("echo 'Starting PPPoE on {}...'\n", device));
        script.push_str(&format!(
            "pppoe-server -I {} -L {} -R {} -O /etc/ppp/pppoe-server-options\n",
            device, local_ip, remote_start
        ));
    }

    PppoeArtifacts {
        options,
        start_script: script,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(enabled: bool, local_ip: &str, remote_start: &str, dns: &str) -> PppoeScope {
        PppoeScope {
            enabled,
            local_ip: Some(local_ip.to_string()),
            remote_start: Some(remote_start.to_string()),
            dns: dns.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_server_line_per_enabled_scope() {
        let mut scopes = BTreeMap::new();
        scopes.insert(
            "br0".to_string(),
            scope(true, "10.0.0.1", "10.0.0.10", "8.8.8.8"),
        );

        let artifacts = generate(&scopes);
        assert!(artifacts.start_script.starts_with("#!/bin/bash\n"));
        assert!(artifacts
            .start_script
            .contains("killall pppoe-server 2>/dev/null\n"));
        assert!(artifacts.start_script.contains("echo 'Starting PPPoE on br0...'\n"));
        assert!(artifacts.start_script.contains(
            "pppoe-server -I br0 -L 10.0.0.1 -R 10.0.0.10 -O /etc/ppp/pppoe-server-options\n"
        ));
        assert!(artifacts.options.contains("ms-dns 8.8.8.8\n"));
    }

    #[test]
    fn test_first_enabled_scope_dns_wins() {
        let mut scopes = BTreeMap::new();
        scopes.insert(
            "eth1".to_string(),
            scope(true, "10.0.1.1", "10.0.1.10", "1.1.1.1"),
        );
        scopes.insert(
            "eth2".to_string(),
            scope(true, "10.0.2.1", "10.0.2.10", "9.9.9.9"),
        );

        let artifacts = generate(&scopes);
        assert_eq!(artifacts.options.matches("ms-dns").count(), 1);
        assert!(artifacts.options.contains("ms-dns 1.1.1.1\n"));
        assert!(!artifacts.options.contains("9.9.9.9"));
        // Both servers still start
        assert!(artifacts.start_script.contains("-I eth1"));
        assert!(artifacts.start_script.contains("-I eth2"));
    }

    #[test]
    fn test_no_enabled_scopes_leaves_fixed_boilerplate() {
        let mut scopes = BTreeMap::new();
        scopes.insert(
            "eth1".to_string(),
            scope(false, "10.0.1.1", "10.0.1.10", "8.8.8.8"),
        );

        let artifacts = generate(&scopes);
        assert_eq!(
            artifacts.options,
            "# PPPoE Server Configuration\nrequire-chap\nlcp-echo-interval 10\nlcp-echo-failure 2\n"
        );
        assert_eq!(
            artifacts.start_script,
            "#!/bin/bash\n# Start PPPoE Servers\n\nkillall pppoe-server 2>/dev/null\n\n"
        );
    }

    #[test]
    fn test_scope_missing_addresses_is_skipped() {
        let mut scopes = BTreeMap::new();
        scopes.insert(
            "eth1".to_string(),
            PppoeScope {
                enabled: true,
                dns: "1.1.1.1".to_string(),
                ..Default::default()
            },
        );
        scopes.insert(
            "eth2".to_string(),
            scope(true, "10.0.2.1", "10.0.2.10", "9.9.9.9"),
        );

        let artifacts = generate(&scopes);
        // No server line for the malformed scope, but being first and
        // enabled it still claims the single DNS slot
        assert!(!artifacts.start_script.contains("eth1"));
        assert_eq!(artifacts.options.matches("ms-dns").count(), 1);
        assert!(artifacts.options.contains("ms-dns 1.1.1.1\n"));
        assert!(artifacts.start_script.contains("-I eth2"));
    }
}
