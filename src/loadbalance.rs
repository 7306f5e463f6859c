//! Load-balance routing script artifact

use crate::settings::LoadBalanceEntry;
use std::collections::BTreeMap;

/// Policy-routing setup script artifact.
pub const SCRIPT_FILE: &str = "setup_loadbalance.sh";

/// Render the load-balance setup script.
///
/// The flush commands tear down every routing rule on the box, so they stay
/// commented out unless `apply_destructive` is set. With no enabled entry
/// the script is a plain no-op that says so.
pub fn generate(entries: &BTreeMap<String, LoadBalanceEntry>, apply_destructive: bool) -> String {
    let mut script = String::from("#!/bin/bash\n# Load Balancing Setup\n\n");

    let enabled: Vec<(&String, &LoadBalanceEntry)> =
        entries.iter().filter(|(_, entry)| entry.enabled).collect();

    if enabled.is_empty() {
        script.push_str("# No load balancing configured.\n");
        script.push_str("echo 'No load balancing rules to apply.'\n");
        return script;
    }

    if apply_destructive {
        script.push_str("ip rule flush\n");
        script.push_str("ip route flush cache\n\n");
    } else {
        script.push_str("# Note: flush commands disabled; set destructive_routing in the app config to emit them live.\n");
        script.push_str("# ip rule flush\n");
        script.push_str("# ip route flush cache\n\n");
    }

    for (device, entry) in enabled {
        script.push_str(&format!("# Interface {} weight {}\n", device, entry.weight));
    }

    script
}
