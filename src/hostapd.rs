//! Access-point daemon artifact (hostapd.conf)
//!
//! One stanza per LAN-role radio with an SSID. hostapd owns the AP side of
//! the bridge: it puts the radio into master mode and attaches it to the
//! bridge device, which is why these radios never appear in the bridge's own
//! member list in the topology artifact.

use crate::settings::{InterfaceSettings, Role, BRIDGE_NAME};
use std::collections::BTreeMap;

/// Artifact file name.
pub const HOSTAPD_FILE: &str = "hostapd.conf";

/// Render the hostapd config. Zero AP radios yields an empty (valid) file.
pub fn generate(network: &BTreeMap<String, InterfaceSettings>) -> String {
    let mut conf = String::new();

    for (name, settings) in network {
        if settings.role != Role::Lan {
            continue;
        }
        let ssid = match settings.wifi_ssid() {
            Some(ssid) => ssid,
            None => continue,
        };

        conf.push_str(&format!("interface={}\n", name));
        conf.push_str(&format!("bridge={}\n", BRIDGE_NAME));
        conf.push_str("driver=nl80211\n");
        conf.push_str(&format!("ssid={}\n", ssid));
        conf.push_str("hw_mode=g\n");
        conf.push_str(&format!("channel={}\n", settings.channel_or_default()));

        match settings.wifi_psk() {
            Some(psk) => {
                conf.push_str("wpa=2\n");
                conf.push_str(&format!("wpa_passphrase={}\n", psk));
                conf.push_str("wpa_key_mgmt=WPA-PSK\n");
                conf.push_str("rsn_pairwise=CCMP\n");
            }
            None => {
                conf.push_str("# Open Security (No WPA/WPA2)\n");
            }
        }

        conf.push('\n');
    }

    conf
}
