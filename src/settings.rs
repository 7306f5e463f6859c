//! Intent model: the persisted router configuration
//!
//! One JSON document describes the whole desired state of the router in four
//! sections: interface roles (`network`), DHCP scopes (`dhcp`), PPPoE scopes
//! (`pppoe`) and WAN load-balance weights (`loadbalance`). Everything the
//! generators emit is derived from this document alone.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the implicit LAN bridge device.
///
/// The bridge is never declared by the operator; it exists whenever at least
/// one interface carries the LAN role, and scope keys may name it directly.
pub const BRIDGE_NAME: &str = "br0";

/// Default AP channel when the operator leaves it unset.
pub const DEFAULT_CHANNEL: &str = "6";

fn default_lease_seconds() -> u32 {
    86400
}

fn default_pppoe_dns() -> String {
    "8.8.8.8, 8.8.4.4".to_string()
}

fn default_weight() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Role an interface plays in the router topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Wan,
    Lan,
    #[default]
    Unassigned,
}

/// Per-interface settings from the `network` section.
///
/// An empty `address` string is equivalent to no address: "obtain via DHCP"
/// on a WAN port, "the bridge carries the address" on a LAN port.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterfaceSettings {
    #[serde(default)]
    pub role: Role,
    /// Static IPv4 address, with or without a /prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// On a LAN port: the SSID this radio serves as an access point.
    /// On a WAN port: the upstream SSID to join as a station.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    /// WPA2 passphrase; absent with `ssid` set means an open network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psk: Option<String>,
    /// 2.4GHz channel as a string; defaults to [`DEFAULT_CHANNEL`] at
    /// generation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl InterfaceSettings {
    /// The static address, treating an empty string as unset.
    pub fn static_address(&self) -> Option<&str> {
        self.address.as_deref().filter(|s| !s.is_empty())
    }

    /// The SSID, treating an empty string as unset.
    pub fn wifi_ssid(&self) -> Option<&str> {
        self.ssid.as_deref().filter(|s| !s.is_empty())
    }

    /// The passphrase, treating an empty string as unset (open network).
    pub fn wifi_psk(&self) -> Option<&str> {
        self.psk.as_deref().filter(|s| !s.is_empty())
    }

    /// The AP channel, falling back to [`DEFAULT_CHANNEL`].
    pub fn channel_or_default(&self) -> &str {
        self.channel
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CHANNEL)
    }
}

/// A DHCP scope from the `dhcp` section, keyed by interface or bridge name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DhcpScope {
    #[serde(default)]
    pub enabled: bool,
    /// First address handed out; also determines the advertised /24 subnet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_end: Option<String>,
    #[serde(default = "default_lease_seconds")]
    pub lease_seconds: u32,
}

impl Default for DhcpScope {
    fn default() -> Self {
        Self {
            enabled: false,
            range_start: None,
            range_end: None,
            lease_seconds: default_lease_seconds(),
        }
    }
}

/// A PPPoE scope from the `pppoe` section, keyed by interface or bridge name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PppoeScope {
    #[serde(default)]
    pub enabled: bool,
    /// Server-side address of the PPP links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_ip: Option<String>,
    /// First client address; `pppoe-server` allocates upward from here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_start: Option<String>,
    /// Recorded for the operator; the startup script does not pass a pool
    /// size, so only the start address is consumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_end: Option<String>,
    /// DNS servers advertised to clients, comma-separated.
    #[serde(default = "default_pppoe_dns")]
    pub dns: String,
}

impl Default for PppoeScope {
    fn default() -> Self {
        Self {
            enabled: false,
            local_ip: None,
            remote_start: None,
            remote_end: None,
            dns: default_pppoe_dns(),
        }
    }
}

/// A load-balance entry from the `loadbalance` section, keyed by WAN
/// interface name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalanceEntry {
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for LoadBalanceEntry {
    fn default() -> Self {
        Self {
            weight: default_weight(),
            enabled: default_true(),
        }
    }
}

/// The whole intent document.
///
/// Sections are `BTreeMap`s so every iteration is in lexicographic interface
/// order and generation output is deterministic for a given document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub network: BTreeMap<String, InterfaceSettings>,
    #[serde(default)]
    pub dhcp: BTreeMap<String, DhcpScope>,
    #[serde(default)]
    pub pppoe: BTreeMap<String, PppoeScope>,
    #[serde(default)]
    pub loadbalance: BTreeMap<String, LoadBalanceEntry>,
}

impl RouterConfig {
    /// True when at least one interface carries the LAN role, which is what
    /// brings the implicit bridge into existence.
    pub fn has_lan_bridge(&self) -> bool {
        self.network.values().any(|s| s.role == Role::Lan)
    }
}

/// What a DHCP or PPPoE scope key names: a physical interface or the
/// literal bridge device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeTarget {
    Physical(String),
    Bridge,
}

impl ScopeTarget {
    pub fn from_key(key: &str) -> Self {
        if key == BRIDGE_NAME {
            ScopeTarget::Bridge
        } else {
            ScopeTarget::Physical(key.to_string())
        }
    }

    /// Collapse a physical LAN port onto the bridge.
    ///
    /// A scope declared against a port that is absorbed into the bridge must
    /// bind to the bridge device instead; ports with any other role (or
    /// unknown to the network section) stay as declared.
    pub fn resolve(
        self,
        network: &BTreeMap<String, InterfaceSettings>,
        bridge_exists: bool,
    ) -> Self {
        match self {
            ScopeTarget::Physical(name) => {
                let is_lan = network
                    .get(&name)
                    .map(|s| s.role == Role::Lan)
                    .unwrap_or(false);
                if is_lan && bridge_exists {
                    ScopeTarget::Bridge
                } else {
                    ScopeTarget::Physical(name)
                }
            }
            ScopeTarget::Bridge => ScopeTarget::Bridge,
        }
    }

    /// Device name the scope ends up bound to.
    pub fn device(&self) -> &str {
        match self {
            ScopeTarget::Physical(name) => name,
            ScopeTarget::Bridge => BRIDGE_NAME,
        }
    }
}
