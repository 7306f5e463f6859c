//! LAN bridge resolution
//!
//! The operator never declares the bridge. Every generation pass derives it
//! again from the LAN-role interfaces: which ports it joins, which address
//! it carries, and which radios reach it through hostapd instead of the
//! network manager.

use crate::settings::{InterfaceSettings, Role};
use std::collections::BTreeMap;

/// The bridge derived from the current network section. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedBridge {
    /// Address of the first LAN member (in name order) that carries one.
    pub address: Option<String>,
    /// Wired LAN ports the network manager joins to the bridge.
    pub members: Vec<String>,
    /// LAN WiFi radios; hostapd attaches these to the bridge itself, so
    /// they must never appear in the bridge's own member list.
    pub ap_members: Vec<String>,
}

impl ResolvedBridge {
    /// True when the topology artifact needs a bridge declaration.
    ///
    /// Wired members alone do not qualify: a member list without an address
    /// or an AP radio describes a bridge nothing would use.
    pub fn is_declared(&self) -> bool {
        self.address.is_some() || !self.ap_members.is_empty()
    }
}

/// Derive the implicit bridge from the network section.
///
/// Candidates are the LAN-role interfaces in map order. The address check
/// runs before AP reclassification, so an AP radio that carries an address
/// competes for the bridge address exactly like a wired port.
pub fn resolve(network: &BTreeMap<String, InterfaceSettings>) -> ResolvedBridge {
    let mut bridge = ResolvedBridge::default();

    for (name, settings) in network {
        if settings.role != Role::Lan {
            continue;
        }

        if bridge.address.is_none() {
            if let Some(address) = settings.static_address() {
                bridge.address = Some(address.to_string());
            }
        }

        if settings.wifi_ssid().is_some() {
            bridge.ap_members.push(name.clone());
        } else {
            bridge.members.push(name.clone());
        }
    }

    bridge
}
