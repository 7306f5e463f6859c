//! Interface/bridge topology artifact (netplan)
//!
//! Renders the netplan document for the declared roles and the resolved
//! bridge. The body is pretty-printed JSON under a comment header: JSON is a
//! YAML subset, so netplan consumes the file unchanged and we keep a typed
//! document model on our side.

use crate::bridge::ResolvedBridge;
use crate::error::RoutergenResult;
use crate::settings::{InterfaceSettings, Role, BRIDGE_NAME};
use serde::Serialize;
use std::collections::BTreeMap;

/// Artifact file name, picked up from the netplan config directory.
pub const NETPLAN_FILE: &str = "01-netcfg.yaml";

const FILE_HEADER: &str = "# This file is generated by routergen";

#[derive(Debug, Serialize)]
struct NetplanDocument {
    network: NetworkSection,
}

#[derive(Debug, Serialize)]
struct NetworkSection {
    version: u8,
    renderer: &'static str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    ethernets: BTreeMap<String, DeviceEntry>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    wifis: BTreeMap<String, DeviceEntry>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    bridges: BTreeMap<String, BridgeEntry>,
}

/// One entry under `ethernets` or `wifis`.
#[derive(Debug, Default, Serialize)]
struct DeviceEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    addresses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dhcp4: Option<bool>,
    #[serde(rename = "access-points", skip_serializing_if = "Option::is_none")]
    access_points: Option<BTreeMap<String, AccessPointEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    optional: Option<bool>,
}

#[derive(Debug, Serialize)]
struct AccessPointEntry {
    password: String,
}

#[derive(Debug, Serialize)]
struct BridgeEntry {
    interfaces: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    addresses: Option<Vec<String>>,
    parameters: BridgeParameters,
    dhcp4: bool,
    optional: bool,
}

#[derive(Debug, Serialize)]
struct BridgeParameters {
    stp: bool,
    #[serde(rename = "forward-delay")]
    forward_delay: u32,
}

/// Netplan wants prefixed addresses; a bare IPv4 is assumed /24.
fn ensure_prefix(address: &str) -> String {
    if address.contains('/') {
        address.to_string()
    } else {
        format!("{}/24", address)
    }
}

/// Render the topology document for the given network section and bridge.
pub fn generate(
    network: &BTreeMap<String, InterfaceSettings>,
    bridge: &ResolvedBridge,
) -> RoutergenResult<String> {
    let mut ethernets = BTreeMap::new();
    let mut wifis = BTreeMap::new();

    for (name, settings) in network {
        let mut entry = DeviceEntry::default();

        match settings.role {
            Role::Wan => {
                if let Some(address) = settings.static_address() {
                    entry.addresses = Some(vec![ensure_prefix(address)]);
                    entry.dhcp4 = Some(false);
                } else {
                    entry.dhcp4 = Some(true);
                }

                // WiFi client: join the upstream SSID as a station
                if let (Some(ssid), Some(psk)) = (settings.wifi_ssid(), settings.wifi_psk()) {
                    let mut points = BTreeMap::new();
                    points.insert(
                        ssid.to_string(),
                        AccessPointEntry {
                            password: psk.to_string(),
                        },
                    );
                    entry.access_points = Some(points);
                    wifis.insert(name.clone(), entry);
                    continue;
                }
            }
            Role::Lan => {
                // Addressing lives on the bridge
                entry.dhcp4 = Some(false);
            }
            Role::Unassigned => {}
        }

        // Never block boot on an absent port
        entry.optional = Some(true);

        if settings.wifi_ssid().is_some() {
            // AP radios still need netplan to bring the link up; hostapd
            // attaches them to the bridge afterwards.
            wifis.insert(name.clone(), entry);
        } else {
            ethernets.insert(name.clone(), entry);
        }
    }

    let mut bridges = BTreeMap::new();
    if bridge.is_declared() {
        bridges.insert(
            BRIDGE_NAME.to_string(),
            BridgeEntry {
                interfaces: bridge.members.clone(),
                addresses: bridge
                    .address
                    .as_deref()
                    .map(|address| vec![ensure_prefix(address)]),
                parameters: BridgeParameters {
                    stp: false,
                    forward_delay: 0,
                },
                dhcp4: false,
                optional: true,
            },
        );
    }

    let document = NetplanDocument {
        network: NetworkSection {
            version: 2,
            renderer: "networkd",
            ethernets,
            wifis,
            bridges,
        },
    };

    let body = serde_json::to_string_pretty(&document)?;
    Ok(format!("{}\n{}\n", FILE_HEADER, body))
}
