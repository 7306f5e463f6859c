//! Interface discovery
//!
//! Produces the detected-interface records shown to the operator when
//! assigning roles. Uses sysfs plus the `ip` command; the generators never
//! look here, they see only the intent document.

use crate::error::{RoutergenError, RoutergenResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressFamily {
    #[serde(rename = "IPv4")]
    V4,
    #[serde(rename = "IPv6")]
    V6,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredAddress {
    pub family: AddressFamily,
    pub address: String,
    /// Dotted-quad netmask, IPv4 only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broadcast: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredInterface {
    pub name: String,
    pub is_up: bool,
    /// Link speed from sysfs; absent when the kernel reports none (down
    /// links, virtual devices, WiFi radios).
    pub speed_mbps: Option<u32>,
    pub mtu: Option<u32>,
    pub is_wireless: bool,
    pub addresses: Vec<DiscoveredAddress>,
}

/// Enumerate all network interfaces, sorted by name.
pub async fn discover() -> RoutergenResult<Vec<DiscoveredInterface>> {
    let net_path = Path::new("/sys/class/net");

    if !net_path.exists() {
        return Err(RoutergenError::NotSupported(
            "/sys/class/net not available".to_string(),
        ));
    }

    let mut names = Vec::new();
    let mut entries = fs::read_dir(net_path).await?;
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();

    // One `ip` invocation covers every interface; a failure degrades to
    // empty address lists rather than hiding the interfaces themselves.
    let addr_map = match ip_addr_show().await.and_then(|raw| parse_ip_addr_json(&raw)) {
        Ok(map) => map,
        Err(e) => {
            warn!("Address discovery failed: {}", e);
            BTreeMap::new()
        }
    };

    let mut interfaces = Vec::with_capacity(names.len());
    for name in names {
        let is_up = matches!(
            read_sysfs_string(&name, "operstate").await.as_deref(),
            Some("up")
        );
        let is_wireless = Path::new(&format!("/sys/class/net/{}/wireless", name)).exists();
        let addresses = addr_map.get(&name).cloned().unwrap_or_default();

        interfaces.push(DiscoveredInterface {
            is_up,
            speed_mbps: read_speed_mbps(&name).await,
            mtu: read_sysfs_u32(&name, "mtu").await,
            is_wireless,
            addresses,
            name,
        });
    }

    Ok(interfaces)
}

async fn ip_addr_show() -> RoutergenResult<String> {
    let output = Command::new("ip")
        .args(["-json", "addr", "show"])
        .output()
        .await
        .map_err(|e| RoutergenError::CommandFailed {
            cmd: "ip -json addr show".to_string(),
            code: None,
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(RoutergenError::CommandFailed {
            cmd: "ip -json addr show".to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    String::from_utf8(output.stdout)
        .map_err(|e| RoutergenError::ParseError(format!("Invalid UTF-8 in JSON output: {}", e)))
}

/// Parse `ip -json addr show` output into per-interface address lists.
fn parse_ip_addr_json(
    json_str: &str,
) -> RoutergenResult<BTreeMap<String, Vec<DiscoveredAddress>>> {
    let json: serde_json::Value = serde_json::from_str(json_str)?;
    let mut map = BTreeMap::new();

    let entries = match json.as_array() {
        Some(entries) => entries,
        None => return Ok(map),
    };

    for iface in entries {
        let name = match iface.get("ifname").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => continue,
        };

        let mut addresses = Vec::new();
        if let Some(addr_info) = iface.get("addr_info").and_then(|v| v.as_array()) {
            for addr in addr_info {
                let (local, family) = match (
                    addr.get("local").and_then(|v| v.as_str()),
                    addr.get("family").and_then(|v| v.as_str()),
                ) {
                    (Some(local), Some(family)) => (local, family),
                    _ => continue,
                };
                let family = match family {
                    "inet" => AddressFamily::V4,
                    "inet6" => AddressFamily::V6,
                    _ => continue,
                };
                let netmask = match (family, addr.get("prefixlen").and_then(|v| v.as_u64())) {
                    (AddressFamily::V4, Some(prefix)) => Some(prefix_to_netmask(prefix as u8)),
                    _ => None,
                };
                addresses.push(DiscoveredAddress {
                    family,
                    address: local.to_string(),
                    netmask,
                    broadcast: addr
                        .get("broadcast")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                });
            }
        }

        map.insert(name.to_string(), addresses);
    }

    Ok(map)
}

/// Dotted-quad netmask for an IPv4 prefix length.
fn prefix_to_netmask(prefix: u8) -> String {
    let prefix = prefix.min(32) as u32;
    let mask: u32 = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    };
    let octets = mask.to_be_bytes();
    format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
}

async fn read_sysfs_string(interface: &str, file: &str) -> Option<String> {
    let path = format!("/sys/class/net/{}/{}", interface, file);
    fs::read_to_string(path).await.ok().map(|s| s.trim().to_string())
}

async fn read_sysfs_u32(interface: &str, file: &str) -> Option<u32> {
    read_sysfs_string(interface, file).await?.parse().ok()
}

async fn read_speed_mbps(interface: &str) -> Option<u32> {
    // sysfs reports -1 for links without a negotiated speed
    let raw = read_sysfs_string(interface, "speed").await?;
    raw.parse::<i64>().ok().filter(|v| *v > 0).map(|v| v as u32)
}
