//! routergen - Router Configuration Generator
//!
//! Compiles one operator-edited intent document (interface roles, DHCP and
//! PPPoE scopes, WAN load-balance weights) into the full set of system
//! config artifacts a router host needs:
//! - netplan topology (wired ports, WiFi radios, the implicit LAN bridge)
//! - hostapd access-point configuration
//! - ISC DHCP server configuration and its listen-interface defaults file
//! - PPPoE server options file and startup script
//! - load-balance routing script
//!
//! Every store of the intent document regenerates every artifact, so the
//! artifact set on disk always describes a single consistent document.

pub mod error;
pub mod validation;
pub mod settings;
pub mod bridge;
pub mod netplan;
pub mod hostapd;
pub mod dhcp;
pub mod pppoe;
pub mod loadbalance;
pub mod config;
pub mod store;
pub mod discovery;

// Re-export commonly used types
pub use error::{RoutergenError, RoutergenResult};
pub use settings::{
    DhcpScope, InterfaceSettings, LoadBalanceEntry, PppoeScope, Role, RouterConfig, ScopeTarget,
    BRIDGE_NAME,
};
pub use bridge::ResolvedBridge;
pub use config::AppConfig;
pub use store::ConfigStore;
pub use pppoe::PppoeArtifacts;
pub use discovery::{AddressFamily, DiscoveredAddress, DiscoveredInterface};
