//! Intent document persistence and artifact regeneration
//!
//! The store owns the load/store pair for the intent document. There is no
//! partial persistence: every successful store rewrites the whole document
//! and regenerates all artifacts, so the artifact set always matches the
//! stored document. Files are written to a temporary sibling and renamed
//! into place so a concurrent reader never sees a half-written file.

use crate::bridge;
use crate::config::AppConfig;
use crate::dhcp;
use crate::error::{RoutergenError, RoutergenResult};
use crate::hostapd;
use crate::loadbalance;
use crate::netplan;
use crate::pppoe;
use crate::settings::{
    DhcpScope, InterfaceSettings, LoadBalanceEntry, PppoeScope, Role, RouterConfig,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub struct ConfigStore {
    settings_file: PathBuf,
    output_dir: PathBuf,
    destructive_routing: bool,
}

impl ConfigStore {
    pub fn new(settings_file: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            settings_file,
            output_dir,
            destructive_routing: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            settings_file: config.paths.settings_file.clone(),
            output_dir: config.paths.output_dir.clone(),
            destructive_routing: config.generate.destructive_routing,
        }
    }

    /// Emit live flush commands in the load-balance artifact.
    pub fn with_destructive_routing(mut self, destructive: bool) -> Self {
        self.destructive_routing = destructive;
        self
    }

    /// Load the intent document. A missing file is an empty configuration;
    /// an unreadable or unparsable one is an error.
    pub async fn load(&self) -> RoutergenResult<RouterConfig> {
        match fs::read_to_string(&self.settings_file).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RouterConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the document and regenerate every artifact.
    pub async fn store(&self, config: &RouterConfig) -> RoutergenResult<()> {
        if let Some(parent) = self.settings_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let document = serde_json::to_string_pretty(config)?;
        write_atomic(&self.settings_file, &document).await?;
        info!("Stored intent document {}", self.settings_file.display());

        self.regenerate(config).await
    }

    /// Regenerate all artifacts from the given document. Artifacts are
    /// always rewritten as a set; any write error aborts the pass.
    pub async fn regenerate(&self, config: &RouterConfig) -> RoutergenResult<()> {
        fs::create_dir_all(&self.output_dir).await?;

        let bridge = bridge::resolve(&config.network);
        debug!(
            members = bridge.members.len(),
            ap_members = bridge.ap_members.len(),
            address = bridge.address.as_deref().unwrap_or("-"),
            "Resolved bridge"
        );

        let topology = netplan::generate(&config.network, &bridge)?;
        self.write_artifact(netplan::NETPLAN_FILE, &topology).await?;

        self.write_artifact(hostapd::HOSTAPD_FILE, &hostapd::generate(&config.network))
            .await?;

        self.write_artifact(dhcp::DHCPD_FILE, &dhcp::generate_dhcpd(&config.dhcp))
            .await?;
        let defaults =
            dhcp::generate_defaults(&config.dhcp, &config.network, config.has_lan_bridge());
        self.write_artifact(dhcp::DEFAULTS_FILE, &defaults).await?;

        let ppp = pppoe::generate(&config.pppoe);
        self.write_artifact(pppoe::OPTIONS_FILE, &ppp.options).await?;
        self.write_artifact(pppoe::SCRIPT_FILE, &ppp.start_script).await?;

        let lb = loadbalance::generate(&config.loadbalance, self.destructive_routing);
        self.write_artifact(loadbalance::SCRIPT_FILE, &lb).await?;

        info!("Regenerated artifacts in {}", self.output_dir.display());
        Ok(())
    }

    /// Upsert one interface's settings and persist.
    ///
    /// Assigning the WAN role drops any DHCP scope keyed by that interface:
    /// a WAN port never carries server-side DHCP settings.
    pub async fn set_interface(
        &self,
        name: &str,
        settings: InterfaceSettings,
    ) -> RoutergenResult<()> {
        let mut config = self.load().await?;
        if settings.role == Role::Wan {
            if config.dhcp.remove(name).is_some() {
                info!("Dropped DHCP scope for {} on WAN assignment", name);
            }
        }
        config.network.insert(name.to_string(), settings);
        self.store(&config).await
    }

    /// Remove one interface from the network section and persist.
    pub async fn remove_interface(&self, name: &str) -> RoutergenResult<()> {
        let mut config = self.load().await?;
        config.network.remove(name);
        self.store(&config).await
    }

    /// Upsert a DHCP scope. The key may be a physical interface or the
    /// bridge, but never a WAN port.
    pub async fn set_dhcp_scope(&self, key: &str, scope: DhcpScope) -> RoutergenResult<()> {
        let mut config = self.load().await?;
        if let Some(settings) = config.network.get(key) {
            if settings.role == Role::Wan {
                return Err(RoutergenError::InvalidParameter(format!(
                    "{} is a WAN interface and cannot serve DHCP",
                    key
                )));
            }
        }
        config.dhcp.insert(key.to_string(), scope);
        self.store(&config).await
    }

    /// Upsert a PPPoE scope, keyed by a physical interface or the bridge.
    pub async fn set_pppoe_scope(&self, key: &str, scope: PppoeScope) -> RoutergenResult<()> {
        let mut config = self.load().await?;
        config.pppoe.insert(key.to_string(), scope);
        self.store(&config).await
    }

    /// Upsert a load-balance entry. Only configured WAN interfaces qualify.
    pub async fn set_loadbalance_entry(
        &self,
        name: &str,
        entry: LoadBalanceEntry,
    ) -> RoutergenResult<()> {
        let mut config = self.load().await?;
        match config.network.get(name) {
            None => return Err(RoutergenError::InterfaceNotFound(name.to_string())),
            Some(settings) if settings.role != Role::Wan => {
                return Err(RoutergenError::InvalidParameter(format!(
                    "{} is not a WAN interface",
                    name
                )));
            }
            Some(_) => {}
        }
        config.loadbalance.insert(name.to_string(), entry);
        self.store(&config).await
    }

    async fn write_artifact(&self, name: &str, contents: &str) -> RoutergenResult<()> {
        let path = self.output_dir.join(name);
        write_atomic(&path, contents).await?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Write via a temporary sibling plus rename, staying on one filesystem.
async fn write_atomic(path: &Path, contents: &str) -> RoutergenResult<()> {
    let tmp = temp_path(path)?;
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

fn temp_path(path: &Path) -> RoutergenResult<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        RoutergenError::InvalidParameter(format!("Invalid artifact path: {}", path.display()))
    })?;
    let mut tmp = OsString::from(".");
    tmp.push(name);
    tmp.push(".tmp");
    Ok(path.with_file_name(tmp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(
            dir.path().join("config/settings.json"),
            dir.path().join("generated"),
        )
    }

    fn read(dir: &TempDir, artifact: &str) -> String {
        std::fs::read_to_string(dir.path().join("generated").join(artifact)).unwrap()
    }

    fn fixture() -> RouterConfig {
        let mut config = RouterConfig::default();
        config.network.insert(
            "eth0".to_string(),
            InterfaceSettings {
                role: Role::Wan,
                ..Default::default()
            },
        );
        config.network.insert(
            "eth1".to_string(),
            InterfaceSettings {
                role: Role::Lan,
                address: Some("192.168.172.1".to_string()),
                ..Default::default()
            },
        );
        config.network.insert(
            "eth2".to_string(),
            InterfaceSettings {
                role: Role::Lan,
                ..Default::default()
            },
        );
        config.network.insert(
            "wlan0".to_string(),
            InterfaceSettings {
                role: Role::Lan,
                ssid: Some("test_wifi".to_string()),
                psk: Some("password".to_string()),
                ..Default::default()
            },
        );
        config.dhcp.insert(
            "br0".to_string(),
            DhcpScope {
                enabled: true,
                range_start: Some("192.168.172.100".to_string()),
                range_end: Some("192.168.172.200".to_string()),
                ..Default::default()
            },
        );
        config.dhcp.insert("eth1".to_string(), DhcpScope::default());
        config.pppoe.insert(
            "br0".to_string(),
            PppoeScope {
                enabled: true,
                local_ip: Some("192.168.172.1".to_string()),
                remote_start: Some("192.168.172.210".to_string()),
                remote_end: Some("192.168.172.250".to_string()),
                dns: "8.8.8.8".to_string(),
            },
        );
        config
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty_config() {
        let dir = TempDir::new().unwrap();
        let config = store_in(&dir).load().await.unwrap();
        assert!(config.network.is_empty());
        assert!(config.dhcp.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        std::fs::write(dir.path().join("config/settings.json"), "{not json").unwrap();

        match store.load().await {
            Err(RoutergenError::ParseError(_)) => {}
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_store_writes_document_and_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.store(&fixture()).await.unwrap();

        assert!(dir.path().join("config/settings.json").exists());
        for artifact in [
            netplan::NETPLAN_FILE,
            hostapd::HOSTAPD_FILE,
            dhcp::DHCPD_FILE,
            dhcp::DEFAULTS_FILE,
            pppoe::OPTIONS_FILE,
            pppoe::SCRIPT_FILE,
            loadbalance::SCRIPT_FILE,
        ] {
            assert!(
                dir.path().join("generated").join(artifact).exists(),
                "missing artifact {}",
                artifact
            );
        }

        // No temp files left behind
        for entry in std::fs::read_dir(dir.path().join("generated")).unwrap() {
            let name = entry.unwrap().file_name();
            assert!(!name.to_string_lossy().ends_with(".tmp"));
        }
    }

    #[tokio::test]
    async fn test_store_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.store(&fixture()).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.network.len(), 4);
        assert_eq!(loaded.network["eth1"].role, Role::Lan);
        assert!(loaded.dhcp["br0"].enabled);
        assert_eq!(loaded.pppoe["br0"].dns, "8.8.8.8");
    }

    #[tokio::test]
    async fn test_regeneration_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let config = fixture();

        store.store(&config).await.unwrap();
        let first: Vec<String> = [
            netplan::NETPLAN_FILE,
            hostapd::HOSTAPD_FILE,
            dhcp::DHCPD_FILE,
            dhcp::DEFAULTS_FILE,
            pppoe::OPTIONS_FILE,
            pppoe::SCRIPT_FILE,
            loadbalance::SCRIPT_FILE,
        ]
        .iter()
        .map(|a| read(&dir, a))
        .collect();

        store.regenerate(&config).await.unwrap();
        let second: Vec<String> = [
            netplan::NETPLAN_FILE,
            hostapd::HOSTAPD_FILE,
            dhcp::DHCPD_FILE,
            dhcp::DEFAULTS_FILE,
            pppoe::OPTIONS_FILE,
            pppoe::SCRIPT_FILE,
            loadbalance::SCRIPT_FILE,
        ]
        .iter()
        .map(|a| read(&dir, a))
        .collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fixture_produces_aliased_bindings_and_ap_stanza() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.store(&fixture()).await.unwrap();

        // Bindings: the bridge-keyed scope is honored, eth1's disabled one
        // contributes nothing
        assert_eq!(
            read(&dir, dhcp::DEFAULTS_FILE),
            "INTERFACESv4=\"br0\"\nINTERFACESv6=\"\"\n"
        );

        let dhcpd = read(&dir, dhcp::DHCPD_FILE);
        assert!(dhcpd.contains("subnet 192.168.172.0 netmask 255.255.255.0 {"));
        assert!(dhcpd.contains("option routers 192.168.172.1;"));

        let hostapd_conf = read(&dir, hostapd::HOSTAPD_FILE);
        assert!(hostapd_conf.contains("interface=wlan0"));
        assert!(hostapd_conf.contains("wpa_passphrase=password"));

        let topology = read(&dir, netplan::NETPLAN_FILE);
        assert!(topology.contains("\"eth1\""));
        assert!(topology.contains("192.168.172.1/24"));

        let options = read(&dir, pppoe::OPTIONS_FILE);
        assert_eq!(options.matches("ms-dns").count(), 1);
        assert!(options.contains("ms-dns 8.8.8.8\n"));
    }

    #[tokio::test]
    async fn test_set_interface_with_wan_role_drops_its_dhcp_scope() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut config = RouterConfig::default();
        config.network.insert(
            "eth1".to_string(),
            InterfaceSettings {
                role: Role::Lan,
                ..Default::default()
            },
        );
        config.dhcp.insert(
            "eth1".to_string(),
            DhcpScope {
                enabled: true,
                range_start: Some("192.168.1.10".to_string()),
                range_end: Some("192.168.1.100".to_string()),
                ..Default::default()
            },
        );
        store.store(&config).await.unwrap();

        store
            .set_interface(
                "eth1",
                InterfaceSettings {
                    role: Role::Wan,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.network["eth1"].role, Role::Wan);
        assert!(loaded.dhcp.is_empty());
    }

    #[tokio::test]
    async fn test_set_dhcp_scope_rejects_wan_keys() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .set_interface(
                "eth0",
                InterfaceSettings {
                    role: Role::Wan,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = store.set_dhcp_scope("eth0", DhcpScope::default()).await;
        assert!(matches!(result, Err(RoutergenError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_set_loadbalance_entry_requires_wan_role() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .set_interface(
                "eth1",
                InterfaceSettings {
                    role: Role::Lan,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let unknown = store
            .set_loadbalance_entry("eth9", LoadBalanceEntry::default())
            .await;
        assert!(matches!(unknown, Err(RoutergenError::InterfaceNotFound(_))));

        let lan = store
            .set_loadbalance_entry("eth1", LoadBalanceEntry::default())
            .await;
        assert!(matches!(lan, Err(RoutergenError::InvalidParameter(_))));

        store
            .set_interface(
                "eth0",
                InterfaceSettings {
                    role: Role::Wan,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .set_loadbalance_entry("eth0", LoadBalanceEntry { weight: 3, enabled: true })
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.loadbalance["eth0"].weight, 3);
    }

    #[tokio::test]
    async fn test_destructive_routing_changes_loadbalance_artifact() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).with_destructive_routing(true);

        let mut config = RouterConfig::default();
        config.network.insert(
            "eth0".to_string(),
            InterfaceSettings {
                role: Role::Wan,
                ..Default::default()
            },
        );
        config
            .loadbalance
            .insert("eth0".to_string(), LoadBalanceEntry::default());
        store.store(&config).await.unwrap();

        let script = read(&dir, loadbalance::SCRIPT_FILE);
        assert!(script.contains("\nip rule flush\n"));
    }
}
