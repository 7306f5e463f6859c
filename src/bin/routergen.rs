//! routergen - Router configuration generator
//!
//! Edits the router intent document one entry at a time and recompiles the
//! full artifact set (netplan topology, hostapd, dhcpd, PPPoE and load
//! balancing scripts) after every successful edit, so the generated files
//! always match the stored document.
//!
//! # Usage
//!
//! ```bash
//! # Inspect the machine
//! routergen interfaces
//!
//! # Declare roles
//! routergen set-interface eth0 --role wan
//! routergen set-interface eth1 --role lan --address 192.168.172.1
//! routergen set-interface wlan0 --role lan --ssid home_net --psk secret123
//!
//! # Serve DHCP on the LAN bridge
//! routergen set-dhcp br0 --start 192.168.172.100 --end 192.168.172.200
//!
//! # Recompile without editing
//! routergen generate
//! ```

use clap::{Parser, Subcommand};
use libroutergen::config::AppConfig;
use libroutergen::discovery;
use libroutergen::error::{RoutergenError, RoutergenResult};
use libroutergen::settings::{DhcpScope, InterfaceSettings, LoadBalanceEntry, PppoeScope, Role};
use libroutergen::store::ConfigStore;
use libroutergen::validation;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "routergen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Router configuration generator - compile interface roles into service configs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Application config file (TOML)
    #[arg(short, long, default_value = "routergen.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List network interfaces present on this machine
    Interfaces {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the stored intent document
    Show,
    /// Recompile all artifacts from the stored document
    Generate,
    /// Assign a role and radio settings to an interface
    SetInterface {
        /// Interface name (eth0, wlan0, ...)
        interface: String,
        /// Role: wan, lan, or unassigned
        #[arg(long)]
        role: String,
        /// Static IPv4 address, with or without a /prefix
        #[arg(long)]
        address: Option<String>,
        /// SSID to serve (LAN port) or join upstream (WAN port)
        #[arg(long)]
        ssid: Option<String>,
        /// WPA2 passphrase; omit for an open network
        #[arg(long)]
        psk: Option<String>,
        /// 2.4GHz channel (1-13)
        #[arg(long)]
        channel: Option<String>,
    },
    /// Remove an interface from the intent document
    RemoveInterface {
        /// Interface name
        interface: String,
    },
    /// Configure a DHCP scope on a LAN interface or the bridge
    SetDhcp {
        /// Scope key: a LAN interface or the bridge (br0)
        key: String,
        /// First address of the pool; also fixes the advertised /24 subnet
        #[arg(long)]
        start: Option<String>,
        /// Last address of the pool
        #[arg(long)]
        end: Option<String>,
        /// Lease time in seconds
        #[arg(long, default_value_t = 86400)]
        lease: u32,
        /// Keep the scope but stop serving it
        #[arg(long)]
        disabled: bool,
    },
    /// Configure a PPPoE server scope on an interface or the bridge
    SetPppoe {
        /// Scope key: an interface or the bridge (br0)
        key: String,
        /// Server-side address of the PPP links
        #[arg(long)]
        local_ip: Option<String>,
        /// First client address
        #[arg(long)]
        remote_start: Option<String>,
        /// Last client address
        #[arg(long)]
        remote_end: Option<String>,
        /// DNS servers advertised to clients, comma-separated
        #[arg(long)]
        dns: Option<String>,
        /// Keep the scope but stop serving it
        #[arg(long)]
        disabled: bool,
    },
    /// Weight a WAN interface for multipath load balancing
    SetLoadbalance {
        /// WAN interface name
        interface: String,
        /// Nexthop weight
        #[arg(long, default_value_t = 1)]
        weight: u32,
        /// Keep the entry but exclude it from the route
        #[arg(long)]
        disabled: bool,
    },
}

fn init_logging(cli: &Cli) {
    let log_level = if cli.verbose {
        "debug"
    } else {
        &cli.log_level
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "routergen={},libroutergen={}",
            log_level, log_level
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> RoutergenResult<()> {
    let app_config = if cli.config.exists() {
        AppConfig::load(&cli.config)?
    } else {
        AppConfig::default()
    };
    app_config.ensure_directories()?;
    let store = ConfigStore::from_config(&app_config);

    match &cli.command {
        Some(Commands::Interfaces { json }) => handle_interfaces(*json).await,
        None | Some(Commands::Show) => handle_show(&store).await,
        Some(Commands::Generate) => handle_generate(&store, &app_config).await,
        Some(Commands::SetInterface {
            interface,
            role,
            address,
            ssid,
            psk,
            channel,
        }) => {
            handle_set_interface(
                &store,
                interface,
                role,
                address.as_deref(),
                ssid.as_deref(),
                psk.as_deref(),
                channel.as_deref(),
            )
            .await
        }
        Some(Commands::RemoveInterface { interface }) => {
            handle_remove_interface(&store, interface).await
        }
        Some(Commands::SetDhcp {
            key,
            start,
            end,
            lease,
            disabled,
        }) => {
            handle_set_dhcp(
                &store,
                key,
                start.as_deref(),
                end.as_deref(),
                *lease,
                *disabled,
            )
            .await
        }
        Some(Commands::SetPppoe {
            key,
            local_ip,
            remote_start,
            remote_end,
            dns,
            disabled,
        }) => {
            handle_set_pppoe(
                &store,
                key,
                local_ip.as_deref(),
                remote_start.as_deref(),
                remote_end.as_deref(),
                dns.as_deref(),
                *disabled,
            )
            .await
        }
        Some(Commands::SetLoadbalance {
            interface,
            weight,
            disabled,
        }) => handle_set_loadbalance(&store, interface, *weight, *disabled).await,
    }
}

fn parse_role(role: &str) -> RoutergenResult<Role> {
    match role.to_ascii_lowercase().as_str() {
        "wan" => Ok(Role::Wan),
        "lan" => Ok(Role::Lan),
        "unassigned" => Ok(Role::Unassigned),
        other => Err(RoutergenError::InvalidParameter(format!(
            "Unknown role '{}' (expected wan, lan, or unassigned)",
            other
        ))),
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Wan => "wan",
        Role::Lan => "lan",
        Role::Unassigned => "unassigned",
    }
}

async fn handle_interfaces(json: bool) -> RoutergenResult<()> {
    let interfaces = discovery::discover().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&interfaces)?);
        return Ok(());
    }

    println!(
        "{:16} {:6} {:9} {:>10} {:>6}",
        "DEVICE", "STATE", "TYPE", "SPEED", "MTU"
    );
    for iface in &interfaces {
        let state = if iface.is_up { "up" } else { "down" };
        let kind = if iface.is_wireless { "wifi" } else { "ethernet" };
        let speed = match iface.speed_mbps {
            Some(mbps) => format!("{} Mb/s", mbps),
            None => "--".to_string(),
        };
        let mtu = match iface.mtu {
            Some(mtu) => mtu.to_string(),
            None => "--".to_string(),
        };
        println!(
            "{:16} {:6} {:9} {:>10} {:>6}",
            iface.name, state, kind, speed, mtu
        );
        for addr in &iface.addresses {
            println!("    {}", addr.address);
        }
    }
    Ok(())
}

async fn handle_show(store: &ConfigStore) -> RoutergenResult<()> {
    let config = store.load().await?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn handle_generate(store: &ConfigStore, app_config: &AppConfig) -> RoutergenResult<()> {
    let config = store.load().await?;
    store.regenerate(&config).await?;
    println!("Artifacts written to {}", app_config.paths.output_dir.display());
    Ok(())
}

async fn handle_set_interface(
    store: &ConfigStore,
    interface: &str,
    role: &str,
    address: Option<&str>,
    ssid: Option<&str>,
    psk: Option<&str>,
    channel: Option<&str>,
) -> RoutergenResult<()> {
    validation::validate_interface_name(interface)?;
    let role = parse_role(role)?;
    if let Some(address) = address {
        validation::validate_address(address)?;
    }
    if let Some(ssid) = ssid {
        validation::validate_ssid(ssid)?;
    }
    if let Some(psk) = psk {
        if ssid.is_none() {
            return Err(RoutergenError::InvalidParameter(
                "A passphrase requires an SSID".to_string(),
            ));
        }
        validation::validate_wifi_password(psk)?;
    }
    if let Some(channel) = channel {
        validation::validate_channel(channel)?;
    }

    let settings = InterfaceSettings {
        role,
        address: address.map(str::to_string),
        ssid: ssid.map(str::to_string),
        psk: psk.map(str::to_string),
        channel: channel.map(str::to_string),
    };
    store.set_interface(interface, settings).await?;
    println!("Interface {} set to {}", interface, role_name(role));
    Ok(())
}

async fn handle_remove_interface(store: &ConfigStore, interface: &str) -> RoutergenResult<()> {
    validation::validate_interface_name(interface)?;
    store.remove_interface(interface).await?;
    println!("Interface {} removed", interface);
    Ok(())
}

async fn handle_set_dhcp(
    store: &ConfigStore,
    key: &str,
    start: Option<&str>,
    end: Option<&str>,
    lease: u32,
    disabled: bool,
) -> RoutergenResult<()> {
    validation::validate_interface_name(key)?;
    if let Some(start) = start {
        validation::validate_ipv4(start)?;
    }
    if let Some(end) = end {
        validation::validate_ipv4(end)?;
    }

    let scope = DhcpScope {
        enabled: !disabled,
        range_start: start.map(str::to_string),
        range_end: end.map(str::to_string),
        lease_seconds: lease,
    };
    store.set_dhcp_scope(key, scope).await?;
    println!("DHCP scope for {} updated", key);
    Ok(())
}

async fn handle_set_pppoe(
    store: &ConfigStore,
    key: &str,
    local_ip: Option<&str>,
    remote_start: Option<&str>,
    remote_end: Option<&str>,
    dns: Option<&str>,
    disabled: bool,
) -> RoutergenResult<()> {
    validation::validate_interface_name(key)?;
    if let Some(local_ip) = local_ip {
        validation::validate_ipv4(local_ip)?;
    }
    if let Some(remote_start) = remote_start {
        validation::validate_ipv4(remote_start)?;
    }
    if let Some(remote_end) = remote_end {
        validation::validate_ipv4(remote_end)?;
    }
    if let Some(dns) = dns {
        for server in dns.split(',') {
            validation::validate_ipv4(server.trim())?;
        }
    }

    let mut scope = PppoeScope {
        enabled: !disabled,
        local_ip: local_ip.map(str::to_string),
        remote_start: remote_start.map(str::to_string),
        remote_end: remote_end.map(str::to_string),
        ..Default::default()
    };
    if let Some(dns) = dns {
        scope.dns = dns.to_string();
    }
    store.set_pppoe_scope(key, scope).await?;
    println!("PPPoE scope for {} updated", key);
    Ok(())
}

async fn handle_set_loadbalance(
    store: &ConfigStore,
    interface: &str,
    weight: u32,
    disabled: bool,
) -> RoutergenResult<()> {
    validation::validate_interface_name(interface)?;
    if weight == 0 {
        return Err(RoutergenError::InvalidParameter(
            "Weight must be at least 1".to_string(),
        ));
    }

    store
        .set_loadbalance_entry(
            interface,
            LoadBalanceEntry {
                weight,
                enabled: !disabled,
            },
        )
        .await?;
    println!("Load balance entry for {} updated", interface);
    Ok(())
}
