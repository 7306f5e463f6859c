//! Input validation and sanitization
//!
//! Everything the operator types ends up verbatim inside generated config
//! files and shell scripts, so reject anything that could smuggle directives
//! or shell metacharacters before it reaches the intent document.

use crate::error::{RoutergenError, RoutergenResult};
use std::net::Ipv4Addr;

/// Maximum length for interface names (Linux kernel limit is 15)
const MAX_INTERFACE_NAME_LEN: usize = 15;

/// Validate an interface name
///
/// Interface names must be alphanumeric with optional dashes and underscores,
/// and no longer than 15 characters (Linux kernel limit)
pub fn validate_interface_name(name: &str) -> RoutergenResult<()> {
    if name.is_empty() {
        return Err(RoutergenError::InvalidParameter(
            "Interface name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_INTERFACE_NAME_LEN {
        return Err(RoutergenError::InvalidParameter(format!(
            "Interface name too long (max {} characters)",
            MAX_INTERFACE_NAME_LEN
        )));
    }

    for c in name.chars() {
        if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
            return Err(RoutergenError::InvalidParameter(format!(
                "Invalid interface name '{}': contains invalid character '{}'",
                name, c
            )));
        }
    }

    // A leading dash could be read as an option by the consuming tools
    if name.starts_with('-') {
        return Err(RoutergenError::InvalidParameter(
            "Interface name cannot start with dash".to_string(),
        ));
    }

    Ok(())
}

/// Validate an IPv4 address
pub fn validate_ipv4(addr: &str) -> RoutergenResult<Ipv4Addr> {
    addr.parse::<Ipv4Addr>().map_err(|_| {
        RoutergenError::InvalidParameter(format!("Invalid IPv4 address: {}", addr))
    })
}

/// Validate an IPv4 address with an optional /prefix
pub fn validate_address(addr: &str) -> RoutergenResult<()> {
    match addr.split_once('/') {
        Some((ip, prefix)) => {
            validate_ipv4(ip)?;
            let prefix: u8 = prefix.parse().map_err(|_| {
                RoutergenError::InvalidParameter(format!("Invalid prefix length: {}", addr))
            })?;
            if prefix > 32 {
                return Err(RoutergenError::InvalidParameter(format!(
                    "Prefix length {} exceeds maximum 32",
                    prefix
                )));
            }
        }
        None => {
            validate_ipv4(addr)?;
        }
    }
    Ok(())
}

/// Validate a WiFi SSID
///
/// SSIDs can be 0-32 bytes (can include non-ASCII, but we'll be conservative)
pub fn validate_ssid(ssid: &str) -> RoutergenResult<()> {
    if ssid.is_empty() {
        return Err(RoutergenError::InvalidParameter(
            "SSID cannot be empty".to_string(),
        ));
    }

    if ssid.len() > 32 {
        return Err(RoutergenError::InvalidParameter(
            "SSID cannot exceed 32 characters".to_string(),
        ));
    }

    // Newlines or other control characters would break the hostapd config
    if ssid.chars().any(|c| c.is_control()) {
        return Err(RoutergenError::InvalidParameter(
            "SSID contains invalid control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate a WiFi passphrase (WPA2: 8-63 ASCII characters)
pub fn validate_wifi_password(password: &str) -> RoutergenResult<()> {
    if password.len() < 8 {
        return Err(RoutergenError::InvalidParameter(
            "WiFi password must be at least 8 characters".to_string(),
        ));
    }

    if password.len() > 63 {
        return Err(RoutergenError::InvalidParameter(
            "WiFi password cannot exceed 63 characters".to_string(),
        ));
    }

    if !password.is_ascii() {
        return Err(RoutergenError::InvalidParameter(
            "WiFi password must contain only ASCII characters".to_string(),
        ));
    }

    if password.chars().any(|c| c.is_control()) {
        return Err(RoutergenError::InvalidParameter(
            "WiFi password contains invalid control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate a 2.4GHz channel given as a string (the APs run hw_mode=g)
pub fn validate_channel(channel: &str) -> RoutergenResult<()> {
    let parsed: u8 = channel.parse().map_err(|_| {
        RoutergenError::InvalidParameter(format!("Invalid channel: {}", channel))
    })?;

    if !(1..=13).contains(&parsed) {
        return Err(RoutergenError::InvalidParameter(format!(
            "Channel {} outside the 2.4GHz range 1-13",
            parsed
        )));
    }

    Ok(())
}
