//! Device registration validation.

use std::net::Ipv4Addr;

use crate::error::CoreError;

/// Maximum length of a device name.
const MAX_NAME_LEN: usize = 100;

/// Validate a device display name.
///
/// Rules:
/// - Must not be empty or whitespace only.
/// - Must not exceed `MAX_NAME_LEN` characters.
pub fn validate_device_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Device name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Device name must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate the IP address a device is registered under.
///
/// Devices are addressed by dotted IPv4 (`192.168.1.20`).
pub fn validate_ip_address(ip: &str) -> Result<(), CoreError> {
    ip.parse::<Ipv4Addr>().map(|_| ()).map_err(|_| {
        CoreError::Validation(format!(
            "Invalid IP address '{ip}'. Expected dotted IPv4, e.g. 192.168.1.20"
        ))
    })
}

/// Require a non-empty device IP on the unauthenticated device protocol.
///
/// Devices identify themselves by the IP they claim; nothing beyond presence
/// is checked here. Returns the trimmed IP.
pub fn require_device_ip(ip: Option<&str>) -> Result<&str, CoreError> {
    match ip.map(str::trim) {
        Some(ip) if !ip.is_empty() => Ok(ip),
        _ => Err(CoreError::Validation("Device IP is required".to_string())),
    }
}
