use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default seconds between heartbeat + poll cycles.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default per-request timeout for backend calls.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Agent configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Backend origin, e.g. `http://admin.local:3000`.
    pub backend_url: String,
    /// The IP this device is registered under.
    pub device_ip: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Where delivered exam files are written.
    pub download_dir: PathBuf,
}

impl AgentConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable               | Required | Default       |
    /// |------------------------|----------|---------------|
    /// | `BACKEND_URL`          | yes      | --            |
    /// | `DEVICE_IP`            | yes      | --            |
    /// | `POLL_INTERVAL_SECS`   | no       | `30`          |
    /// | `REQUEST_TIMEOUT_SECS` | no       | `30`          |
    /// | `DOWNLOAD_DIR`         | no       | `./downloads` |
    pub fn from_env() -> Result<Self, AgentError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AgentError> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AgentError::Config(format!("{key} environment variable is required")))
        };
        let seconds = |key: &str, default: u64| -> Result<Duration, AgentError> {
            match lookup(key) {
                None => Ok(Duration::from_secs(default)),
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
                    _ => Err(AgentError::Config(format!(
                        "{key} must be a positive integer, got '{raw}'"
                    ))),
                },
            }
        };

        let backend_url = required("BACKEND_URL")?.trim_end_matches('/').to_string();
        let device_ip = required("DEVICE_IP")?;
        examhall_core::devices::validate_ip_address(&device_ip)?;

        Ok(Self {
            backend_url,
            device_ip,
            poll_interval: seconds("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?,
            request_timeout: seconds("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            download_dir: PathBuf::from(
                lookup("DOWNLOAD_DIR").unwrap_or_else(|| "./downloads".into()),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AgentConfig, AgentError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AgentConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_applied() {
        let config = load(&[("BACKEND_URL", "http://host:3000/"), ("DEVICE_IP", "10.0.0.1")]).unwrap();
        assert_eq!(config.backend_url, "http://host:3000");
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.download_dir, PathBuf::from("./downloads"));
    }

    #[test]
    fn missing_required_vars_rejected() {
        assert!(matches!(
            load(&[("DEVICE_IP", "10.0.0.1")]),
            Err(AgentError::Config(msg)) if msg.contains("BACKEND_URL")
        ));
        assert!(load(&[("BACKEND_URL", "http://h"), ("DEVICE_IP", "nope")]).is_err());
    }

    #[test]
    fn zero_interval_rejected() {
        let result = load(&[
            ("BACKEND_URL", "http://h"),
            ("DEVICE_IP", "10.0.0.1"),
            ("POLL_INTERVAL_SECS", "0"),
        ]);
        assert!(matches!(result, Err(AgentError::Config(_))));
    }
}
