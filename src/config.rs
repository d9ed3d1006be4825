use std::time::Duration;

use serde::Deserialize;

use crate::{
    constants::{
        CERT_CACHE_CAPACITY, CERT_CACHE_TTL_SECS, CERT_FETCH_TIMEOUT_SECS, EXPECTED_COMMON_NAME,
        MESSAGE_TYPE_HEADER,
    },
    errors::IpnError,
};

const EXPECTED_COMMON_NAME_ENV: &str = "IPN_EXPECTED_COMMON_NAME";
const CERT_CACHE_TTL_SECS_ENV: &str = "IPN_CERT_CACHE_TTL_SECS";
const CERT_FETCH_TIMEOUT_SECS_ENV: &str = "IPN_CERT_FETCH_TIMEOUT_SECS";

/// Settings for IPN verification. Deserializable so it can be embedded in the
/// host application's own config file; every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IpnConfig {
    /// Header whose value must be `Notification`. Looked up case-insensitively.
    pub message_type_header: String,
    /// Subject CN the signing certificate must carry.
    pub expected_common_name: String,
    /// Absolute lifetime of a cached signing certificate.
    pub certificate_cache_ttl_secs: u64,
    pub certificate_cache_capacity: u64,
    pub certificate_fetch_timeout_secs: u64,
}

impl Default for IpnConfig {
    fn default() -> Self {
        Self {
            message_type_header: MESSAGE_TYPE_HEADER.to_owned(),
            expected_common_name: EXPECTED_COMMON_NAME.to_owned(),
            certificate_cache_ttl_secs: CERT_CACHE_TTL_SECS,
            certificate_cache_capacity: CERT_CACHE_CAPACITY,
            certificate_fetch_timeout_secs: CERT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl IpnConfig {
    /// Defaults, overridden by any of the `IPN_*` environment variables that
    /// are set.
    pub fn from_env() -> Result<Self, IpnError> {
        let mut config = Self::default();
        if let Ok(cn) = std::env::var(EXPECTED_COMMON_NAME_ENV) {
            config.expected_common_name = cn;
        }
        if let Some(ttl) = read_secs(CERT_CACHE_TTL_SECS_ENV)? {
            config.certificate_cache_ttl_secs = ttl;
        }
        if let Some(timeout) = read_secs(CERT_FETCH_TIMEOUT_SECS_ENV)? {
            config.certificate_fetch_timeout_secs = timeout;
        }
        Ok(config)
    }

    pub fn certificate_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.certificate_cache_ttl_secs)
    }

    pub fn certificate_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.certificate_fetch_timeout_secs)
    }
}

fn read_secs(key: &str) -> Result<Option<u64>, IpnError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| IpnError::Configuration(format!("{key} must be a number of seconds"))),
        Err(_) => Ok(None),
    }
}
