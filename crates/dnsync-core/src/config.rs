//! Configuration types for the dnsync system
//!
//! This module defines the run configuration and the parsing of profile
//! definitions from their raw (comma/semicolon separated) form.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{info, warn};

/// Separators accepted between list values
const LIST_SEPARATORS: [char; 2] = [',', ';'];

/// Main dnsync configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Profiles to synchronize, in processing order
    pub profiles: Vec<Profile>,

    /// Block list source locations
    pub block_sources: Vec<String>,

    /// Override (rewrite) list source locations
    pub rewrite_sources: Vec<String>,

    /// Replace all remote entries instead of diffing
    pub force_rewrite: bool,

    /// Request pacing
    pub rate_limit: RateLimitConfig,

    /// Request channel settings
    pub channel: ChannelConfig,
}

impl SyncConfig {
    /// Create a configuration for the given profiles with default settings
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            profiles,
            block_sources: Vec::new(),
            rewrite_sources: Vec::new(),
            force_rewrite: false,
            rate_limit: RateLimitConfig::default(),
            channel: ChannelConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.profiles.is_empty() {
            return Err(crate::Error::config("No profiles configured"));
        }

        for profile in &self.profiles {
            profile.validate()?;
        }

        self.rate_limit.validate()?;
        self.channel.validate()?;

        Ok(())
    }
}

/// A single remote DNS-filtering profile
#[derive(Clone, PartialEq, Eq)]
pub struct Profile {
    /// Profile identifier used in API paths
    pub client_id: String,

    /// API key for this profile
    /// ⚠️ NEVER log this value
    pub auth_secret: String,

    /// Replaces the target of every rewrite entry for this profile
    pub external_ip: Option<IpAddr>,

    /// Optional human-readable name
    pub name: Option<String>,
}

impl Profile {
    /// Create a profile without overrides
    pub fn new(client_id: impl Into<String>, auth_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            auth_secret: auth_secret.into(),
            external_ip: None,
            name: None,
        }
    }

    /// Set the external IP override
    pub fn with_external_ip(mut self, ip: IpAddr) -> Self {
        self.external_ip = Some(ip);
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name used in logs: `"name (id)"` when a name is set, else the id
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{} ({})", name, self.client_id),
            _ => self.client_id.clone(),
        }
    }

    /// Validate the profile
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.client_id.trim().is_empty() {
            return Err(crate::Error::config("Profile client id cannot be empty"));
        }
        if self.auth_secret.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Auth secret cannot be empty for profile {}",
                self.client_id
            )));
        }
        Ok(())
    }
}

// The auth secret is redacted
impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("client_id", &self.client_id)
            .field("auth_secret", &"<REDACTED>")
            .field("external_ip", &self.external_ip)
            .field("name", &self.name)
            .finish()
    }
}

/// Pacing of remote mutations
///
/// The remote enforces a request budget per window that resets a fixed time
/// after the last request of a burst. Requests are therefore issued in
/// batches of `batch_size` with a `cooldown_secs` pause between batches.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests issued per window
    pub batch_size: usize,

    /// Pause between two consecutive batches (in seconds)
    ///
    /// Set to 0 to disable pacing.
    pub cooldown_secs: u64,
}

impl RateLimitConfig {
    /// Pause between batches
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Validate the pacing settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.batch_size == 0 {
            return Err(crate::Error::config("Batch size must be > 0"));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
        }
    }
}

/// Request channel settings
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Maximum number of requests in flight across the whole process
    pub max_in_flight: usize,

    /// Per-request timeout (in seconds)
    pub timeout_secs: u64,
}

impl ChannelConfig {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the channel settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_in_flight == 0 {
            return Err(crate::Error::config("Max in-flight requests must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Requests per rate-limit window
pub const DEFAULT_BATCH_SIZE: usize = 60;

/// Pause between rate-limit windows (in seconds)
pub const DEFAULT_COOLDOWN_SECS: u64 = 60;

/// Process-wide ceiling of requests in flight
pub const DEFAULT_MAX_IN_FLIGHT: usize = 100;

/// Per-request timeout (in seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Build the profile list from raw, separator-delimited values.
///
/// - `client_ids`: ids separated by `,` or `;` (required)
/// - `auth_secrets`: a single secret shared by every profile, or exactly one
///   per profile
/// - `external_ips`: a single IP for every profile, or positional values where
///   blank or missing positions mean "no override"
/// - `names`: optional positional display names
pub fn parse_profiles(
    client_ids: Option<&str>,
    auth_secrets: Option<&str>,
    external_ips: Option<&str>,
    names: Option<&str>,
) -> Result<Vec<Profile>, crate::Error> {
    let client_ids = client_ids
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| crate::Error::config("CLIENT_ID is required"))?;
    let auth_secrets = auth_secrets
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| crate::Error::config("AUTH_SECRET is required"))?;

    let ids: Vec<&str> = split_list(client_ids)
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(crate::Error::config("At least one CLIENT_ID must be provided"));
    }

    let secrets = parse_auth_secrets(auth_secrets, ids.len())?;
    let ips = parse_external_ips(external_ips, ids.len())?;
    let names = parse_names(names, ids.len());

    Ok(ids
        .into_iter()
        .zip(secrets)
        .zip(ips)
        .zip(names)
        .map(|(((id, secret), external_ip), name)| Profile {
            client_id: id.to_string(),
            auth_secret: secret,
            external_ip,
            name,
        })
        .collect())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(LIST_SEPARATORS).map(str::trim)
}

fn is_single_value(raw: &str) -> bool {
    !raw.contains(LIST_SEPARATORS)
}

fn parse_auth_secrets(raw: &str, profile_count: usize) -> Result<Vec<String>, crate::Error> {
    if is_single_value(raw) {
        info!(
            "Single AUTH_SECRET will be applied to all {} profiles",
            profile_count
        );
        return Ok(vec![raw.trim().to_string(); profile_count]);
    }

    let secrets: Vec<&str> = split_list(raw).collect();
    if secrets.len() != profile_count {
        return Err(crate::Error::config(format!(
            "AUTH_SECRET count ({}) must match CLIENT_ID count ({}) or be a single value for all profiles",
            secrets.len(),
            profile_count
        )));
    }

    secrets
        .into_iter()
        .map(|secret| {
            if secret.is_empty() {
                Err(crate::Error::config("AUTH_SECRET cannot be empty for any profile"))
            } else {
                Ok(secret.to_string())
            }
        })
        .collect()
}

fn parse_external_ips(
    raw: Option<&str>,
    profile_count: usize,
) -> Result<Vec<Option<IpAddr>>, crate::Error> {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Ok(vec![None; profile_count]);
    };

    if is_single_value(raw) {
        let ip = parse_ip(raw.trim())?;
        info!(
            "Single EXTERNAL_IP '{}' will be applied to all {} profiles",
            ip,
            profile_count
        );
        return Ok(vec![Some(ip); profile_count]);
    }

    let values: Vec<&str> = split_list(raw).collect();
    if values.len() > profile_count {
        warn!(
            "{} EXTERNAL_IPs provided but only {} profiles. Extra IPs will be ignored.",
            values.len(),
            profile_count
        );
    }

    (0..profile_count)
        .map(|i| match values.get(i) {
            Some(value) if !value.is_empty() => parse_ip(value).map(Some),
            _ => Ok(None),
        })
        .collect()
}

fn parse_names(raw: Option<&str>, profile_count: usize) -> Vec<Option<String>> {
    let values: Vec<&str> = raw.map(|raw| split_list(raw).collect()).unwrap_or_default();
    (0..profile_count)
        .map(|i| {
            values
                .get(i)
                .filter(|name| !name.is_empty())
                .map(|name| name.to_string())
        })
        .collect()
}

fn parse_ip(value: &str) -> Result<IpAddr, crate::Error> {
    value
        .parse()
        .map_err(|_| crate::Error::config(format!("Invalid EXTERNAL_IP: '{}'", value)))
}
