//! Shared configuration for the fleetboard CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `fleetboard_core::BackendConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fleetboard_core::{BackendConfig, ManagerOptions, Visibility};

/// Keyring service name under which secrets are stored.
pub const KEYRING_SERVICE: &str = "fleetboard";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named project profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Per-write timeout in seconds.
    #[serde(default = "default_write_timeout")]
    pub write_timeout: u64,

    /// Language for localized columns: "it" or "en".
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            write_timeout: default_write_timeout(),
            locale: default_locale(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_write_timeout() -> u64 {
    10
}
fn default_locale() -> String {
    "it".into()
}

/// A named project profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Project base URL (e.g., "https://abcd.supabase.co").
    pub url: String,

    /// Project API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Signed-in admin's access token (plaintext; prefer keyring).
    pub access_token: Option<String>,

    /// Environment variable name containing the access token.
    pub access_token_env: Option<String>,

    /// Override request timeout.
    pub timeout: Option<u64>,

    /// Override write timeout.
    pub write_timeout: Option<u64>,

    /// Follow realtime changes in `watch` commands. Default: on.
    pub realtime: Option<bool>,

    /// Reorder locally before writes land. Default: on.
    pub optimistic: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "fleetboard", "fleetboard").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fleetboard");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, layered over defaults and under
/// `FLEETBOARD_*` environment variables (`__` separates nesting, e.g.
/// `FLEETBOARD_DEFAULTS__TIMEOUT=5`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FLEETBOARD_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Keyring account for a profile secret, e.g. `"default/api-key"`.
pub fn keyring_account(profile_name: &str, secret: &str) -> String {
    format!("{profile_name}/{secret}")
}

fn from_keyring(profile_name: &str, secret: &str) -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name, secret)).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

fn from_env(name: Option<&String>) -> Option<SecretString> {
    name.and_then(|n| std::env::var(n).ok())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

/// Resolve the project API key: env var named by the profile, then the
/// system keyring, then plaintext config.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    from_env(profile.api_key_env.as_ref())
        .or_else(|| from_keyring(profile_name, "api-key"))
        .or_else(|| profile.api_key.clone().map(SecretString::from))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve the admin access token the same way. Absence is not an error:
/// requests then run with the API key's own role.
pub fn resolve_access_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    from_env(profile.access_token_env.as_ref())
        .or_else(|| from_keyring(profile_name, "access-token"))
        .or_else(|| profile.access_token.clone().map(SecretString::from))
}

/// Parse and check a profile URL.
pub fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build a `BackendConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_backend_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<BackendConfig, ConfigError> {
    let url = parse_url(&profile.url)?;
    let api_key = resolve_api_key(profile, profile_name)?;

    let mut config = BackendConfig::new(url, api_key);
    config.access_token = resolve_access_token(profile, profile_name);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.realtime_enabled = profile.realtime.unwrap_or(true);
    Ok(config)
}

/// Manager behaviour for a profile.
pub fn profile_manager_options(profile: &Profile, defaults: &Defaults) -> ManagerOptions {
    ManagerOptions {
        visibility: Visibility::Admin,
        write_timeout: Duration::from_secs(profile.write_timeout.unwrap_or(defaults.write_timeout)),
        optimistic: profile.optimistic.unwrap_or(true),
        watch_changes: profile.realtime.unwrap_or(true),
        ..ManagerOptions::default()
    }
}
