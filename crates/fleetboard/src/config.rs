//! CLI configuration: a thin wrapper around `fleetboard_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --api-key, --timeout, --lang).

use std::time::Duration;

use secrecy::SecretString;

use fleetboard_core::{BackendConfig, Locale, ManagerOptions};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use fleetboard_config::{
    Config, Defaults, KEYRING_SERVICE, Profile, config_path, keyring_account,
    load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Everything a collection command needs to talk to the backend.
#[derive(Debug)]
pub struct Resolved {
    pub backend: BackendConfig,
    pub options: ManagerOptions,
    pub locale: Locale,
}

/// Build the backend config from the config file, profile and CLI overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let locale = resolve_locale(global, &cfg.defaults);

    // If a profile exists, use it with CLI flag overrides
    if let Some(profile) = cfg.profiles.get(&profile_name) {
        let backend = resolve_profile(profile, &profile_name, &cfg.defaults, global)?;
        let options = fleetboard_config::profile_manager_options(profile, &cfg.defaults);
        return Ok(Resolved {
            backend,
            options,
            locale,
        });
    }

    // A profile was asked for by name but is missing
    if global.profile.is_some() && !cfg.profiles.is_empty() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", "),
        });
    }

    // No profile found -- try to build from CLI flags / env vars alone
    let url_str = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = fleetboard_config::parse_url(url_str)?;
    let api_key = global
        .api_key
        .clone()
        .map(SecretString::from)
        .ok_or(CliError::NoCredentials {
            profile: profile_name,
        })?;

    let mut backend = BackendConfig::new(url, api_key);
    backend.timeout = Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout));

    let options = fleetboard_config::profile_manager_options(&Profile::default(), &cfg.defaults);
    Ok(Resolved {
        backend,
        options,
        locale,
    })
}

/// Translate a `Profile` + global flags into a `BackendConfig`.
///
/// CLI flag overrides take priority over profile values.
fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<BackendConfig, CliError> {
    let mut profile = profile.clone();

    // 1. URL (flag > env > profile)
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }

    // 2. API key: a flag wins over the whole credential chain
    let flag_key = global.api_key.clone();
    if let Some(ref key) = flag_key {
        profile.api_key = Some(key.clone());
        profile.api_key_env = None;
    }
    let mut backend =
        fleetboard_config::profile_to_backend_config(&profile, profile_name, defaults)?;
    if let Some(key) = flag_key {
        backend.api_key = SecretString::from(key);
    }

    // 3. Timeout
    if let Some(timeout) = global.timeout {
        backend.timeout = Duration::from_secs(timeout);
    }

    Ok(backend)
}

fn resolve_locale(global: &GlobalOpts, defaults: &Defaults) -> Locale {
    global
        .lang
        .map(Locale::from)
        .or_else(|| defaults.locale.parse().ok())
        .unwrap_or_default()
}
