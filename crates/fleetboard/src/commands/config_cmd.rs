//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, KEYRING_SERVICE, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

const MASK: &str = "****";

/// Copy of the config with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(MASK.into());
        }
        if profile.access_token.is_some() {
            profile.access_token = Some(MASK.into());
        }
    }
    cfg
}

fn format_config(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# unable to render config: {e}"))
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    Ok(config::save_config(cfg)?)
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "prompt".into(),
        reason: format!("could not read answer: {e}"),
    }
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    let names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    let available = match names.as_slice() {
        [] => "(none)".to_owned(),
        names => names.join(", "),
    };
    CliError::ProfileNotFound { name, available }
}

fn store_in_keyring(account: &str, secret: &str, label: &str) -> Result<(), CliError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, account).map_err(|e| CliError::Validation {
        field: "keyring".into(),
        reason: format!("system keyring unavailable: {e}"),
    })?;
    entry.set_password(secret).map_err(|e| CliError::Validation {
        field: "keyring".into(),
        reason: format!("could not save {label}: {e}"),
    })
}

/// Ask where a secret should live. `None` means it went to the keyring;
/// `Some` hands it back for the config file.
fn prompt_keyring_storage(
    secret: &str,
    account: &str,
    prompt: &str,
    label: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "System keyring",
        "Config file (readable by anyone with access to it)",
    ];
    let selection = Select::new()
        .with_prompt(prompt)
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_in_keyring(account, secret, label)?;
        eprintln!("   ✓ {label} saved to the keyring");
        Ok(None)
    } else {
        Ok(Some(secret.to_owned()))
    }
}

fn parse_flag(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("expected true or false, got '{value}'"),
    })
}

fn parse_seconds(field: &str, value: &str) -> Result<u64, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("expected whole seconds, got '{value}'"),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let path = config::config_path();
            eprintln!("Setting up a fleetboard profile in {}\n", path.display());

            // 1. Profile name
            let profile_name: String = Input::new()
                .with_prompt("Name this profile")
                .default("default".to_owned())
                .interact_text()
                .map_err(prompt_err)?;

            // 2. Project URL
            let url: String = Input::new()
                .with_prompt("Project URL")
                .default("https://your-project.supabase.co".into())
                .interact_text()
                .map_err(prompt_err)?;
            fleetboard_config::parse_url(&url)?;

            // 3. API key
            let key = rpassword::prompt_password("Project API key: ").map_err(prompt_err)?;
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "api_key".into(),
                    reason: "an API key is required".into(),
                });
            }
            let api_key = prompt_keyring_storage(
                &key,
                &config::keyring_account(&profile_name, "api-key"),
                "Keep the API key in",
                "API key",
            )?;

            // 4. Optional admin access token
            let wants_token = Confirm::new()
                .with_prompt("Add a signed-in admin's access token now? (needed for writes)")
                .default(false)
                .interact()
                .map_err(prompt_err)?;
            let access_token = if wants_token {
                let token = rpassword::prompt_password("Access token: ").map_err(prompt_err)?;
                if token.is_empty() {
                    None
                } else {
                    prompt_keyring_storage(
                        &token,
                        &config::keyring_account(&profile_name, "access-token"),
                        "Keep the access token in",
                        "Access token",
                    )?
                }
            } else {
                None
            };

            // 5. Build profile and config, keeping other profiles
            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    url,
                    api_key,
                    access_token,
                    ..Profile::default()
                },
            );
            cfg.default_profile = Some(profile_name.clone());

            // 6. Write config
            save_config(&cfg)?;

            eprintln!("\n✓ Saved profile '{profile_name}' to {}", path.display());
            eprintln!("  Try: fleetboard faqs list");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, format_config, |c| {
                c.default_profile.clone().unwrap_or_default()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "url" => {
                    fleetboard_config::parse_url(&value)?;
                    profile.url = value;
                }
                "api_key" | "api-key" => profile.api_key = Some(value),
                "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
                "access_token" | "access-token" => profile.access_token = Some(value),
                "access_token_env" | "access-token-env" => profile.access_token_env = Some(value),
                "timeout" => profile.timeout = Some(parse_seconds("timeout", &value)?),
                "write_timeout" | "write-timeout" => {
                    profile.write_timeout = Some(parse_seconds("write_timeout", &value)?);
                }
                "realtime" => profile.realtime = Some(parse_flag("realtime", &value)?),
                "optimistic" => profile.optimistic = Some(parse_flag("optimistic", &value)?),
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: url, api_key, \
                             api_key_env, access_token, access_token_env, timeout, \
                             write_timeout, realtime, optimistic"
                        ),
                    });
                }
            }

            save_config(&cfg)?;
            output::notice(&format!("✓ Set {key} on profile '{profile_name}'"), global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: fleetboard config init");
            } else {
                for name in cfg.profiles.keys() {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            output::notice(&format!("✓ Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        // ── SetToken ────────────────────────────────────────────────
        ConfigCommand::SetToken {
            profile,
            access_token,
        } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(&cfg, profile_name));
            }

            let (secret, label) = if access_token {
                ("access-token", "Access token")
            } else {
                ("api-key", "API key")
            };
            let value = rpassword::prompt_password(format!("{label}: ")).map_err(prompt_err)?;
            if value.is_empty() {
                return Err(CliError::Validation {
                    field: secret.into(),
                    reason: format!("{label} is empty"),
                });
            }
            store_in_keyring(&config::keyring_account(&profile_name, secret), &value, label)?;

            output::notice(
                &format!("✓ {label} stored in system keyring for profile '{profile_name}'"),
                global.quiet,
            );
            Ok(())
        }
    }
}
