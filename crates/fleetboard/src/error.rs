//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use fleetboard_config::ConfigError;
use fleetboard_core::{Collection, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(fleetboard::connection_failed),
        help(
            "Check the project URL and your network connection.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Change feed unavailable: {reason}")]
    #[diagnostic(
        code(fleetboard::feed),
        help("The list keeps its last state. Check that realtime is enabled for the project.")
    )]
    Feed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not authorized: {message}")]
    #[diagnostic(
        code(fleetboard::auth_failed),
        help(
            "Writes need a signed-in admin's access token.\n\
             Run: fleetboard config set-token --access-token"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(fleetboard::no_credentials),
        help(
            "Configure credentials with: fleetboard config init\n\
             Or set the FLEETBOARD_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Rows ─────────────────────────────────────────────────────────
    #[error("No {resource_type} matches '{identifier}'")]
    #[diagnostic(
        code(fleetboard::not_found),
        help("Run: fleetboard {list_command} to see the current ids")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("'{identifier}' matches more than one {resource_type}")]
    #[diagnostic(
        code(fleetboard::ambiguous),
        help("Candidates: {candidates}\nType more of the id.")
    )]
    Ambiguous {
        resource_type: String,
        identifier: String,
        candidates: String,
    },

    #[error("{resource_type} '{identifier}' already exists")]
    #[diagnostic(code(fleetboard::conflict))]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    // ── Writes ───────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(fleetboard::write_failed),
        help("The list was reloaded from the backend; nothing else changed.")
    )]
    WriteFailed { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(fleetboard::partial_swap),
        help(
            "The list was reloaded and shows what the backend kept.\n\
             Two rows may now share a position; move again to settle them."
        )
    )]
    PartialSwap { message: String },

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(fleetboard::api_error))]
    ApiError { code: String, message: String },

    // ── Unsupported ──────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(fleetboard::unsupported))]
    Unsupported { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fleetboard::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fleetboard::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fleetboard config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(fleetboard::no_config),
        help(
            "Create one with: fleetboard config init\n\
             Or pass --url and --api-key.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(fleetboard::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(fleetboard::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(fleetboard::timeout),
        help("Increase the timeout with --timeout or in the profile.")
    )]
    Timeout { seconds: u64 },

    // ── Internal / IO / Serialization ────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(fleetboard::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(fleetboard::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Feed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::Ambiguous { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Unsupported { .. } => exit_code::PERMISSION,
            _ => exit_code::GENERAL,
        }
    }
}

/// The `fleetboard <command>` that lists a collection.
pub fn list_command(collection: Collection) -> &'static str {
    match collection {
        Collection::Members => "members list",
        Collection::BestGames => "games list",
        Collection::Faqs => "faqs list",
        Collection::FooterResources => "resources list",
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { collection, id } => CliError::NotFound {
                resource_type: collection.noun().into(),
                identifier: id.to_string(),
                list_command: list_command(collection).into(),
            },

            e @ CoreError::WriteFailed { .. } => CliError::WriteFailed {
                message: e.to_string(),
            },

            e @ CoreError::PartialSwap { .. } => CliError::PartialSwap {
                message: e.to_string(),
            },

            CoreError::Subscription { reason, .. } => CliError::Feed { reason },

            CoreError::Conflict { collection, id } => CliError::Conflict {
                resource_type: collection.noun().into(),
                identifier: id.to_string(),
            },

            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url: if url.is_empty() { "(realtime)".into() } else { url },
                reason,
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Unauthorized { message } => CliError::AuthFailed { message },

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            e @ CoreError::Unsupported { .. } => CliError::Unsupported {
                message: e.to_string(),
            },

            e @ CoreError::NotMounted { .. } => CliError::Internal(e.to_string()),

            CoreError::Api {
                message,
                code,
                status,
            } => CliError::ApiError {
                code: code
                    .or_else(|| status.map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Serialization(e) => CliError::Internal(e.to_string()),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
