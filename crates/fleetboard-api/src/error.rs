use thiserror::Error;

/// PostgreSQL `unique_violation`, surfaced by PostgREST on duplicate keys.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Top-level error type for the `fleetboard-api` crate.
///
/// Covers every failure mode of the REST table API and the realtime
/// websocket. `fleetboard-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The anon key or access token was rejected (HTTP 401).
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The request was authenticated but row-level security denied it.
    #[error("Permission denied: {message}")]
    Forbidden { message: String },

    /// A credential could not be turned into a header value.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    // ── REST API ────────────────────────────────────────────────────
    /// Structured error from the REST layer (`{code, message, details, hint}`).
    #[error("API error (HTTP {status}): {message}")]
    Rest {
        status: u16,
        code: Option<String>,
        message: String,
        details: Option<String>,
        hint: Option<String>,
    },

    /// A row addressed by id does not exist (or is hidden by policy).
    #[error("No row with id {id} in {table}")]
    RowNotFound { table: String, id: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// The server refused to join the realtime channel.
    #[error("Realtime channel {topic} rejected: {reason}")]
    ChannelRejected { topic: String, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the credentials were rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::Forbidden { .. } | Self::InvalidCredential(_)
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } => true,
            Self::Rest { status, .. } => *status == 503 || *status == 504,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Rest { status: 404, .. } | Self::RowNotFound { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` for duplicate-key rejections (HTTP 409 or code `23505`).
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Rest { status, code, .. } => {
                *status == 409 || code.as_deref() == Some(UNIQUE_VIOLATION)
            }
            _ => false,
        }
    }

    /// Extract the API error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Rest { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
