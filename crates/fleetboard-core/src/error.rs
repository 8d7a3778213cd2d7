// ── Core error types ──
//
// User-facing errors from fleetboard-core. These are NOT API-specific:
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<fleetboard_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

use crate::model::{Collection, EntityId};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Ordering errors ──────────────────────────────────────────────
    /// The addressed entity is no longer in the loaded collection.
    /// Recovered by refetching.
    #[error("No {} with id {id}", .collection.noun())]
    NotFound { collection: Collection, id: EntityId },

    /// A write was rejected or never reached the store.
    #[error("Failed to {operation} {}: {reason}", .collection.noun())]
    WriteFailed {
        collection: Collection,
        operation: &'static str,
        reason: String,
    },

    /// One half of a position swap was persisted, the other was not.
    #[error(
        "Reorder of {collection} only partly applied: {applied} moved, {failed} did not ({reason})"
    )]
    PartialSwap {
        collection: Collection,
        applied: EntityId,
        failed: EntityId,
        reason: String,
    },

    /// The change feed dropped or could not be opened. Not fatal.
    #[error("Change feed for {collection} unavailable: {reason}")]
    Subscription { collection: Collection, reason: String },

    /// A duplicate-key rejection for a client-chosen id.
    #[error("A {} with id {id} already exists", .collection.noun())]
    Conflict { collection: Collection, id: EntityId },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Not authorized: {message}")]
    Unauthorized { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("{operation} is not supported for {collection}")]
    Unsupported {
        collection: Collection,
        operation: &'static str,
    },

    #[error("The {collection} view is not mounted")]
    NotMounted { collection: Collection },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// The backend error code (e.g. a PostgreSQL SQLSTATE).
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Errors that may succeed if the same request is simply sent again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ConnectionFailed { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Translate an API error raised while writing to `collection`.
    ///
    /// Conflicts and missing rows keep their identity; any other
    /// rejection becomes [`CoreError::WriteFailed`].
    pub fn from_write(
        err: fleetboard_api::Error,
        collection: Collection,
        operation: &'static str,
        id: &EntityId,
    ) -> Self {
        if err.is_conflict() {
            return Self::Conflict {
                collection,
                id: id.clone(),
            };
        }
        if err.is_not_found() {
            return Self::NotFound {
                collection,
                id: id.clone(),
            };
        }
        match Self::from(err) {
            e @ (Self::Timeout { .. }
            | Self::ConnectionFailed { .. }
            | Self::Unauthorized { .. }
            | Self::Config { .. }) => e,
            other => Self::WriteFailed {
                collection,
                operation,
                reason: other.to_string(),
            },
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fleetboard_api::Error> for CoreError {
    fn from(err: fleetboard_api::Error) -> Self {
        use fleetboard_api::Error as ApiError;

        match err {
            ApiError::Unauthorized { message } | ApiError::Forbidden { message } => {
                CoreError::Unauthorized { message }
            }
            ApiError::InvalidCredential(message) => CoreError::Config {
                message: format!("Invalid credential: {message}"),
            },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::ClientSetup(reason) => CoreError::Config { message: reason },
            ApiError::Rest {
                status,
                code,
                message,
                details,
                hint,
            } => {
                let mut message = message;
                if let Some(details) = details {
                    message = format!("{message} ({details})");
                }
                if let Some(hint) = hint {
                    message = format!("{message}; hint: {hint}");
                }
                CoreError::Api {
                    message,
                    code,
                    status: Some(status),
                }
            }
            ApiError::RowNotFound { table, id } => CoreError::Api {
                message: format!("no row with id {id} in {table}"),
                code: None,
                status: Some(404),
            },
            ApiError::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            ApiError::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            ApiError::ChannelRejected { topic, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("realtime channel {topic} rejected: {reason}"),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rest(status: u16, code: Option<&str>) -> fleetboard_api::Error {
        fleetboard_api::Error::Rest {
            status,
            code: code.map(String::from),
            message: "rejected".into(),
            details: Some("row violates check".into()),
            hint: None,
        }
    }

    #[test]
    fn write_conflict_keeps_identity() {
        let id = EntityId::from("m1");
        let err = CoreError::from_write(rest(409, Some("23505")), Collection::Members, "insert", &id);
        assert!(matches!(err, CoreError::Conflict { collection: Collection::Members, .. }));
    }

    #[test]
    fn other_write_rejection_is_write_failed() {
        let id = EntityId::from("g1");
        let err = CoreError::from_write(rest(400, Some("23514")), Collection::BestGames, "update", &id);
        match err {
            CoreError::WriteFailed { operation, reason, .. } => {
                assert_eq!(operation, "update");
                assert!(reason.contains("row violates check"));
            }
            other => panic!("expected WriteFailed, got {other:?}"),
        }
    }

    #[test]
    fn timeouts_stay_timeouts() {
        let id = EntityId::from("f1");
        let err = CoreError::from_write(
            fleetboard_api::Error::Timeout { timeout_secs: 10 },
            Collection::Faqs,
            "update",
            &id,
        );
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 10 }));
        assert!(err.is_transient());
    }

    #[test]
    fn missing_row_is_not_found() {
        let id = EntityId::from("r1");
        let api = fleetboard_api::Error::RowNotFound {
            table: "footer_resources".into(),
            id: "r1".into(),
        };
        let err = CoreError::from_write(api, Collection::FooterResources, "update", &id);
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert_eq!(err.to_string(), "No footer resource with id r1");
    }
}
