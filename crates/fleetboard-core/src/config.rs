// ── Runtime configuration ──
//
// These types describe how to reach the backend and how a manager
// behaves. They carry credentials and tuning but never touch disk: the
// CLI resolves a profile and hands a `BackendConfig` in.

use std::time::Duration;

pub use fleetboard_api::ReconnectConfig;
use secrecy::SecretString;
use url::Url;

use crate::model::Visibility;

/// Default per-request timeout for reads.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on a single write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// How to reach a hosted project.
///
/// Built by the CLI, passed to [`RestBackend`](crate::RestBackend).
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project URL (e.g. `https://abcd.supabase.co`).
    pub url: Url,
    /// Project API key, sent on every request.
    pub api_key: SecretString,
    /// Signed-in user's access token. Falls back to the API key.
    pub access_token: Option<SecretString>,
    /// Request timeout.
    pub timeout: Duration,
    /// Open the realtime socket for change feeds.
    pub realtime_enabled: bool,
    /// Socket reconnection backoff.
    pub reconnect: ReconnectConfig,
}

impl BackendConfig {
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            url,
            api_key,
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
            realtime_enabled: true,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Behaviour of a [`CollectionManager`](crate::CollectionManager).
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Which rows the manager lists.
    pub visibility: Visibility,
    /// Upper bound on each write.
    pub write_timeout: Duration,
    /// Reorder the local snapshot before the swap writes land.
    pub optimistic: bool,
    /// Follow the change feed while mounted.
    pub watch_changes: bool,
    /// Backoff used when the change feed has to be reopened.
    pub resubscribe: ReconnectConfig,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            visibility: Visibility::Admin,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            optimistic: true,
            watch_changes: true,
            resubscribe: ReconnectConfig::default(),
        }
    }
}

impl ManagerOptions {
    /// Read-only view of active rows, as the public site shows them.
    pub fn public() -> Self {
        Self {
            visibility: Visibility::Public,
            ..Self::default()
        }
    }

    /// One request/response cycle: no change feed.
    pub fn oneshot(self) -> Self {
        Self {
            watch_changes: false,
            ..self
        }
    }
}
