use chrono::{DateTime, Utc};

/// Load state of a collection view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Not mounted.
    #[default]
    Idle,
    /// First fetch in flight; no rows yet.
    Loading,
    Ready,
    /// Refetch in flight; the previous rows are still shown.
    Refreshing,
    /// The last fetch failed. Rows from earlier fetches are kept.
    Error,
}

/// Health of the change feed behind a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedState {
    #[default]
    Disabled,
    Connected,
    Reconnecting { attempt: u32 },
}

impl std::fmt::Display for FeedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => f.write_str("off"),
            Self::Connected => f.write_str("live"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
        }
    }
}

/// What produced [`ViewStatus::last_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorOrigin {
    Fetch,
    Write,
}

/// Everything a renderer needs besides the rows themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewStatus {
    pub phase: Phase,
    /// Most recent failure. A write failure stays until the next
    /// successful write; a fetch failure also clears on a successful fetch.
    pub last_error: Option<String>,
    pub error_origin: Option<ErrorOrigin>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub feed: FeedState,
}

impl ViewStatus {
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub(super) fn record_error(&mut self, origin: ErrorOrigin, message: String) {
        self.last_error = Some(message);
        self.error_origin = Some(origin);
    }

    /// Returns whether there was anything to clear.
    pub(super) fn clear_error(&mut self) -> bool {
        self.error_origin = None;
        self.last_error.take().is_some()
    }
}
