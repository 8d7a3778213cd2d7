// fleetboard-core: Ordered collections, position reconciliation and reactive views over fleetboard-api.

pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod manager;
pub mod model;
pub mod order;
pub mod reconcile;
mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{Backend, ChangeEvent, ChangeFeed, ChangeKind, FeedSignal, MemoryBackend, RestBackend};
pub use config::{BackendConfig, ManagerOptions, ReconnectConfig};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use manager::{CollectionManager, ErrorOrigin, FeedState, MoveOutcome, Phase, ViewStatus};
pub use order::{MoveDirection, MovePlan, SwapPlan};
pub use reconcile::Reconciler;
pub use stream::{CollectionView, EntityFilter, ViewStream};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Shared vocabulary
    Collection, EntityId, Locale, OrderedEntity, ResourceCategory, Visibility,
    // Entities
    Faq, FooterResource, Game, Member,
    // Drafts and patches
    FaqPatch, FooterResourcePatch, GamePatch, MemberPatch, NewFaq, NewFooterResource, NewGame,
    NewMember,
    // Helpers
    parse_achievements,
};

// Secrets and URLs appear in `BackendConfig`; re-export so callers need not depend on them.
pub use secrecy::SecretString;
pub use url::Url;
