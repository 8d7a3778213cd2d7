// fleetboard-api: Async Rust client for PostgREST-style table APIs and their realtime change feed

pub mod error;
pub mod realtime;
pub mod rest;
pub mod transport;

pub use error::Error;
pub use realtime::{ChangeEvent, ChangeKind, RealtimeEndpoint, RealtimeHandle, ReconnectConfig};
pub use rest::{Order, RestClient, SelectQuery};
pub use transport::{ApiCredentials, TransportConfig};
