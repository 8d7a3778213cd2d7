//! PostgREST table API: `GET/POST/PATCH/DELETE /rest/v1/{table}`.

mod client;
mod query;

pub use client::RestClient;
pub use query::{Order, SelectQuery};
