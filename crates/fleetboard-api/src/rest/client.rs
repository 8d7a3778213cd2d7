// Async HTTP client for a PostgREST table API.
//
// Base path: /rest/v1/
// Auth: `apikey` header + bearer token (see `TransportConfig`)

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::query::SelectQuery;
use crate::Error;
use crate::transport::{ApiCredentials, TransportConfig};

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";

// ── Error response shape from PostgREST ──────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the table API of one project.
///
/// Every write asks for the affected rows back so callers always see
/// the persisted representation.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl RestClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a project URL (`https://<ref>.supabase.co`) and credentials.
    pub fn new(
        project_url: &Url,
        credentials: &ApiCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(credentials)?;
        let base_url = Self::normalize_base_url(project_url)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(http: reqwest::Client, project_url: &Url) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(project_url)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: TransportConfig::default().timeout.as_secs(),
        })
    }

    /// Append `/rest/v1/` unless the URL already points there.
    fn normalize_base_url(raw: &Url) -> Result<Url, Error> {
        let mut url = raw.clone();
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/rest/v1") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/rest/v1/"));
        }
        url.set_query(None);

        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(table)?)
    }

    // ── Table operations ─────────────────────────────────────────────

    /// `GET /{table}?select=...`
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &SelectQuery,
    ) -> Result<Vec<T>, Error> {
        let url = self.table_url(table)?;
        let params = query.to_params();
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::handle_response(resp).await
    }

    /// `POST /{table}` returning the inserted row.
    pub async fn insert<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.table_url(table)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let rows: Vec<T> = Self::handle_response(resp).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Deserialization {
                message: format!("insert into {table} returned no rows"),
                body: String::new(),
            })
    }

    /// `PATCH /{table}?id=eq.{id}` returning the updated row.
    ///
    /// An empty representation means no row matched.
    pub async fn update<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        table: &str,
        id: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.table_url(table)?;
        debug!("PATCH {url} id={id}");

        let resp = self
            .http
            .patch(url)
            .query(&[("id", format!("eq.{id}"))])
            .header(PREFER, RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let rows: Vec<T> = Self::handle_response(resp).await?;
        rows.into_iter().next().ok_or_else(|| Error::RowNotFound {
            table: table.to_owned(),
            id: id.to_owned(),
        })
    }

    /// `DELETE /{table}?id=eq.{id}`
    pub async fn delete(&self, table: &str, id: &str) -> Result<(), Error> {
        let url = self.table_url(table)?;
        debug!("DELETE {url} id={id}");

        let resp = self
            .http
            .delete(url)
            .query(&[("id", format!("eq.{id}"))])
            .header(PREFER, RETURN_MINIMAL)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok();

        let message = parsed
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.clone()
                }
            });

        match status {
            reqwest::StatusCode::UNAUTHORIZED => Error::Unauthorized { message },
            reqwest::StatusCode::FORBIDDEN => Error::Forbidden { message },
            _ => {
                let (code, details, hint) = parsed
                    .map(|e| (e.code, e.details, e.hint))
                    .unwrap_or_default();
                Error::Rest {
                    status: status.as_u16(),
                    code,
                    message,
                    details,
                    hint,
                }
            }
        }
    }
}
