// Shared transport configuration for building reqwest::Client instances.
//
// Every request to the table API carries the project's anon key in the
// `apikey` header and a bearer token: the signed-in admin's access token
// when present, otherwise the anon key itself.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

const USER_AGENT: &str = concat!("fleetboard/", env!("CARGO_PKG_VERSION"));

/// Credentials presented on every request.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    /// Project anon (publishable) key.
    pub api_key: SecretString,
    /// Session access token for an authenticated admin, if any.
    pub access_token: Option<SecretString>,
}

impl ApiCredentials {
    pub fn anonymous(api_key: SecretString) -> Self {
        Self {
            api_key,
            access_token: None,
        }
    }

    /// The token sent as `Authorization: Bearer ...`.
    pub fn bearer(&self) -> &SecretString {
        self.access_token.as_ref().unwrap_or(&self.api_key)
    }

    fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();

        let mut key = HeaderValue::from_str(self.api_key.expose_secret())
            .map_err(|e| Error::InvalidCredential(format!("api key: {e}")))?;
        key.set_sensitive(true);
        headers.insert("apikey", key);

        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", self.bearer().expose_secret()))
                .map_err(|e| Error::InvalidCredential(format!("bearer token: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        Ok(headers)
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` with the credential headers installed as defaults.
    pub fn build_client(&self, credentials: &ApiCredentials) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .default_headers(credentials.headers()?)
            .build()
            .map_err(|e| Error::ClientSetup(format!("failed to build HTTP client: {e}")))
    }
}
