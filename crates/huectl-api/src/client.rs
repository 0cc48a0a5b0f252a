// Bridge HTTP client
//
// Wraps `reqwest::Client` with Hue-specific URL construction and response
// unwrapping. Endpoint groups (lights, groups, config, pairing) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::ResponseItem;
use crate::transport::TransportConfig;

/// Raw HTTP client for one bridge's v1 REST API.
///
/// Every resource path is scoped under `/api/<application key>/`. Error
/// payloads (which the bridge returns with HTTP 200) are turned into
/// [`Error`] values before the caller sees them.
pub struct HueClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    timeout_secs: u64,
}

impl HueClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the bridge root (e.g. `https://192.168.1.20`). The
    /// token may be absent for pairing and public config probes.
    pub fn new(
        base_url: Url,
        token: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            token,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, token: Option<SecretString>) -> Self {
        Self {
            http,
            base_url,
            token,
            timeout_secs: 0,
        }
    }

    /// The bridge base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client (for flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api`, the unauthenticated root used for pairing.
    pub(crate) fn root_url(&self) -> Result<Url, Error> {
        Ok(self.base_url.join("/api")?)
    }

    /// `{base}/api/{token}/{path}`. Without a token the bridge answers
    /// resource paths with "unauthorized user" (or public config).
    pub(crate) fn resource_url(&self, path: &str) -> Result<Url, Error> {
        let token = self
            .token
            .as_ref()
            .map_or("none", |t| t.expose_secret());
        Ok(self.base_url.join(&format!("/api/{token}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode a resource object.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!(path = %redact(&url), "GET");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let body = self.read_body(resp).await?;
        parse_resource(&body)
    }

    /// Send a PUT request and check every item of the response array.
    pub(crate) async fn put(&self, url: Url, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        debug!(path = %redact(&url), "PUT");
        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let text = self.read_body(resp).await?;
        let _: Vec<serde_json::Value> = parse_items(&text)?;
        Ok(())
    }

    /// Send a POST request and return the `success` payloads.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Vec<T>, Error> {
        debug!(path = %redact(&url), "POST");
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let text = self.read_body(resp).await?;
        parse_items(&text)
    }

    /// Check the HTTP status and pull the body text.
    async fn read_body(&self, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                resource: redact(resp.url()),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Unauthorized {
                description: format!("HTTP {status}"),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        trace!(bytes = text.len(), "response body received");
        Ok(text)
    }

    /// Timeouts become [`Error::Timeout`]; everything else stays a transport error.
    ///
    /// The request URL carries the application key, so it is dropped here.
    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(e.without_url())
        }
    }
}

// ── Response decoding ────────────────────────────────────────────────

/// Decode a resource object, surfacing an error array if the bridge sent one.
pub(crate) fn parse_resource<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    if let Ok(items) = serde_json::from_str::<Vec<ResponseItem<serde_json::Value>>>(body) {
        if let Some(ResponseItem::Error(e)) = items.into_iter().next() {
            return Err(Error::from_payload(e.code, e.address, e.description));
        }
    }

    serde_json::from_str(body).map_err(|e| deserialization_error(&e, body))
}

/// Decode an array of success/error items. The first error wins.
pub(crate) fn parse_items<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, Error> {
    let items: Vec<ResponseItem<T>> =
        serde_json::from_str(body).map_err(|e| deserialization_error(&e, body))?;

    let mut successes = Vec::with_capacity(items.len());
    for item in items {
        match item {
            ResponseItem::Success(value) => successes.push(value),
            ResponseItem::Error(e) => {
                return Err(Error::from_payload(e.code, e.address, e.description));
            }
        }
    }
    Ok(successes)
}

fn deserialization_error(e: &serde_json::Error, body: &str) -> Error {
    let preview: String = body.chars().take(200).collect();
    Error::Deserialization {
        message: format!("{e} (body preview: {preview:?})"),
        body: body.to_owned(),
    }
}

/// Path with the application key masked, for logs.
fn redact(url: &Url) -> String {
    let mut segments = url.path().split('/').collect::<Vec<_>>();
    if segments.len() > 2 && segments.get(1) == Some(&"api") {
        segments[2] = "***";
    }
    segments.join("/")
}
