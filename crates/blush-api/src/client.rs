use reqwest::{Client, Method, RequestBuilder, header};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, Result};

/// Correlation header attached to every request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP client bound to one backend and, optionally, one bearer token.
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token: None,
        }
    }

    /// A copy of this client authenticated with `token`.
    pub fn authenticated(&self, token: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, self.url(path))
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        if let Some(token) = &self.token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        req
    }

    /// Send and decode a JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let body = self.send_raw(req).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send and ignore whatever body comes back.
    pub(crate) async fn send_empty(&self, req: RequestBuilder) -> Result<()> {
        self.send_raw(req).await.map(|_| ())
    }

    async fn send_raw(&self, req: RequestBuilder) -> Result<String> {
        let req = req.build()?;
        let method = req.method().clone();
        let path = req.url().path().to_string();
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let resp = self.http.execute(req).await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            debug!("{} {} -> {} ({})", method, path, status.as_u16(), request_id);
            return Ok(body);
        }

        warn!("{} {} -> {} ({})", method, path, status.as_u16(), request_id);
        Err(ApiError::from_response(status.as_u16(), &body))
    }
}
