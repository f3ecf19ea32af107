//! Base HTTP client with shared logic

use crate::infrastructure::model::types::ModelError;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Clone)]
pub struct HttpClientBase {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// `None` leaves the request unbounded; a zero duration maps here.
    pub timeout: Option<Duration>,
    pub http: Client,
}

impl HttpClientBase {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            endpoint,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            timeout: Some(timeout).filter(|t| !t.is_zero()),
            http: Client::new(),
        }
    }

    /// Build URL from endpoint and path
    pub fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Post JSON, with bearer auth when a key is configured
    pub async fn post_json<Req, Res>(&self, url: &str, body: &Req) -> Result<Res, ModelError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let mut request = self.http.post(url).json(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        self.authorize(request)
            .send()
            .await
            .map_err(|e| ModelError::network(&self.endpoint, e))?
            .error_for_status()
            .map_err(|e| ModelError::network(&self.endpoint, e))?
            .json()
            .await
            .map_err(|e| ModelError::network(&self.endpoint, e))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.api_key.as_deref() {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}
