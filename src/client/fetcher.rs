//! Client fetch boundary.
//!
//! GET reads respect the server cache; POST is used for forced re-reads and
//! for creates; PUT and DELETE for the other mutations.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::error::FetchError;

// == Fetcher ==
/// Sends a request to an endpoint and returns the unwrapped response data.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, FetchError>;

    /// Cache-respecting read.
    async fn get(&self, endpoint: &str) -> Result<Value, FetchError> {
        self.request(Method::GET, endpoint, None).await
    }

    async fn post(&self, endpoint: &str, body: Option<Value>) -> Result<Value, FetchError> {
        self.request(Method::POST, endpoint, body).await
    }
}

// == HTTP Fetcher ==
/// [`Fetcher`] over HTTP that understands the server's response envelope.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpFetcher {
    /// Creates a fetcher resolving endpoints against `base_url`.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, FetchError> {
        let mut base_url =
            Url::parse(base_url).map_err(|err| FetchError::Transport(err.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, endpoint: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|err| FetchError::Transport(err.to_string()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, FetchError> {
        let url = self.resolve(endpoint)?;
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: error_message(&bytes),
            });
        }

        let body: Value =
            serde_json::from_slice(&bytes).map_err(|err| FetchError::Decode(err.to_string()))?;
        unwrap_envelope(body)
    }
}

/// Extracts `data` from `{ success: true, data }`. Bodies without the
/// envelope are returned whole.
pub fn unwrap_envelope(body: Value) -> Result<Value, FetchError> {
    match body {
        Value::Object(mut fields) => match fields.get("success").and_then(Value::as_bool) {
            Some(true) => Ok(fields.remove("data").unwrap_or(Value::Null)),
            Some(false) => Err(FetchError::Decode(
                fields
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("request reported failure")
                    .to_string(),
            )),
            None => Ok(Value::Object(fields)),
        },
        other => Ok(other),
    }
}

fn error_message(bytes: &[u8]) -> String {
    serde_json::from_slice::<Value>(bytes)
        .ok()
        .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_envelope() {
        assert_eq!(
            unwrap_envelope(json!({"success": true, "data": [1], "cached": true})),
            Ok(json!([1]))
        );
        assert_eq!(unwrap_envelope(json!({"status": "ok"})), Ok(json!({"status": "ok"})));
        assert!(matches!(
            unwrap_envelope(json!({"success": false, "error": "nope"})),
            Err(FetchError::Decode(msg)) if msg == "nope"
        ));
    }

    #[test]
    fn test_error_message_prefers_envelope() {
        assert_eq!(error_message(br#"{"success":false,"error":"items/1 not found"}"#), "items/1 not found");
        assert_eq!(error_message(b"Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_resolve_keeps_base_path() {
        let fetcher = HttpFetcher::new("http://localhost:3000/v1").unwrap();
        assert_eq!(
            fetcher.resolve("/api/items").unwrap().as_str(),
            "http://localhost:3000/v1/api/items"
        );
        assert_eq!(
            fetcher.resolve("api/items?force=true").unwrap().as_str(),
            "http://localhost:3000/v1/api/items?force=true"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpFetcher::new("not a url"),
            Err(FetchError::Transport(_))
        ));
    }
}
