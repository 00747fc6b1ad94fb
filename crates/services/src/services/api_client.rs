//! REST transport for the operations backend.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::query_key::QueryKey;

const CONNECTIVITY_MESSAGE: &str = "Unable to reach the server. Check your connection and try again.";
const UNEXPECTED_RESPONSE_MESSAGE: &str = "The server sent a response the console could not read.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("json error: {0}")]
    Serde(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Returns true if the error is transient and a read may be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }

    /// Text shown to the operator. Server messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            Self::Transport(_) | Self::Timeout => CONNECTIVITY_MESSAGE.to_string(),
            Self::Serde(_) => UNEXPECTED_RESPONSE_MESSAGE.to_string(),
            Self::InvalidUrl(url) => format!("Invalid server address: {url}"),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Pulls the human readable message out of a failed response body.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty());

    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    }
}

/// Client for the backend REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    fetch_retries: usize,
}

impl ApiClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        // Paths are joined relative to the base, so it must end with a slash.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent(concat!("ops-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            fetch_retries: 0,
        })
    }

    /// Retry transient read failures up to `retries` times. Writes are never retried.
    pub fn with_fetch_retries(mut self, retries: usize) -> Self {
        self.fetch_retries = retries;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url_for(&self, key: &QueryKey) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(&key.path())
            .map_err(|e| ApiError::InvalidUrl(format!("{key}: {e}")))?;
        if !key.filters().is_empty() {
            url.query_pairs_mut().extend_pairs(key.filters());
        }
        Ok(url)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<T, ApiError> {
        let url = self.url_for(key)?;
        let attempt = || async {
            let res = self.send(self.http.get(url.clone())).await?;
            decode(res).await
        };

        if self.fetch_retries == 0 {
            return attempt().await;
        }

        attempt
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(250))
                    .with_max_delay(Duration::from_secs(5))
                    .with_max_times(self.fetch_retries)
                    .with_jitter(),
            )
            .when(|e: &ApiError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    key = %key,
                    "read failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    pub async fn post_json<B, T>(&self, key: &QueryKey, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_for(key)?;
        let res = self.send(self.http.post(url).json(body)).await?;
        decode(res).await
    }

    pub async fn patch_json<B, T>(&self, key: &QueryKey, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_for(key)?;
        let res = self.send(self.http.patch(url).json(body)).await?;
        decode(res).await
    }

    /// DELETE; any response body is ignored
    pub async fn delete(&self, key: &QueryKey) -> Result<(), ApiError> {
        let url = self.url_for(key)?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let res = request.send().await.map_err(map_reqwest_error)?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let url = res.url().clone();
        let body = res.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        debug!(%url, status = status.as_u16(), %message, "request rejected");
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ApiError> {
    let bytes = res.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Serde(e.to_string()))
}

fn map_reqwest_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_decode() {
        ApiError::Serde(e.to_string())
    } else {
        ApiError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_message_then_error_then_raw_text() {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(
            error_message(status, r#"{"message":"Amount is required"}"#),
            "Amount is required"
        );
        assert_eq!(error_message(status, r#"{"error":"Duplicate slug"}"#), "Duplicate slug");
        assert_eq!(error_message(status, "upstream exploded\n"), "upstream exploded");
        assert_eq!(error_message(status, ""), "Internal Server Error");
    }

    #[test]
    fn test_only_transient_errors_are_retried() {
        assert!(ApiError::Timeout.should_retry());
        assert!(ApiError::Transport("reset".into()).should_retry());
        assert!(
            ApiError::Http {
                status: 503,
                message: "busy".into()
            }
            .should_retry()
        );
        assert!(
            !ApiError::Http {
                status: 400,
                message: "bad".into()
            }
            .should_retry()
        );
        assert!(!ApiError::Serde("eof".into()).should_retry());
    }

    #[test]
    fn test_user_message_passes_server_text_through() {
        let err = ApiError::Http {
            status: 422,
            message: "Frequency must be monthly, quarterly or yearly".into(),
        };
        assert_eq!(err.user_message(), "Frequency must be monthly, quarterly or yearly");
        assert_eq!(ApiError::Timeout.user_message(), CONNECTIVITY_MESSAGE);
    }

    #[test]
    fn test_url_for_joins_path_and_filters() {
        let client = ApiClient::new("http://localhost:5000/app").unwrap();
        let key = QueryKey::new("/api/fixed-costs").filter("locationId", "abc");
        assert_eq!(
            client.url_for(&key).unwrap().as_str(),
            "http://localhost:5000/app/api/fixed-costs?locationId=abc"
        );

        let plain = QueryKey::new("/api/staff").child("42");
        assert_eq!(
            client.url_for(&plain).unwrap().as_str(),
            "http://localhost:5000/app/api/staff/42"
        );
    }

    #[test]
    fn test_rejects_unparseable_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
    }
}
