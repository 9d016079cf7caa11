//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous JSON API client wrapper around `reqwest`.
//! It joins relative paths onto a base URL and standardizes how statuses,
//! bodies and decode failures are reported to the upstream-specific clients.
//!
//! The client never retries. One call is one request.

use reqwest::Method;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

/// User agent sent with every outbound request.
const USER_AGENT: &str = concat!("qlsbridge/", env!("CARGO_PKG_VERSION"));

/// # Retrieve Error
///
/// Everything that can go wrong while fetching and decoding one JSON document.
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The base URL or a joined path is not a valid absolute URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Connection, TLS, or body transfer failure.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("Upstream returned HTTP {status}")]
    Status {
        /// The numeric HTTP status code.
        status: u16,
        /// The raw body returned with the error status, if readable.
        body: Option<String>,
    },

    /// The body was received but is not the expected JSON shape.
    #[error("Failed to decode upstream payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A standardized container for API responses.
///
/// This struct wraps the deserialized data along with the status of the
/// HTTP transaction.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The successfully deserialized response body, if any.
    pub data: Option<T>,
    /// The raw error body returned by the server if the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
}

impl<T> ApiResponse<T> {
    /// Converts the response into its decoded body, turning a non-2xx status
    /// into [`RetrieveError::Status`].
    pub fn into_data(self) -> Result<T, RetrieveError> {
        match self.data {
            Some(data) if self.success => Ok(data),
            _ => Err(RetrieveError::Status {
                status: self.status,
                body: self.error_body,
            }),
        }
    }
}

/// A JSON-over-HTTP client bound to one base URL.
///
/// Cloning is cheap: the underlying `reqwest::Client` shares its connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The underlying connection-pooling client.
    inner: reqwest::Client,
    /// The base URL to which all relative paths are joined.
    base_url: Url,
}

impl ApiClient {
    /// Creates a new `ApiClient` for `base_url`.
    ///
    /// A missing trailing slash is added so that relative paths are appended
    /// to the base path instead of replacing its last segment.
    ///
    /// # Errors
    /// Returns [`RetrieveError::Url`] if `base_url` is not an absolute URL and
    /// [`RetrieveError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, RetrieveError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let url = Url::parse(&normalized)?;

        let inner = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            inner,
            base_url: url,
        })
    }

    /// The base URL all request paths are joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `path` against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url, RetrieveError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Performs a generic HTTP request and handles the response.
    ///
    /// A non-2xx status is not an error at this level: it is reported through
    /// `ApiResponse::success` with the raw body in `error_body`.
    ///
    /// # Errors
    /// Returns an error if URL joining, the network exchange or JSON decoding
    /// of a 2xx body fails.
    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<ApiResponse<T>, RetrieveError>
    where
        T: DeserializeOwned,
    {
        let full_url = self.url_for(path)?;
        let response = self.inner.request(method, full_url).send().await?;
        let status = response.status();

        if status.is_success() {
            // Body transfer and decoding are reported separately.
            let bytes = response.bytes().await?;
            let data = serde_json::from_slice::<T>(&bytes)?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
            })
        } else {
            let error_text = response.text().await.ok();
            Ok(ApiResponse {
                data: None,
                error_body: error_text,
                status: status.as_u16(),
                success: false,
            })
        }
    }

    /// GETs `path` and decodes a 2xx JSON body into `T`.
    pub async fn get_json<T>(&self, path: &str) -> Result<T, RetrieveError>
    where
        T: DeserializeOwned,
    {
        self.request::<T>(Method::GET, path).await?.into_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_without_trailing_slash_keeps_its_path() {
        let client = ApiClient::new("http://api.example.net/v1").unwrap();
        let url = client.url_for("api/server/skillrating").unwrap();
        assert_eq!(url.as_str(), "http://api.example.net/v1/api/server/skillrating");
    }

    #[test]
    fn leading_slash_in_path_does_not_escape_base() {
        let client = ApiClient::new("http://api.example.net/v1/").unwrap();
        let url = client.url_for("/api/server/1.2.3.4:27960/players").unwrap();
        assert_eq!(url.as_str(), "http://api.example.net/v1/api/server/1.2.3.4:27960/players");
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let err = ApiClient::new("not a url").unwrap_err();
        assert!(matches!(err, RetrieveError::Url(_)));
    }

    #[test]
    fn non_success_response_converts_to_status_error() {
        let response: ApiResponse<serde_json::Value> = ApiResponse {
            data: None,
            error_body: Some("boom".into()),
            status: 502,
            success: false,
        };
        match response.into_data() {
            Err(RetrieveError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body.as_deref(), Some("boom"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
