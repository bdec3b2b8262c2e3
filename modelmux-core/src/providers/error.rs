//! Errors raised by provider backends

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure of a single provider call
///
/// The router treats every variant alike: any error, including a timeout,
/// moves the call on to the next fallback candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("credentials rejected: {0}")]
    Authentication(String),

    #[error("rate limited: {message}")]
    RateLimit {
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("request rejected: {0}")]
    InvalidRequest(String),

    /// Backend-specific error code and message
    #[error("backend error {code}: {message}")]
    Api { code: String, message: String },

    /// Milliseconds the router waited before giving up
    #[error("no answer within {0} ms")]
    Timeout(u64),

    /// A timeout raised by the transport itself, whose limit is not known here
    #[error("transport timed out: {0}")]
    TransportTimeout(String),

    #[error("malformed backend response: {0}")]
    Parse(String),

    #[error("unknown model: {0}")]
    ModelNotFound(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Map an HTTP status from a backend into the matching variant
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Authentication(message),
            404 => Self::ModelNotFound(message),
            429 => Self::RateLimit {
                message,
                retry_after_secs: None,
            },
            400 | 422 => Self::InvalidRequest(message),
            500..=599 => Self::Unavailable(message),
            _ => Self::Api {
                code: status.to_string(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::from_status(status.as_u16(), err.to_string()),
            None if err.is_timeout() => Self::TransportTimeout(err.to_string()),
            None => Self::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(401 => matches ProviderError::Authentication(_) ; "unauthorized")]
    #[test_case(404 => matches ProviderError::ModelNotFound(_) ; "not found")]
    #[test_case(429 => matches ProviderError::RateLimit { .. } ; "too many requests")]
    #[test_case(422 => matches ProviderError::InvalidRequest(_) ; "unprocessable")]
    #[test_case(503 => matches ProviderError::Unavailable(_) ; "service unavailable")]
    #[test_case(418 => matches ProviderError::Api { .. } ; "other status")]
    fn test_from_status(status: u16) -> ProviderError {
        ProviderError::from_status(status, "boom")
    }

    #[test]
    fn test_display_messages() {
        let err = ProviderError::RateLimit {
            message: "slow down".to_string(),
            retry_after_secs: Some(3),
        };
        assert_eq!(err.to_string(), "rate limited: slow down");
        assert_eq!(ProviderError::Timeout(1500).to_string(), "no answer within 1500 ms");
    }

    #[tokio::test]
    async fn test_reqwest_timeout_is_not_a_zero_limit() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::any())
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(50))
            .build()
            .unwrap();
        let err: ProviderError = client.get(server.uri()).send().await.unwrap_err().into();

        assert!(matches!(err, ProviderError::TransportTimeout(_)));
        assert!(err.to_string().starts_with("transport timed out"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ProviderError = parse_err.into();
        assert!(matches!(err, ProviderError::Parse(_)));
    }
}
