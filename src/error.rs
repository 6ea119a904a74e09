use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyWeatherError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, PolicyWeatherError>;

/// Why a single event source contributed nothing to a reconciliation.
///
/// Source failures are expected and absorbed by the reconciler; they are
/// carried as values rather than propagated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("source timed out after {0}s")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("unparseable response: {0}")]
    InvalidResponse(String),

    #[error("source not configured: {0}")]
    NotConfigured(String),
}

impl SourceError {
    /// Map an HTTP client error. A client-side timeout is reported as
    /// `Timeout`, the same as a timeout applied around the whole call.
    pub fn from_http(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(timeout.as_secs())
        } else if let Some(status) = err.status() {
            SourceError::Status(status.as_u16())
        } else {
            SourceError::Transport(err.to_string())
        }
    }

    /// Map a collaborator error onto a source failure.
    pub fn from_collaborator(err: PolicyWeatherError, timeout: Duration) -> Self {
        match err {
            PolicyWeatherError::Http(e) => SourceError::from_http(e, timeout),
            PolicyWeatherError::Json(e) => SourceError::InvalidResponse(e.to_string()),
            PolicyWeatherError::UpstreamStatus { status, .. } => SourceError::Status(status),
            PolicyWeatherError::InvalidResponse(msg) => SourceError::InvalidResponse(msg),
            PolicyWeatherError::Config(msg) => SourceError::NotConfigured(msg),
            other => SourceError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Accepts connections and never answers them.
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_client_timeout_maps_to_timeout() {
        let url = silent_server().await;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();

        let err = client.get(&url).send().await.unwrap_err();
        assert_eq!(
            SourceError::from_http(err, Duration::from_secs(30)),
            SourceError::Timeout(30)
        );
    }

    #[test]
    fn test_collaborator_errors_map_to_source_failures() {
        let timeout = Duration::from_secs(30);
        assert_eq!(
            SourceError::from_collaborator(
                PolicyWeatherError::UpstreamStatus { status: 429, body: String::new() },
                timeout
            ),
            SourceError::Status(429)
        );
        assert_eq!(
            SourceError::from_collaborator(PolicyWeatherError::Config("no key".into()), timeout),
            SourceError::NotConfigured("no key".into())
        );
        assert_eq!(
            SourceError::from_collaborator(PolicyWeatherError::InvalidResponse("prose".into()), timeout),
            SourceError::InvalidResponse("prose".into())
        );
    }
}
