//! HTTP client for streaming feature collections.

use crate::progress::download_percent;
use crate::query::{DEFAULT_MAX_FEATURES, DEFAULT_OUTPUT_FORMAT, feature_query_url};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use geoport_types::{DecodeError, ExportError, FeatureCollection};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration for the feature client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Total time allowed for one fetch, body included.
    pub timeout: Duration,
    /// Time allowed to establish the connection.
    pub connect_timeout: Duration,
    /// Maximum number of features requested from the service.
    pub max_features: u32,
    /// Output encoding requested from the service.
    pub output_format: String,
    /// User agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            max_features: DEFAULT_MAX_FEATURES,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            user_agent: format!("geoport/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Errors that can occur while fetching a layer.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not finish within the configured timeout.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Server returned a non-success status.
    #[error("server returned HTTP {status}")]
    ServerError {
        /// HTTP status code.
        status: u16,
    },

    /// The body is not a feature collection.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The decode task panicked or was aborted.
    #[error("decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<FetchError> for ExportError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::ServerError { status } => Self::http_status(status),
            FetchError::Decode(decode) => decode.into(),
            FetchError::Task(join) => Self::DecodeFailed(join.to_string()),
            other => Self::FetchFailed {
                status: None,
                reason: other.to_string(),
            },
        }
    }
}

/// HTTP client that retrieves feature collections from a feature service.
///
/// Each fetch is a single GET; there is no retry. A failed fetch is
/// reported to the caller, which decides whether to resubmit.
#[derive(Debug, Clone)]
pub struct FeatureClient {
    client: Client,
    config: FetchConfig,
}

impl FeatureClient {
    /// Creates a new feature client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: FetchConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(true)
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(FetchConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Downloads a layer's raw response body.
    ///
    /// `on_progress` is called after every received chunk with the job
    /// progress computed by [`download_percent`].
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, or a non-success
    /// status.
    pub async fn fetch_bytes<F>(
        &self,
        endpoint: &Url,
        layer: &str,
        mut on_progress: F,
    ) -> Result<Bytes, FetchError>
    where
        F: FnMut(u8) + Send,
    {
        let url = feature_query_url(
            endpoint,
            layer,
            &self.config.output_format,
            self.config.max_features,
        );
        tracing::debug!(%url, layer, "Requesting features");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError {
                status: status.as_u16(),
            });
        }

        let total = response.content_length();
        let capacity = total.map_or(0, |len| len.min(64 * 1024 * 1024) as usize);
        let mut body = BytesMut::with_capacity(capacity);
        let mut chunks = response.bytes_stream();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| self.classify(e))?;
            body.extend_from_slice(&chunk);
            let percent = download_percent(body.len() as u64, total);
            tracing::trace!(layer, bytes = body.len(), percent, "Received chunk");
            on_progress(percent);
        }

        tracing::debug!(layer, bytes = body.len(), "Download finished");
        Ok(body.freeze())
    }

    /// Downloads a layer and decodes it into a feature collection.
    ///
    /// Decoding runs on the blocking thread pool so large documents do not
    /// stall the async executor.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails or the body is not a feature
    /// collection.
    pub async fn fetch<F>(
        &self,
        endpoint: &Url,
        layer: &str,
        on_progress: F,
    ) -> Result<FeatureCollection, FetchError>
    where
        F: FnMut(u8) + Send,
    {
        let body = self.fetch_bytes(endpoint, layer, on_progress).await?;
        let collection =
            tokio::task::spawn_blocking(move || FeatureCollection::from_slice(&body)).await??;
        Ok(collection)
    }

    /// Maps timeouts onto [`FetchError::Timeout`].
    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.config.timeout)
        } else {
            FetchError::Http(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::UNKNOWN_LENGTH;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn two_parks() -> serde_json::Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}, "properties": {"name": "A"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [3.0, 4.0]}, "properties": {}}
            ]
        })
    }

    fn endpoint(server: &MockServer) -> Url {
        Url::parse(&format!("{}/wfs", server.uri())).unwrap()
    }

    /// Serves one response in two chunks without a Content-Length header.
    async fn serve_chunked(body: String) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }

            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
                )
                .await
                .unwrap();
            let (head, tail) = body.split_at(body.len() / 2);
            for chunk in [head, tail] {
                let frame = format!("{:x}\r\n{chunk}\r\n", chunk.len());
                socket.write_all(frame.as_bytes()).await.unwrap();
                socket.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            socket.write_all(b"0\r\n\r\n").await.unwrap();
        });
        Url::parse(&format!("http://{addr}/wfs")).unwrap()
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.max_features, 50_000);
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert_eq!(config.output_format, "application/json");
        assert!(config.user_agent.starts_with("geoport/"));
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = FeatureClient::with_defaults();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_sends_feature_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wfs"))
            .and(query_param("service", "WFS"))
            .and(query_param("request", "GetFeature"))
            .and(query_param("typeNames", "parks"))
            .and(query_param("count", "50000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_parks()))
            .expect(1)
            .mount(&server)
            .await;

        let client = FeatureClient::with_defaults().unwrap();
        let collection = client.fetch(&endpoint(&server), "parks", |_| {}).await.unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.features[0].property("name"), Some(&json!("A")));
    }

    #[tokio::test]
    async fn test_progress_within_download_band() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_parks()))
            .mount(&server)
            .await;

        let client = FeatureClient::with_defaults().unwrap();
        let mut seen = Vec::new();
        client
            .fetch_bytes(&endpoint(&server), "parks", |p| seen.push(p))
            .await
            .unwrap();

        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.iter().all(|p| (10..=80).contains(p)));
        assert_eq!(seen.last(), Some(&80));
    }

    #[tokio::test]
    async fn test_unknown_length_holds_progress() {
        let endpoint = serve_chunked(two_parks().to_string()).await;
        let client = FeatureClient::with_defaults().unwrap();

        let mut seen = Vec::new();
        let collection = client
            .fetch(&endpoint, "parks", |p| seen.push(p))
            .await
            .unwrap();

        assert_eq!(collection.len(), 2);
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|&p| p == UNKNOWN_LENGTH), "{seen:?}");
    }

    #[tokio::test]
    async fn test_server_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = FeatureClient::with_defaults().unwrap();
        let mut calls = 0;
        let err = client
            .fetch(&endpoint(&server), "parks", |_| calls += 1)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::ServerError { status: 503 }));
        assert_eq!(calls, 0);

        let export: ExportError = err.into();
        assert_eq!(export.status(), Some(503));
        assert!(export.to_string().starts_with("Failed to fetch"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<ExceptionReport/>"))
            .mount(&server)
            .await;

        let client = FeatureClient::with_defaults().unwrap();
        let err = client
            .fetch(&endpoint(&server), "parks", |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Decode(DecodeError::Json(_))));
        assert!(matches!(ExportError::from(err), ExportError::DecodeFailed(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(two_parks())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config = FetchConfig {
            timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let client = FeatureClient::new(config).unwrap();
        let err = client
            .fetch(&endpoint(&server), "parks", |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Timeout(_)));
        let export: ExportError = err.into();
        assert_eq!(export.status(), None);
        assert!(export.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_max_features_configurable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("count", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_parks()))
            .expect(1)
            .mount(&server)
            .await;

        let config = FetchConfig {
            max_features: 10,
            ..Default::default()
        };
        let client = FeatureClient::new(config).unwrap();
        assert!(client.fetch(&endpoint(&server), "parks", |_| {}).await.is_ok());
    }
}
