//! HTTP tile source.
//!
//! Fetches `{base_url}/{level}.{offset}.json` and decodes the body with
//! [`decode_payload`](crate::tile::decode_payload).

use std::sync::Arc;
use std::time::Duration;

use super::{BoxFuture, DataSource, FetchError, FetchResult};
use crate::address::TileAddress;
use crate::tile::{decode_payload, TilePayload};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for async HTTP GET.
///
/// Allows injecting a mock client in tests.
pub trait AsyncHttpClient: Send + Sync + 'static {
    /// Performs an HTTP GET request, returning the body on a 2xx status.
    fn get(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, FetchError>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, FetchError>> {
        let client = self.client.clone();
        let url = url.to_string();
        Box::pin(async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Http(format!("Request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| FetchError::Http(format!("Failed to read response: {}", e)))
        })
    }
}

/// Data source backed by a static tile server.
pub struct HttpSource<C: AsyncHttpClient> {
    base_url: String,
    client: Arc<C>,
}

impl HttpSource<ReqwestClient> {
    /// Source using a reqwest client with the given timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self::new(base_url, ReqwestClient::with_timeout(timeout)?))
    }
}

impl<C: AsyncHttpClient> HttpSource<C> {
    /// Source fetching from `base_url` with `client`.
    ///
    /// A trailing slash on `base_url` is ignored.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Arc::new(client),
        }
    }

    /// Base URL tiles are fetched from.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the tile at `address`.
    pub fn tile_url(&self, address: TileAddress) -> String {
        format!("{}/{}.json", self.base_url, address.key())
    }
}

/// Decode a response body; unparsable JSON is an empty tile, not a failure.
fn decode_body(address: TileAddress, body: &[u8]) -> TilePayload {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => decode_payload(&value),
        Err(e) => {
            tracing::debug!(tile = %address, error = %e, "Tile body is not JSON, treating as empty");
            TilePayload::Empty
        }
    }
}

impl<C: AsyncHttpClient> DataSource for HttpSource<C> {
    fn fetch(&self, address: TileAddress) -> BoxFuture<'static, FetchResult> {
        let url = self.tile_url(address);
        tracing::trace!(tile = %address, url = %url, "HTTP fetch");
        let request = self.client.get(&url);
        Box::pin(async move {
            let body = request.await?;
            Ok(decode_body(address, &body))
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use futures::FutureExt;
    use parking_lot::Mutex;

    /// Mock HTTP client for testing
    pub struct MockHttpClient {
        pub response: Result<Vec<u8>, FetchError>,
        pub requested: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        pub fn new(response: Result<Vec<u8>, FetchError>) -> Self {
            Self {
                response,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl AsyncHttpClient for MockHttpClient {
        fn get(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, FetchError>> {
            self.requested.lock().push(url.to_string());
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn fetch_now<C: AsyncHttpClient>(source: &HttpSource<C>, address: TileAddress) -> FetchResult {
        source.fetch(address).now_or_never().unwrap()
    }

    #[test]
    fn test_tile_url() {
        let source = HttpSource::new("http://tiles.local/chan/", MockHttpClient::new(Ok(vec![])));
        assert_eq!(source.base_url(), "http://tiles.local/chan");
        assert_eq!(
            source.tile_url(TileAddress::new(-3, 42).unwrap()),
            "http://tiles.local/chan/-3.42.json"
        );
    }

    #[test]
    fn test_fetch_points() {
        let body = br#"{"data": [[0.0, 1.0], [10.0, 2.0]]}"#.to_vec();
        let source = HttpSource::new("http://tiles.local", MockHttpClient::new(Ok(body)));
        let address = TileAddress::new(0, 0).unwrap();

        let payload = fetch_now(&source, address).unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(
            source.client.requested.lock().as_slice(),
            ["http://tiles.local/0.0.json"]
        );
    }

    #[test]
    fn test_fetch_garbage_is_empty() {
        let source = HttpSource::new(
            "http://tiles.local",
            MockHttpClient::new(Ok(b"<html>oops</html>".to_vec())),
        );
        let payload = fetch_now(&source, TileAddress::new(0, 0).unwrap()).unwrap();
        assert_eq!(payload, TilePayload::Empty);
    }

    #[test]
    fn test_fetch_error_propagates() {
        let error = FetchError::Status {
            status: 404,
            url: "http://tiles.local/0.0.json".to_string(),
        };
        let source = HttpSource::new("http://tiles.local", MockHttpClient::new(Err(error.clone())));
        assert_eq!(fetch_now(&source, TileAddress::new(0, 0).unwrap()), Err(error));
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::with_timeout(Duration::from_secs(5)).is_ok());
    }
}
