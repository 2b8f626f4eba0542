//! Data source trait and error types.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::address::TileAddress;
use crate::tile::TilePayload;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of one fetch attempt.
pub type FetchResult = Result<TilePayload, FetchError>;

/// Reasons a fetch attempt fails.
///
/// All of these are treated as transient by the scheduler and retried
/// within its budget.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The responder for a callback fetch was dropped without answering.
    #[error("Fetch for {0} was dropped without a response")]
    Dropped(TileAddress),

    /// Failure injected by a test or synthetic source.
    #[error("Injected failure for {0}")]
    Injected(TileAddress),

    /// Any other source-specific failure.
    #[error("Source error: {0}")]
    Source(String),
}

/// Asynchronous tile fetch capability.
///
/// The scheduler calls [`fetch`](DataSource::fetch) once per attempt; each call
/// counts as one invocation, even though the returned future does no work
/// until it is polled. The future must resolve exactly once. A future that
/// never resolves leaves its address pending for the scheduler's lifetime.
///
/// # Dyn Compatibility
///
/// Returns a boxed `'static` future so implementations can be used as
/// `Arc<dyn DataSource>` and the future can outlive the borrow of `self`.
pub trait DataSource: Send + Sync {
    /// Start fetching the tile at `address`.
    fn fetch(&self, address: TileAddress) -> BoxFuture<'static, FetchResult>;

    /// Human-readable name, for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let address = TileAddress::new(1, 2).unwrap();
        assert_eq!(
            FetchError::Injected(address).to_string(),
            "Injected failure for L1@2"
        );

        let err = FetchError::Status {
            status: 503,
            url: "http://example.com/1.2.json".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("1.2.json"));
    }
}
