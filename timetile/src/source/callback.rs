//! Callback-driven data source.
//!
//! Adapts a host that answers fetches through callbacks (a browser bridge,
//! an existing request queue, a test harness) to the future-based
//! [`DataSource`] contract. The host receives a [`FetchResponder`] per fetch
//! and answers it exactly once; the type consumes itself on answer, so a
//! second answer cannot be expressed.

use std::fmt;

use tokio::sync::oneshot;

use super::{BoxFuture, DataSource, FetchError, FetchResult};
use crate::address::TileAddress;
use crate::tile::TilePayload;

/// One-shot answer handle for a single fetch.
///
/// Dropping it unanswered resolves the fetch with [`FetchError::Dropped`].
pub struct FetchResponder {
    address: TileAddress,
    tx: oneshot::Sender<FetchResult>,
}

impl FetchResponder {
    /// Address this responder answers for.
    pub fn address(&self) -> TileAddress {
        self.address
    }

    /// Answer with a payload.
    pub fn succeed(self, payload: TilePayload) {
        self.respond(Ok(payload));
    }

    /// Answer with a failure.
    pub fn fail(self, error: FetchError) {
        self.respond(Err(error));
    }

    /// Answer with an arbitrary result.
    pub fn respond(self, result: FetchResult) {
        // The receiver is gone only if the scheduler was dropped.
        let _ = self.tx.send(result);
    }
}

impl fmt::Debug for FetchResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponder")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Data source that hands every fetch to a callback.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use timetile::source::{CallbackSource, FetchResponder};
///
/// let queue: Arc<Mutex<Vec<FetchResponder>>> = Arc::default();
/// let sink = Arc::clone(&queue);
/// let source = CallbackSource::new("bridge", move |responder| {
///     sink.lock().unwrap().push(responder);
/// });
/// # let _ = source;
/// ```
pub struct CallbackSource<F>
where
    F: Fn(FetchResponder) + Send + Sync,
{
    name: String,
    callback: F,
}

impl<F> CallbackSource<F>
where
    F: Fn(FetchResponder) + Send + Sync,
{
    /// Create a source that forwards fetches to `callback`.
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> DataSource for CallbackSource<F>
where
    F: Fn(FetchResponder) + Send + Sync,
{
    fn fetch(&self, address: TileAddress) -> BoxFuture<'static, FetchResult> {
        let (tx, rx) = oneshot::channel();
        (self.callback)(FetchResponder { address, tx });
        Box::pin(async move { rx.await.unwrap_or(Err(FetchError::Dropped(address))) })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
