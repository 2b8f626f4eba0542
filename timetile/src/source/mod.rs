//! Tile data sources.
//!
//! A [`DataSource`] turns a [`TileAddress`](crate::address::TileAddress) into
//! a future that resolves with the tile payload or a failure. The scheduler
//! owns the futures; sources only start them.
//!
//! Implementations:
//!
//! - [`HttpSource`]: static tile server over HTTP
//! - [`CallbackSource`]: bridges callback-style hosts
//! - [`SyntheticSource`]: generated data with latency and failure injection

mod callback;
mod http;
mod synthetic;
mod types;

pub use callback::{CallbackSource, FetchResponder};
pub use http::{AsyncHttpClient, HttpSource, ReqwestClient, DEFAULT_TIMEOUT};
pub use synthetic::{SyntheticConfig, SyntheticSource, DEFAULT_POINTS_PER_TILE};
pub use types::{BoxFuture, DataSource, FetchError, FetchResult};
