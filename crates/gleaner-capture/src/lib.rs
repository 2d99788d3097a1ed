//! gleaner-capture - response interception and relaying.
//!
//! The interceptor watches a feed of observed HTTP responses for the two
//! relation-list endpoint families, parses validated connection records out
//! of matching payloads, and hands batches to the relay. The relay gates on
//! relation pages, reports page context to the store, and forwards batches
//! fire-and-forget. Nothing here persists anything.

pub mod endpoints;
pub mod feed;
pub mod interceptor;
pub mod observed;
pub mod relay;
pub mod timeline;

pub use feed::ResponseFeed;
pub use interceptor::{CaptureStats, Interceptor};
pub use observed::{CaptureBatch, ObservedResponse};
pub use relay::Relay;
