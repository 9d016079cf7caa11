//! # Core Engine Module
//!
//! The ranking aggregation core of the bridge.
//!
//! ## Core Components:
//!
//! - **`address`**: Validated IPv4 `ip:port` server addresses and the resolver
//!   that turns raw caller strings into them.
//!
//! - **`source`**: The `RankingSource` trait, the seam between the engine and
//!   the upstream ranking service.
//!
//! - **`aggregator`**: The concurrent fan-out engine. It queries every
//!   requested server at once, merges partial results under a mutex and
//!   reports how many servers answered, optionally bounded by a deadline.

/// Server addresses and address resolution.
pub mod address;
/// Concurrent fan-out and merge of per-server rankings.
pub mod aggregator;
/// The upstream ranking source abstraction.
pub mod source;

// --- Public API Re-exports ---
pub use address::{resolve_all, AddressError, ServerAddress};
pub use aggregator::{AggregationResult, Aggregator, DeadlineExceeded};
pub use source::RankingSource;
