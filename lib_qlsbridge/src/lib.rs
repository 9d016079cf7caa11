//! # QLS Bridge Library
//!
//! Shared building blocks for the QLStats ranking bridge: a generic JSON
//! retrieval client, the QLStats upstream model and client, the concurrent
//! ranking aggregation engine and the process logging setup.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

// Declare the modules to re-export
pub mod core;
#[cfg(feature = "loggers")]
pub mod loggers;
pub mod qlstats;
pub mod retrieve;

// Re-export the types most callers need
pub use crate::core::address::{resolve_all, AddressError, ServerAddress};
pub use crate::core::aggregator::{AggregationResult, Aggregator, DeadlineExceeded};
pub use crate::core::source::RankingSource;
pub use crate::qlstats::apicall::QlStatsApi;
pub use crate::qlstats::model::{PlayerRanking, ServerSummary};
pub use crate::retrieve::ky_http::RetrieveError;
