//! The seam between the aggregation engine and the upstream ranking service.

use std::future::Future;

use crate::core::address::ServerAddress;
use crate::qlstats::model::{PlayerRanking, ServerSummary};
use crate::retrieve::ky_http::RetrieveError;

/// Something that can fetch per-server player rankings and the server
/// directory. [`crate::qlstats::apicall::QlStatsApi`] is the production
/// implementation.
///
/// Implementations make exactly one attempt per call. Any failure, whether
/// the server is unreachable or the payload is garbage, is reported as a
/// single `Err`.
pub trait RankingSource: Send + Sync + 'static {
    /// Fetches one server's players, each already attributed to `addr`, in
    /// upstream order.
    fn fetch_players(
        &self,
        addr: &ServerAddress,
    ) -> impl Future<Output = Result<Vec<PlayerRanking>, RetrieveError>> + Send;

    /// Fetches the full ranked server directory.
    fn fetch_servers(&self) -> impl Future<Output = Result<Vec<ServerSummary>, RetrieveError>> + Send;
}
