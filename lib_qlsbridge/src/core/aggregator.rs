//! # Ranking Aggregation Engine
//!
//! Fans out one player-ranking fetch per requested server, merges whatever
//! comes back into a single [`AggregationResult`] and counts how many servers
//! answered.
//!
//! ## Concurrency
//!
//! - One `tokio::spawn`ed task per address, all started before any is awaited.
//!   Duplicates are fetched independently; there is no fan-out cap.
//! - A task that succeeds appends its players and bumps the success counter in
//!   one critical section over a shared [`Accumulator`]. A task that fails
//!   touches neither and never disturbs its siblings.
//! - [`Aggregator::aggregate`] is a full barrier: it returns only after every
//!   task has finished.
//! - [`Aggregator::aggregate_within`] races that barrier against a deadline.
//!   When the deadline wins, the join handles are dropped. That detaches the
//!   remaining tasks rather than aborting them; whatever they produce lands in
//!   an accumulator nobody reads any more.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::core::address::ServerAddress;
use crate::core::source::RankingSource;
use crate::qlstats::model::PlayerRanking;

/// The aggregation did not finish before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ranking aggregation exceeded its {deadline:?} deadline")]
pub struct DeadlineExceeded {
    pub deadline: Duration,
}

/// The merged outcome of one aggregation call.
///
/// `ranked_player_count` always equals `ranked_players.len()`, and
/// `ranked_players` is always serialized as an array, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    ranked_server_count: usize,
    ranked_player_count: usize,
    ranked_players: Vec<PlayerRanking>,
}

impl AggregationResult {
    /// Zero servers, zero players.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of servers whose fetch succeeded, including those with no players.
    pub fn ranked_server_count(&self) -> usize {
        self.ranked_server_count
    }

    pub fn ranked_player_count(&self) -> usize {
        self.ranked_player_count
    }

    pub fn ranked_players(&self) -> &[PlayerRanking] {
        &self.ranked_players
    }

    pub fn into_players(self) -> Vec<PlayerRanking> {
        self.ranked_players
    }
}

/// In-progress state shared by the tasks of one aggregation call.
#[derive(Debug, Default)]
struct Accumulator {
    players: Vec<PlayerRanking>,
    successful_servers: usize,
}

impl Accumulator {
    fn record_success(&mut self, players: Vec<PlayerRanking>) {
        self.players.extend(players);
        self.successful_servers += 1;
    }

    fn finish(self) -> AggregationResult {
        AggregationResult {
            ranked_server_count: self.successful_servers,
            ranked_player_count: self.players.len(),
            ranked_players: self.players,
        }
    }
}

/// Concurrent fan-out over a [`RankingSource`].
pub struct Aggregator<S> {
    source: Arc<S>,
}

impl<S> Clone for Aggregator<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: RankingSource> Aggregator<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// The source this aggregator fans out to.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Fetches every address concurrently and merges the results.
    ///
    /// Never fails: per-server failures only lower `ranked_server_count`.
    /// An empty `addresses` slice yields [`AggregationResult::empty`].
    pub async fn aggregate(&self, addresses: &[ServerAddress]) -> AggregationResult {
        if addresses.is_empty() {
            return AggregationResult::empty();
        }

        let shared = Arc::new(Mutex::new(Accumulator::default()));

        let handles: Vec<_> = addresses
            .iter()
            .copied()
            .map(|addr| {
                let source = Arc::clone(&self.source);
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    match source.fetch_players(&addr).await {
                        Ok(players) => {
                            let mut acc = shared.lock().unwrap_or_else(PoisonError::into_inner);
                            acc.record_success(players);
                        }
                        Err(e) => warn!(server = %addr, "Ranking fetch failed: {}", e),
                    }
                })
            })
            .collect();

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!("Ranking fetch task did not complete: {}", e);
            }
        }

        // Every task has finished; nothing else can touch the accumulator.
        let acc = std::mem::take(&mut *shared.lock().unwrap_or_else(PoisonError::into_inner));
        let result = acc.finish();
        debug!(
            "Aggregated {} players from {}/{} servers",
            result.ranked_player_count,
            result.ranked_server_count,
            addresses.len()
        );
        result
    }

    /// Like [`Aggregator::aggregate`], bounded by `deadline`.
    ///
    /// # Errors
    /// Returns [`DeadlineExceeded`] if any fetch is still pending when the
    /// deadline elapses. No partial result is returned in that case.
    pub async fn aggregate_within(
        &self,
        addresses: &[ServerAddress],
        deadline: Duration,
    ) -> Result<AggregationResult, DeadlineExceeded> {
        tokio::time::timeout(deadline, self.aggregate(addresses))
            .await
            .map_err(|_| {
                warn!("Ranking aggregation over {} servers timed out after {:?}", addresses.len(), deadline);
                DeadlineExceeded { deadline }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qlstats::model::ServerSummary;
    use crate::retrieve::ky_http::RetrieveError;
    use std::collections::{HashMap, HashSet};
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    enum Behavior {
        Players(Vec<PlayerRanking>, Duration),
        Fail(Duration),
        Panic,
        Hang,
    }

    #[derive(Default)]
    struct FakeSource {
        behaviors: HashMap<ServerAddress, Behavior>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn with(mut self, addr: ServerAddress, behavior: Behavior) -> Self {
            self.behaviors.insert(addr, behavior);
            self
        }
    }

    impl RankingSource for FakeSource {
        async fn fetch_players(
            &self,
            addr: &ServerAddress,
        ) -> Result<Vec<PlayerRanking>, RetrieveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviors.get(addr).cloned() {
                Some(Behavior::Players(players, delay)) => {
                    tokio::time::sleep(delay).await;
                    let server = addr.to_string();
                    Ok(players.into_iter().map(|p| p.attributed_to(&server)).collect())
                }
                Some(Behavior::Fail(delay)) => {
                    tokio::time::sleep(delay).await;
                    Err(RetrieveError::Status { status: 503, body: None })
                }
                Some(Behavior::Panic) => panic!("upstream fetch blew up"),
                Some(Behavior::Hang) => std::future::pending().await,
                None => Err(RetrieveError::Status { status: 404, body: None }),
            }
        }

        async fn fetch_servers(&self) -> Result<Vec<ServerSummary>, RetrieveError> {
            Ok(Vec::new())
        }
    }

    fn addr(n: u8) -> ServerAddress {
        ServerAddress::new(Ipv4Addr::new(10, 0, 0, n), 27960)
    }

    fn players(prefix: &str, count: usize) -> Vec<PlayerRanking> {
        (0..count)
            .map(|i| PlayerRanking {
                steam_id: format!("{prefix}-{i}"),
                name: format!("{prefix} player {i}"),
                team: (i % 2) as i64,
                rating: 1500 + i as i64,
                rd: 60,
                time: 1_500_000_000,
                server: String::new(),
                ip: String::new(),
            })
            .collect()
    }

    fn aggregator(source: FakeSource) -> Aggregator<FakeSource> {
        Aggregator::new(Arc::new(source))
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let agg = aggregator(FakeSource::default());
        let result = agg.aggregate(&[]).await;
        assert_eq!(result, AggregationResult::empty());
        assert_eq!(agg.source().calls.load(Ordering::SeqCst), 0);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"rankedServerCount": 0, "rankedPlayerCount": 0, "rankedPlayers": []})
        );
    }

    #[tokio::test]
    async fn all_successes_sum_players() {
        let source = FakeSource::default()
            .with(addr(1), Behavior::Players(players("a", 3), Duration::from_millis(5)))
            .with(addr(2), Behavior::Players(players("b", 2), Duration::ZERO))
            .with(addr(3), Behavior::Players(players("c", 4), Duration::from_millis(1)));
        let result = aggregator(source).aggregate(&[addr(1), addr(2), addr(3)]).await;

        assert_eq!(result.ranked_server_count(), 3);
        assert_eq!(result.ranked_player_count(), 9);
        assert_eq!(result.ranked_players().len(), 9);
    }

    #[tokio::test]
    async fn serialized_player_count_matches_player_list() {
        let source = FakeSource::default()
            .with(addr(1), Behavior::Players(players("a", 2), Duration::ZERO))
            .with(addr(2), Behavior::Fail(Duration::ZERO))
            .with(addr(3), Behavior::Players(players("c", 0), Duration::ZERO));
        let result = aggregator(source).aggregate(&[addr(1), addr(2), addr(3)]).await;

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["rankedServerCount"], 2);
        assert_eq!(json["rankedPlayerCount"], 2);
        assert_eq!(json["rankedPlayers"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failures_lower_server_count_only() {
        let source = FakeSource::default()
            .with(addr(1), Behavior::Players(players("a", 2), Duration::ZERO))
            .with(addr(2), Behavior::Fail(Duration::ZERO))
            .with(addr(3), Behavior::Panic);
        let result = aggregator(source).aggregate(&[addr(1), addr(2), addr(3), addr(4)]).await;

        assert_eq!(result.ranked_server_count(), 1);
        assert_eq!(result.ranked_player_count(), 2);
        assert!(result.ranked_players().iter().all(|p| p.server == "10.0.0.1:27960"));
        assert!(result.ranked_players().iter().all(|p| p.ip == "10.0.0.1"));
    }

    #[tokio::test]
    async fn empty_player_list_still_counts_as_a_server() {
        let source = FakeSource::default().with(addr(1), Behavior::Players(Vec::new(), Duration::ZERO));
        let result = aggregator(source).aggregate(&[addr(1)]).await;

        assert_eq!(result.ranked_server_count(), 1);
        assert_eq!(result.ranked_player_count(), 0);
    }

    #[tokio::test]
    async fn per_server_order_is_preserved() {
        let source = FakeSource::default()
            .with(addr(1), Behavior::Players(players("a", 5), Duration::from_millis(2)))
            .with(addr(2), Behavior::Players(players("b", 5), Duration::ZERO));
        let result = aggregator(source).aggregate(&[addr(1), addr(2)]).await;

        for prefix in ["a", "b"] {
            let ids: Vec<&str> = result
                .ranked_players()
                .iter()
                .filter(|p| p.steam_id.starts_with(prefix))
                .map(|p| p.steam_id.as_str())
                .collect();
            let expected: Vec<String> = (0..5).map(|i| format!("{prefix}-{i}")).collect();
            assert_eq!(ids, expected);
        }
    }

    #[tokio::test]
    async fn duplicate_addresses_are_fetched_independently() {
        let source = FakeSource::default().with(addr(1), Behavior::Players(players("a", 2), Duration::ZERO));
        let agg = aggregator(source);
        let result = agg.aggregate(&[addr(1), addr(1), addr(1)]).await;

        assert_eq!(agg.source().calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.ranked_server_count(), 3);
        assert_eq!(result.ranked_player_count(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn hundred_servers_half_failing_lose_no_updates() {
        let mut source = FakeSource::default();
        let mut addresses = Vec::new();
        let mut expected_players = 0;
        for n in 0..100u8 {
            let a = ServerAddress::new(Ipv4Addr::new(10, 1, 0, n), 27960);
            let jitter = Duration::from_millis(u64::from(n % 7));
            let behavior = if n % 2 == 0 {
                let count = usize::from(n % 5) + 1;
                expected_players += count;
                Behavior::Players(players(&format!("s{n}"), count), jitter)
            } else {
                Behavior::Fail(jitter)
            };
            source = source.with(a, behavior);
            addresses.push(a);
        }
        let agg = aggregator(source);

        for _ in 0..5 {
            let result = agg.aggregate(&addresses).await;
            assert_eq!(result.ranked_server_count(), 50);
            assert_eq!(result.ranked_player_count(), expected_players);

            let unique: HashSet<&str> =
                result.ranked_players().iter().map(|p| p.steam_id.as_str()).collect();
            assert_eq!(unique.len(), expected_players);
        }
    }

    #[tokio::test]
    async fn deadline_with_pending_fetches_returns_no_partial_result() {
        let mut source = FakeSource::default();
        let mut addresses = Vec::new();
        for n in 1..=10u8 {
            let behavior = if n <= 3 {
                Behavior::Hang
            } else {
                Behavior::Players(players(&format!("s{n}"), 1), Duration::ZERO)
            };
            source = source.with(addr(n), behavior);
            addresses.push(addr(n));
        }
        let deadline = Duration::from_millis(100);
        let err = aggregator(source)
            .aggregate_within(&addresses, deadline)
            .await
            .unwrap_err();

        assert_eq!(err, DeadlineExceeded { deadline });
    }

    #[tokio::test]
    async fn deadline_not_reached_returns_full_result() {
        let source = FakeSource::default()
            .with(addr(1), Behavior::Players(players("a", 2), Duration::from_millis(5)))
            .with(addr(2), Behavior::Fail(Duration::ZERO));
        let result = aggregator(source)
            .aggregate_within(&[addr(1), addr(2)], Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(result.ranked_server_count(), 1);
        assert_eq!(result.ranked_player_count(), 2);
    }

    #[tokio::test]
    async fn repeated_calls_give_identical_counts() {
        let source = FakeSource::default()
            .with(addr(1), Behavior::Players(players("a", 3), Duration::from_millis(3)))
            .with(addr(2), Behavior::Players(players("b", 1), Duration::ZERO))
            .with(addr(3), Behavior::Fail(Duration::from_millis(1)));
        let agg = aggregator(source);
        let addresses = [addr(1), addr(2), addr(3)];

        let first = agg.aggregate(&addresses).await;
        let second = agg.aggregate(&addresses).await;
        assert_eq!(first.ranked_server_count(), second.ranked_server_count());
        assert_eq!(first.ranked_player_count(), second.ranked_player_count());
    }
}
