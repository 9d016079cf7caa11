//! Directory-to-address filtering for the "all servers" view.

use crate::core::address::{resolve_all, ServerAddress};
use crate::qlstats::model::ServerSummary;

/// `server` fields of every directory entry with at least one player or
/// spectator, in directory order.
pub fn populated_servers(servers: &[ServerSummary]) -> Vec<&str> {
    servers
        .iter()
        .filter(|s| s.is_populated())
        .map(|s| s.server.as_str())
        .collect()
}

/// Resolved addresses of the populated entries. Host names go through DNS
/// like caller-supplied addresses; entries that do not resolve are dropped.
pub async fn populated_addresses(servers: &[ServerSummary]) -> Vec<ServerAddress> {
    resolve_all(&populated_servers(servers)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(server: &str, pc: i64, sc: i64, bc: i64) -> ServerSummary {
        ServerSummary {
            server: server.to_string(),
            ip: String::new(),
            gt: "ca".to_string(),
            min: 1000,
            avg: 1500,
            max: 2000,
            pc,
            sc,
            bc,
        }
    }

    #[test]
    fn keeps_servers_with_players_or_spectators() {
        let directory = vec![
            summary("1.1.1.1:27960", 4, 0, 0),
            summary("2.2.2.2:27960", 0, 0, 0),
            summary("3.3.3.3:27960", 0, 1, 0),
            summary("4.4.4.4:27960", 0, 0, 3),
        ];
        assert_eq!(populated_servers(&directory), ["1.1.1.1:27960", "3.3.3.3:27960"]);
    }

    #[tokio::test]
    async fn host_names_are_resolved_and_garbage_dropped() {
        let directory = vec![
            summary("localhost:27960", 8, 0, 0),
            summary("not an address", 3, 0, 0),
            summary("5.5.5.5:27961", 1, 0, 0),
        ];
        let kept = populated_addresses(&directory).await;
        assert_eq!(kept.len(), 2);
        assert!(kept[0].ip().is_loopback());
        assert_eq!(kept[0].port(), 27960);
        assert_eq!(kept[1], ServerAddress::parse("5.5.5.5:27961").unwrap());
    }

    #[tokio::test]
    async fn empty_directory_gives_no_addresses() {
        assert!(populated_addresses(&[]).await.is_empty());
    }
}
