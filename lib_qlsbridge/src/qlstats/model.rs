//! # QLStats Wire Model
//!
//! Data structures for the two QLStats endpoints the bridge consumes
//! (`/api/server/skillrating` and `/api/server/{addr}/players`) and for the
//! player records the bridge hands back to its own clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the QLStats ranked server directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSummary {
    /// `host:port` of the game server as reported upstream.
    pub server: String,
    /// Host part of `server`. Not sent upstream; filled by the bridge.
    #[serde(default)]
    pub ip: String,
    /// Game type tag (e.g. `ca`, `duel`).
    #[serde(default)]
    pub gt: String,
    /// Lowest player rating on the server.
    #[serde(default)]
    pub min: i64,
    /// Average player rating on the server.
    #[serde(default)]
    pub avg: i64,
    /// Highest player rating on the server.
    #[serde(default)]
    pub max: i64,
    /// Player count.
    #[serde(default)]
    pub pc: i64,
    /// Spectator count.
    #[serde(default)]
    pub sc: i64,
    /// Bot count.
    #[serde(default)]
    pub bc: i64,
}

impl ServerSummary {
    /// A server is populated when it has at least one player or spectator.
    pub fn is_populated(&self) -> bool {
        self.pc > 0 || self.sc > 0
    }

    /// Fills `ip` from the host part of `server`.
    pub fn with_ip(mut self) -> Self {
        self.ip = host_part(&self.server).to_string();
        self
    }
}

/// One ranked player, as returned by QLStats and re-emitted by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRanking {
    /// Stable player identity. Empty when upstream omits it.
    #[serde(default, rename = "steamID")]
    pub steam_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Team indicator.
    #[serde(default)]
    pub team: i64,
    /// Skill rating.
    #[serde(default)]
    pub rating: i64,
    /// Rating deviation. Upstream sends `rd`; bridge clients have always
    /// received it as `round`.
    #[serde(
        default,
        rename(serialize = "round", deserialize = "rd"),
        alias = "round"
    )]
    pub rd: i64,
    /// Upstream timestamp.
    #[serde(default)]
    pub time: i64,
    /// `ip:port` of the server this player was fetched from.
    #[serde(default)]
    pub server: String,
    /// Host part of `server`.
    #[serde(default)]
    pub ip: String,
}

impl PlayerRanking {
    /// Attributes this record to the server it was fetched from.
    pub fn attributed_to(mut self, server: &str) -> Self {
        self.ip = host_part(server).to_string();
        self.server = server.to_string();
        self
    }
}

/// Server info block attached to a players document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub gt: String,
    #[serde(default)]
    pub min: i64,
    #[serde(default)]
    pub avg: i64,
    #[serde(default)]
    pub max: i64,
    #[serde(default)]
    pub pc: i64,
    #[serde(default)]
    pub sc: i64,
    #[serde(default)]
    pub bc: i64,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub map: Option<String>,
    /// QLStats sends this as either a string or a number.
    #[serde(default)]
    pub mapstart: Value,
}

/// Payload of `/api/server/{addr}/players`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayersDocument {
    /// Upstream status flag. Decoded but not interpreted.
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub players: Vec<PlayerRanking>,
    #[serde(default, rename = "serverinfo", alias = "serverInfo")]
    pub server_info: Option<ServerInfo>,
}

/// Everything before the last `:` of a `host:port` string, or the whole
/// string if there is no port.
pub fn host_part(server: &str) -> &str {
    server.rsplit_once(':').map_or(server, |(host, _)| host)
}
