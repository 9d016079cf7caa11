use tracing::{debug, error};

use crate::core::address::ServerAddress;
use crate::core::source::RankingSource;
use crate::qlstats::model::{PlayerRanking, PlayersDocument, ServerSummary};
use crate::retrieve::ky_http::{ApiClient, RetrieveError};

/// Public QLStats API root.
pub const DEFAULT_BASE_URL: &str = "http://api.qlstats.net/";

/// Path of the ranked server directory.
const SKILLRATING_PATH: &str = "api/server/skillrating";

/// Client for the two QLStats endpoints the bridge uses. One request per call.
#[derive(Debug, Clone)]
pub struct QlStatsApi {
    client: ApiClient,
}

impl QlStatsApi {
    /// Initialize against `base_url` (see [`DEFAULT_BASE_URL`]).
    pub fn new(base_url: &str) -> Result<Self, RetrieveError> {
        Ok(Self {
            client: ApiClient::new(base_url)?,
        })
    }

    /// Base URL every request is joined onto.
    pub fn base_url(&self) -> &str {
        self.client.base_url().as_str()
    }

    /// GET `api/server/{addr}/players`, players tagged with `addr`.
    pub async fn fetch_players(&self, addr: &ServerAddress) -> Result<Vec<PlayerRanking>, RetrieveError> {
        let server = addr.to_string();
        let path = format!("api/server/{}/players", server);

        let doc: PlayersDocument = self.client.get_json(&path).await?;
        debug!(server = %server, ok = doc.ok, "Fetched {} ranked players", doc.players.len());

        Ok(doc
            .players
            .into_iter()
            .map(|p| p.attributed_to(&server))
            .collect())
    }

    /// GET `api/server/skillrating`, entries with `ip` filled.
    pub async fn fetch_servers(&self) -> Result<Vec<ServerSummary>, RetrieveError> {
        let servers: Vec<ServerSummary> = self
            .client
            .get_json(SKILLRATING_PATH)
            .await
            .inspect_err(|e| error!("Error getting ranked servers: {}", e))?;

        Ok(servers.into_iter().map(ServerSummary::with_ip).collect())
    }
}

impl RankingSource for QlStatsApi {
    async fn fetch_players(&self, addr: &ServerAddress) -> Result<Vec<PlayerRanking>, RetrieveError> {
        QlStatsApi::fetch_players(self, addr).await
    }

    async fn fetch_servers(&self) -> Result<Vec<ServerSummary>, RetrieveError> {
        QlStatsApi::fetch_servers(self).await
    }
}
