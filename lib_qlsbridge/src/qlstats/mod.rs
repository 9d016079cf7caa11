//! # QLStats API Integration Module
//!
//! This module provides a dedicated interface to the QLStats skill rating API,
//! the upstream service behind the bridge.
//!
//! ## Contained Modules:
//!
//! - **`apicall`**: The HTTP client for the per-server players endpoint and the
//!   ranked server directory. Implements `core::source::RankingSource`.
//!
//! - **`model`**: Serde models for the upstream payloads and for the player
//!   records the bridge re-emits with server attribution.
//!
//! - **`directory`**: The populated-server filter used when a caller asks for
//!   rankings of all servers.

/// Client for the QLStats players and directory endpoints.
pub mod apicall;
/// Populated-server filtering of the directory listing.
pub mod directory;
/// Upstream payload and bridge output models.
pub mod model;

pub use apicall::{QlStatsApi, DEFAULT_BASE_URL};
pub use directory::{populated_addresses, populated_servers};
pub use model::{PlayerRanking, PlayersDocument, ServerInfo, ServerSummary};
