//! HTTP front end of the QLStats ranking bridge.
//!
//! The `server_qlsbridge` binary is a thin wrapper around [`bridge_logic`]:
//! configuration loading, the axum router and its error responses.

pub mod bridge_logic;
