//! # Data Retrieval Module
//!
//! Generic HTTP retrieval used by the upstream clients.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: A JSON `ApiClient` built on `reqwest` that joins relative
//!   paths onto a base URL and reports the status, the decoded body or the raw
//!   error body. Upstream-specific clients (see `qlstats`) sit on top of it.

/// Generic HTTP API client for JSON endpoints.
pub mod ky_http;
