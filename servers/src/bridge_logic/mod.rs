pub mod config;
pub mod errors;
pub mod handlers;

pub use config::{Settings, load_config};
pub use errors::ApiError;
pub use handlers::{AppState, RouterOptions, build_router};
