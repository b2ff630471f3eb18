//! HTTP gateway for the Waypoint link service.
//!
//! Serves the redirect path, the link CRUD API and the backup admin
//! surface, and owns the process lifecycle of the vault scheduler.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod model;
pub mod state;

pub use app::App;
pub use config::GatewayConfig;
pub use lifecycle::Lifecycle;
pub use state::AppState;
