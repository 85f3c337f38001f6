//! Axum HTTP surfaces for the node task dispatcher.
//!
//! Layering:
//! - [`state`] — the `Arc<AppState>` threaded through every handler.
//! - [`error`] — `SchedulerError` → `{"message": string}` translation.
//! - [`extract`] — a `Json` extractor reporting decode failures per §6.
//! - [`auth_middleware`] — per-realm bearer-token gates.
//! - [`admin`], [`node`] — the two route groups from §4.3.
//! - [`server`] — router assembly and HTTP listener startup.

pub mod admin;
pub mod auth_middleware;
pub mod error;
pub mod extract;
pub mod node;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{build_router, WebConfig, WebServer};
pub use state::AppState;
