//! Shared application state for the web server.
//!
//! Mirrors the teacher's `AppState` shape: one small `Clone` struct wrapped
//! in an `Arc` and threaded through every handler via `State`.

use std::sync::Arc;

use dispatch_auth::Keys;
use dispatch_core::Scheduler;

/// Shared state accessible from every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// The scheduler: the single store handle, passed by reference per the
    /// "global store handle" design note.
    pub scheduler: Scheduler,

    /// The two bearer-key realms.
    pub keys: Arc<Keys>,
}
