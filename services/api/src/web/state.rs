//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::board::BoardHub;
use call_desk_core::ports::{CallProvider, DatabaseService, Mailer};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    /// `None` when no call-provider key is configured.
    pub call_provider: Option<Arc<dyn CallProvider>>,
    /// `None` when no email-provider key is configured.
    pub mailer: Option<Arc<dyn Mailer>>,
    pub board: Arc<BoardHub>,
}
