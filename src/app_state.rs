use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::db::repositories::{PgAppointmentStore, PgChatStore};
use crate::modules::appointments::store::AppointmentStore;
use crate::modules::chat::store::ChatStore;
use crate::modules::chat::typing::TypingRegistry;

/// Everything handlers need, injected explicitly; there are no process-wide
/// singletons behind the operations.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub env: Config,
    pub appointments: Arc<dyn AppointmentStore>,
    pub chats: Arc<dyn ChatStore>,
    pub typing: Arc<TypingRegistry>,
    pub ws_tx: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(db: PgPool, env: Config) -> Self {
        let (ws_tx, _) = broadcast::channel(128);
        Self {
            appointments: Arc::new(PgAppointmentStore::new(db.clone())),
            chats: Arc::new(PgChatStore::new(db.clone())),
            typing: Arc::new(TypingRegistry::new()),
            db,
            env,
            ws_tx,
        }
    }
}
