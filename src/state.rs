use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::time::Instant;

use crate::chat::channel::Channel;
use crate::chat::ChatEngine;
use crate::config::Config;
use crate::events::EventBus;
use crate::permissions::PermissionEngine;
use crate::router::PacketRouter;
use crate::session::registry::Registry;
use crate::session::Session;
use crate::spectate::SpectatorGraph;

/// Everything the core hands around: every engine is explicit state passed
/// into whoever needs it, never a process-wide singleton. Cheap to clone,
/// all `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub registry: Arc<Registry>,
    pub chat: Arc<ChatEngine>,
    pub spectators: Arc<SpectatorGraph>,
    pub permissions: Arc<PermissionEngine>,
    pub events: Arc<EventBus>,
    pub router: Arc<PacketRouter>,
    started: Instant,
}

impl AppState {
    /// Build the full core. Channels from the config are registered
    /// immediately; permission groups are preloaded separately because
    /// that needs the database.
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let chat = ChatEngine::new();
        for channel in &config.channels {
            chat.add_channel(Channel::new(
                &channel.name,
                &channel.description,
                channel.public,
            ));
        }

        Self {
            db,
            config: Arc::new(config),
            registry: Arc::new(Registry::new()),
            chat: Arc::new(chat),
            spectators: Arc::new(SpectatorGraph::new()),
            permissions: Arc::new(PermissionEngine::new()),
            events: Arc::new(EventBus::new()),
            router: Arc::new(crate::router::default_router()),
            started: Instant::now(),
        }
    }

    /// Monotonic seconds since startup. This is what `last_seen` and the
    /// timeout sweep compare against; wall-clock jumps cannot evict
    /// anyone.
    pub fn now_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// The resident bot's live session, if installed.
    pub fn bot(&self) -> Option<Arc<Session>> {
        self.registry.by_id(self.config.bot_user_id)
    }
}
