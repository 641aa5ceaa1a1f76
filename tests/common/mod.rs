#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use banchoserver::config::Config;
use banchoserver::db;
use banchoserver::packet::reader::{has_frame, read_frame};
use banchoserver::packet::{Packet, PacketReader, PacketWriter, ServerPacketId};
use banchoserver::routes;
use banchoserver::session::{mods, Session, User};
use banchoserver::state::AppState;

/// Test server that owns an in-memory SQLite pool and full AppState.
/// Each instance is isolated, safe for parallel tests.
pub struct TestServer {
    pub state: AppState,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let pool = db::create_pool("sqlite::memory:")
            .await
            .expect("failed to create test pool");
        let state = AppState::new(pool, config);
        Self { state }
    }

    /// A server whose pool never connects. For paused-clock tests that
    /// exercise the core without touching the database.
    pub fn offline() -> Self {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .connect_lazy("sqlite::memory:")
            .expect("failed to create lazy pool");
        let state = AppState::new(pool, test_config());
        Self { state }
    }

    /// Returns an axum Router wired to this server's state for `oneshot()`
    /// calls.
    pub fn router(&self) -> axum::Router {
        routes::router(self.state.clone())
    }

    /// Put a session straight into the registry, bypassing the login
    /// endpoint. For tests that exercise the core rather than the
    /// transport.
    pub fn connect(&self, id: i32, name: &str) -> Arc<Session> {
        let session = Arc::new(Session::new(
            User {
                id,
                username: name.to_string(),
                ..User::default()
            },
            HashSet::new(),
            self.state.now_secs(),
        ));
        self.state.registry.add(Arc::clone(&session));
        session
    }

    pub fn join_channel(&self, session: &Session, channel: &str) {
        self.state
            .chat
            .channel(channel)
            .expect("channel not configured")
            .join(session.token);
    }

    /// Insert a user row the login endpoint can authenticate.
    pub async fn seed_user(&self, name: &str, digest: &str) -> i64 {
        let hash = routes::bancho::hash_credentials(digest);
        db::users::create(&self.state.db, name, &hash, 0)
            .await
            .expect("failed to seed user")
    }
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        session_timeout_secs: 60,
        sweep_interval_secs: 1,
        bot_user_id: 3,
        blocked_mods: mods::DEFAULT_BLOCKED,
        channels: Config::default_channels(),
    }
}

/// Drain a session and return just the packet ids, in delivery order.
pub fn drain_ids(session: &Session) -> Vec<u16> {
    session.drain().iter().map(|p| p.id).collect()
}

pub fn id_of(packet: ServerPacketId) -> u16 {
    packet as u16
}

/// Decode a SendMessage payload: (sender, text, destination, sender id).
pub fn decode_message(packet: &Packet) -> (String, String, String, i32) {
    let mut reader = PacketReader::new(&packet.payload);
    (
        reader.read_string().unwrap(),
        reader.read_string().unwrap(),
        reader.read_string().unwrap(),
        reader.read_i32().unwrap(),
    )
}

/// Frame a client-side packet the way the real client does.
pub fn client_frame(id: u16, payload: Vec<u8>) -> Vec<u8> {
    let mut out = id.to_le_bytes().to_vec();
    out.push(0);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Payload of a client chat packet: sender (blank), text, destination.
pub fn chat_payload(text: &str, destination: &str) -> Vec<u8> {
    let mut writer = PacketWriter::new();
    writer.write_string("");
    writer.write_string(text);
    writer.write_string(destination);
    writer.into_payload()
}

pub fn string_payload(value: &str) -> Vec<u8> {
    let mut writer = PacketWriter::new();
    writer.write_string(value);
    writer.into_payload()
}

/// Split a response body into (id, payload) frames.
pub fn parse_frames(body: &[u8]) -> Vec<(u16, Vec<u8>)> {
    let mut reader = PacketReader::new(body);
    let mut frames = Vec::new();
    while has_frame(&reader) {
        frames.push(read_frame(&mut reader).expect("bad frame in response body"));
    }
    frames
}
