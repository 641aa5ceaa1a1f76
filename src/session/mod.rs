pub mod registry;

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use uuid::Uuid;

use crate::packet::{out, Packet};
use crate::permissions::PermissionEngine;
use crate::state::AppState;

/// Persisted identity, as loaded from the users table. Plain data; the
/// live connection state lives on `Session`.
#[derive(Debug, Clone, Default)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub banned: bool,
    pub country_code: u8,
    pub timezone: i8,
    pub longitude: f32,
    pub latitude: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum GameMode {
    #[default]
    Standard = 0,
    Taiko = 1,
    CatchTheBeat = 2,
    Mania = 3,
}

impl GameMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(GameMode::Standard),
            1 => Some(GameMode::Taiko),
            2 => Some(GameMode::CatchTheBeat),
            3 => Some(GameMode::Mania),
            _ => None,
        }
    }
}

/// Gameplay modifier bits as the client reports them in status updates.
pub mod mods {
    pub const NONE: u32 = 0;
    pub const NO_FAIL: u32 = 1;
    pub const EASY: u32 = 1 << 1;
    pub const HIDDEN: u32 = 1 << 3;
    pub const HARD_ROCK: u32 = 1 << 4;
    pub const DOUBLE_TIME: u32 = 1 << 6;
    pub const RELAX: u32 = 1 << 7;
    pub const NIGHTCORE: u32 = 1 << 9;
    pub const FLASHLIGHT: u32 = 1 << 10;
    pub const AUTOPLAY: u32 = 1 << 11;
    pub const AUTOPILOT: u32 = 1 << 13;
    pub const CINEMA: u32 = 1 << 22;
    pub const TARGET: u32 = 1 << 23;
    pub const SCORE_V2: u32 = 1 << 29;

    /// Mods a server refuses to track in a status update.
    pub const DEFAULT_BLOCKED: u32 = AUTOPLAY | RELAX | AUTOPILOT | CINEMA | TARGET | SCORE_V2;
}

/// What the client is currently doing: action, window text, selected
/// beatmap and mods. Mirrors the status-update payload bit for bit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
    pub action: u8,
    pub text: String,
    pub beatmap_checksum: String,
    pub mods: u32,
    pub mode: GameMode,
    pub beatmap_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub ranked_score: i64,
    pub total_score: i64,
    pub accuracy: f32,
    pub playcount: i32,
    pub rank: i32,
    pub performance: i16,
}

/// A connected user. The token is unique per connection instance, so a
/// reconnect never collides with a stale registry entry for the same
/// account.
pub struct Session {
    pub user: User,
    pub token: Uuid,
    pub status: Mutex<Status>,
    pub stats: Mutex<Stats>,
    groups: RwLock<HashSet<String>>,
    queue: Mutex<VecDeque<Packet>>,
    last_seen: AtomicU64,
    client_permissions: Mutex<Option<u8>>,
    drop_outbound: bool,
}

impl Session {
    pub fn new(user: User, groups: HashSet<String>, now: u64) -> Self {
        Self {
            user,
            token: Uuid::new_v4(),
            status: Mutex::new(Status::default()),
            stats: Mutex::new(Stats::default()),
            groups: RwLock::new(groups),
            queue: Mutex::new(VecDeque::new()),
            last_seen: AtomicU64::new(now),
            client_permissions: Mutex::new(None),
            drop_outbound: false,
        }
    }

    /// A session whose outbound queue discards. Used for the resident bot,
    /// which no transport ever flushes.
    pub fn sink(user: User, groups: HashSet<String>, now: u64) -> Self {
        Self {
            drop_outbound: true,
            ..Self::new(user, groups, now)
        }
    }

    /// Queue a packet for the next transport flush. Delivery order is
    /// enqueue order.
    pub fn enqueue(&self, packet: Packet) {
        if self.drop_outbound {
            return;
        }
        self.queue.lock().unwrap().push_back(packet);
    }

    /// Take everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<Packet> {
        self.queue.lock().unwrap().drain(..).collect()
    }

    pub fn queued(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn touch(&self, now: u64) {
        self.last_seen.store(now, Ordering::Relaxed);
    }

    pub fn last_seen(&self) -> u64 {
        self.last_seen.load(Ordering::Relaxed)
    }

    pub fn group_names(&self) -> HashSet<String> {
        self.groups.read().unwrap().clone()
    }

    /// Replace group memberships. Invalidates the cached client mask so the
    /// next read recomputes it.
    pub fn set_groups(&self, groups: HashSet<String>) {
        *self.groups.write().unwrap() = groups;
        *self.client_permissions.lock().unwrap() = None;
    }

    /// Client-visible permission mask, computed lazily and cached until the
    /// session's group memberships change.
    pub fn client_permissions(&self, engine: &PermissionEngine) -> u8 {
        let mut cached = self.client_permissions.lock().unwrap();
        if let Some(mask) = *cached {
            return mask;
        }
        let mask = engine.calculate_client_permissions(&self.group_names());
        *cached = Some(mask);
        mask
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user.id)
            .field("username", &self.user.username)
            .field("token", &self.token)
            .finish()
    }
}

/// Single teardown path for a live session, shared by the exit packet
/// handler and the timeout sweep: unwind the spectator relation both ways,
/// leave every channel, deregister, then tell everyone still online.
pub fn disconnect(state: &AppState, session: &std::sync::Arc<Session>) {
    crate::spectate::stop_spectating(state, session);
    for watcher_token in state.spectators.watchers_of(session.token) {
        if let Some(watcher) = state.registry.by_token(&watcher_token) {
            crate::spectate::stop_spectating(state, &watcher);
        }
    }

    state.chat.remove_session(session);

    if !state.registry.remove(session) {
        return;
    }

    let mut event = crate::events::Event::new(crate::events::EventKind::Quit {
        user_id: session.user.id,
    });
    state.events.publish(&mut event);

    let quit = out::user_quit(session.user.id);
    for other in state.registry.snapshot() {
        other.enqueue(quit.clone());
    }

    tracing::info!(
        user_id = session.user.id,
        username = %session.user.username,
        "session disconnected"
    );
}
