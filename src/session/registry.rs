use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use super::Session;

#[derive(Default)]
struct Indexes {
    by_token: HashMap<Uuid, Arc<Session>>,
    by_name: HashMap<String, Arc<Session>>,
    by_id: HashMap<i32, Arc<Session>>,
}

/// The authoritative index of online sessions, reachable under three
/// independent keys. One lock guards all three maps so a session is either
/// fully indexed or not indexed at all.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<Indexes>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, session: Arc<Session>) {
        let mut inner = self.inner.write().unwrap();
        inner.by_token.insert(session.token, Arc::clone(&session));
        inner
            .by_name
            .insert(session.user.username.clone(), Arc::clone(&session));
        inner.by_id.insert(session.user.id, session);
    }

    /// Clears all three indexes. Returns false if the session was already
    /// gone, which lets callers make teardown idempotent.
    pub fn remove(&self, session: &Session) -> bool {
        let mut inner = self.inner.write().unwrap();
        let found = inner.by_token.remove(&session.token).is_some();
        if found {
            inner.by_name.remove(&session.user.username);
            inner.by_id.remove(&session.user.id);
        }
        found
    }

    pub fn by_token(&self, token: &Uuid) -> Option<Arc<Session>> {
        self.inner.read().unwrap().by_token.get(token).cloned()
    }

    pub fn by_name(&self, username: &str) -> Option<Arc<Session>> {
        self.inner.read().unwrap().by_name.get(username).cloned()
    }

    pub fn by_id(&self, user_id: i32) -> Option<Arc<Session>> {
        self.inner.read().unwrap().by_id.get(&user_id).cloned()
    }

    /// Stable snapshot for iteration. Sessions removed after the snapshot
    /// was taken are simply stale `Arc`s; sessions added after are missed
    /// until the next pass. Both are fine for the sweep and for broadcasts.
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.inner
            .read()
            .unwrap()
            .by_token
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
