use std::collections::HashSet;
use std::sync::RwLock;

use uuid::Uuid;

use crate::packet::Packet;
use crate::session::registry::Registry;

/// A named, many-member chat destination. Members are tracked by session
/// token; membership is not persisted, so removing a channel simply drops
/// it.
pub struct Channel {
    pub name: String,
    pub description: String,
    /// Listed in the client's channel browser when true.
    pub public: bool,
    members: RwLock<HashSet<Uuid>>,
}

impl Channel {
    pub fn new(name: &str, description: &str, public: bool) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            public,
            members: RwLock::new(HashSet::new()),
        }
    }

    pub fn join(&self, token: Uuid) -> bool {
        self.members.write().unwrap().insert(token)
    }

    pub fn leave(&self, token: &Uuid) -> bool {
        self.members.write().unwrap().remove(token)
    }

    pub fn contains(&self, token: &Uuid) -> bool {
        self.members.read().unwrap().contains(token)
    }

    pub fn members(&self) -> Vec<Uuid> {
        self.members.read().unwrap().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.members.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue `packet` on every member except `exclude`. Members whose
    /// session has vanished since they joined are skipped.
    pub fn broadcast(&self, registry: &Registry, packet: Packet, exclude: Option<Uuid>) {
        for token in self.members() {
            if Some(token) == exclude {
                continue;
            }
            if let Some(member) = registry.by_token(&token) {
                member.enqueue(packet.clone());
            }
        }
    }
}
