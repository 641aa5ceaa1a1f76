use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::chat::SPECTATOR_CHANNEL;
use crate::events::{Event, EventKind};
use crate::packet::out;
use crate::session::Session;
use crate::state::AppState;

/// The spectating relation, both directions in one place behind one lock:
/// a viewer watches at most one target, a target holds the set of its
/// watchers, and the two maps never disagree.
#[derive(Default)]
pub struct SpectatorGraph {
    inner: Mutex<Relation>,
}

#[derive(Default)]
struct Relation {
    watching: HashMap<Uuid, Uuid>,
    watchers: HashMap<Uuid, HashSet<Uuid>>,
}

impl SpectatorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_of(&self, viewer: Uuid) -> Option<Uuid> {
        self.inner.lock().unwrap().watching.get(&viewer).copied()
    }

    pub fn watchers_of(&self, target: Uuid) -> Vec<Uuid> {
        self.inner
            .lock()
            .unwrap()
            .watchers
            .get(&target)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_watching(&self, viewer: Uuid, target: Uuid) -> bool {
        self.inner.lock().unwrap().watching.get(&viewer) == Some(&target)
    }

    fn link(&self, viewer: Uuid, target: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        inner.watching.insert(viewer, target);
        inner.watchers.entry(target).or_default().insert(viewer);
    }

    fn unlink(&self, viewer: Uuid) -> Option<Uuid> {
        let mut inner = self.inner.lock().unwrap();
        let target = inner.watching.remove(&viewer)?;
        if let Some(set) = inner.watchers.get_mut(&target) {
            set.remove(&viewer);
            if set.is_empty() {
                inner.watchers.remove(&target);
            }
        }
        Some(target)
    }
}

/// Start spectating `target`. A viewer already watching someone else is
/// switched: switch event, full stop against the old target, then the
/// join sequence. Watching yourself is refused.
pub fn spectate(state: &AppState, viewer: &Arc<Session>, target: &Arc<Session>) {
    if viewer.token == target.token {
        viewer.enqueue(out::spectator_cant_spectate(viewer.user.id));
        return;
    }

    if let Some(old_token) = state.spectators.target_of(viewer.token) {
        let from_id = state
            .registry
            .by_token(&old_token)
            .map(|s| s.user.id)
            .unwrap_or_default();
        let mut event = Event::new(EventKind::SpectateSwitch {
            viewer_id: viewer.user.id,
            from_id,
            to_id: target.user.id,
        });
        state.events.publish(&mut event);

        stop_spectating(state, viewer);
        if state.spectators.target_of(viewer.token).is_some() {
            // leave was vetoed; a second link would break the
            // one-target-per-viewer invariant
            return;
        }
    }

    let mut event = Event::new(EventKind::SpectateJoin {
        viewer_id: viewer.user.id,
        target_id: target.user.id,
    });
    state.events.publish(&mut event);
    if event.is_cancelled() {
        return;
    }

    for token in state.spectators.watchers_of(target.token) {
        if let Some(fellow) = state.registry.by_token(&token) {
            fellow.enqueue(out::fellow_spectator_joined(viewer.user.id));
        }
    }
    target.enqueue(out::spectator_joined(viewer.user.id));

    state.spectators.link(viewer.token, target.token);

    let spectator_channel = state.chat.spectator_channel();
    spectator_channel.join(viewer.token);
    spectator_channel.join(target.token);
    viewer.enqueue(out::channel_join_success(SPECTATOR_CHANNEL));
    target.enqueue(out::channel_join_success(SPECTATOR_CHANNEL));

    tracing::debug!(
        viewer = %viewer.user.username,
        target = %target.user.username,
        "spectating started"
    );
}

/// Tear down the viewer's spectating relation. No-op when not spectating.
pub fn stop_spectating(state: &AppState, viewer: &Arc<Session>) {
    let Some(target_token) = state.spectators.target_of(viewer.token) else {
        return;
    };
    let target = state.registry.by_token(&target_token);
    let target_id = target.as_ref().map(|s| s.user.id).unwrap_or_default();

    let mut event = Event::new(EventKind::SpectateLeave {
        viewer_id: viewer.user.id,
        target_id,
    });
    state.events.publish(&mut event);
    if event.is_cancelled() {
        return;
    }

    state.spectators.unlink(viewer.token);

    for token in state.spectators.watchers_of(target_token) {
        if let Some(fellow) = state.registry.by_token(&token) {
            fellow.enqueue(out::fellow_spectator_left(viewer.user.id));
        }
    }

    let spectator_channel = state.chat.spectator_channel();
    spectator_channel.leave(&viewer.token);
    if let Some(ref target) = target {
        target.enqueue(out::spectator_left(viewer.user.id));
        if state.spectators.watchers_of(target_token).is_empty() {
            spectator_channel.leave(&target_token);
        }
    }

    viewer.enqueue(out::channel_revoked(SPECTATOR_CHANNEL));

    tracing::debug!(viewer = %viewer.user.username, "spectating stopped");
}

/// Forward a replay-frame blob from a spectated session to everyone
/// watching it.
pub fn forward_frames(state: &AppState, source: &Arc<Session>, frames: &[u8]) {
    let watchers = state.spectators.watchers_of(source.token);
    if watchers.is_empty() {
        return;
    }
    let packet = out::spectate_frames(frames);
    for token in watchers {
        if let Some(watcher) = state.registry.by_token(&token) {
            watcher.enqueue(packet.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_and_unlink_stay_symmetric() {
        let graph = SpectatorGraph::new();
        let viewer = Uuid::new_v4();
        let target = Uuid::new_v4();

        graph.link(viewer, target);
        assert_eq!(graph.target_of(viewer), Some(target));
        assert_eq!(graph.watchers_of(target), vec![viewer]);
        assert!(graph.is_watching(viewer, target));

        assert_eq!(graph.unlink(viewer), Some(target));
        assert_eq!(graph.target_of(viewer), None);
        assert!(graph.watchers_of(target).is_empty());
    }

    #[test]
    fn test_unlink_without_link_is_none() {
        let graph = SpectatorGraph::new();
        assert_eq!(graph.unlink(Uuid::new_v4()), None);
    }
}
