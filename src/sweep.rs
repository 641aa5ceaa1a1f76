use std::time::Duration;

use crate::session;
use crate::state::AppState;

/// Spawn the periodic eviction task. Runs for the life of the process,
/// independent of request handling.
pub fn spawn(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(state.config.sweep_interval_secs));
        loop {
            interval.tick().await;
            sweep_once(&state);
        }
    })
}

/// One eviction pass over a registry snapshot: any session whose last
/// liveness signal is older than the configured timeout is disconnected
/// through the same path an exit packet takes. The resident bot never
/// heartbeats and is exempt.
pub fn sweep_once(state: &AppState) {
    let now = state.now_secs();
    let timeout = state.config.session_timeout_secs;

    for session in state.registry.snapshot() {
        if session.user.id == state.config.bot_user_id {
            continue;
        }
        let idle = now.saturating_sub(session.last_seen());
        if idle > timeout {
            tracing::info!(
                user_id = session.user.id,
                username = %session.user.username,
                idle_secs = idle,
                "evicting timed-out session"
            );
            session::disconnect(state, &session);
        }
    }
}
