use std::sync::Arc;

use super::PacketHandler;
use crate::error::AppError;
use crate::packet::{out, PacketReader};
use crate::session::{self, GameMode, Session, Status};
use crate::state::AppState;

/// Status update (current action, beatmap, mods, mode). A payload carrying
/// a blocked mod is refused whole; everyone online gets the refreshed
/// stats on success.
pub struct UserStatus;

impl PacketHandler for UserStatus {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        let action = reader.read_u8()?;
        let text = reader.read_string()?;
        let beatmap_checksum = reader.read_string()?;
        let mods = reader.read_u32()?;
        let mode_raw = reader.read_u8()?;
        let beatmap_id = reader.read_i32()?;

        let mode = GameMode::from_u8(mode_raw)
            .ok_or_else(|| AppError::Malformed(format!("unknown game mode {mode_raw}")))?;

        if mods & state.config.blocked_mods != 0 {
            tracing::warn!(
                user_id = session.user.id,
                mods,
                "refusing status update with blocked mods"
            );
            return Ok(());
        }

        let status = Status {
            action,
            text,
            beatmap_checksum,
            mods,
            mode,
            beatmap_id,
        };
        *session.status.lock().unwrap() = status.clone();

        let stats = session.stats.lock().unwrap().clone();
        let packet = out::user_stats(session.user.id, &status, &stats);
        for other in state.registry.snapshot() {
            other.enqueue(packet.clone());
        }
        Ok(())
    }
}

/// The client asking for its own stats back.
pub struct StatusUpdateRequest;

impl PacketHandler for StatusUpdateRequest {
    fn handle(
        &self,
        _state: &AppState,
        session: &Arc<Session>,
        _reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        let status = session.status.lock().unwrap().clone();
        let stats = session.stats.lock().unwrap().clone();
        session.enqueue(out::user_stats(session.user.id, &status, &stats));
        Ok(())
    }
}

/// The designated liveness signal, and the only packet that refreshes
/// `last_seen`.
pub struct Heartbeat;

impl PacketHandler for Heartbeat {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        _reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        session.touch(state.now_secs());
        Ok(())
    }
}

/// Chat aimed at a channel (or the spectator/console pseudo-channels).
pub struct PublicMessage;

impl PacketHandler for PublicMessage {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        let _sender = reader.read_string()?;
        let text = reader.read_string()?;
        let destination = reader.read_string()?;
        state.chat.handle_chat(state, session, &destination, &text)
    }
}

/// Chat aimed at a user by name. Offline targets are a silent drop at the
/// dispatch boundary (the error only makes it into the log).
pub struct PrivateMessage;

impl PacketHandler for PrivateMessage {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        let _sender = reader.read_string()?;
        let text = reader.read_string()?;
        let destination = reader.read_string()?;
        state.chat.handle_chat(state, session, &destination, &text)
    }
}

pub struct ChannelJoin;

impl PacketHandler for ChannelJoin {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        let name = reader.read_string()?;
        match state.chat.channel(&name) {
            Some(channel) => {
                channel.join(session.token);
                session.enqueue(out::channel_join_success(&channel.name));
            }
            None => {
                tracing::debug!(channel = %name, "join request for unknown channel");
                session.enqueue(out::channel_revoked(&name));
            }
        }
        Ok(())
    }
}

pub struct ChannelLeave;

impl PacketHandler for ChannelLeave {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        let name = reader.read_string()?;
        if let Some(channel) = state.chat.channel(&name) {
            channel.leave(&session.token);
        }
        Ok(())
    }
}

pub struct Exit;

impl PacketHandler for Exit {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        _reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        session::disconnect(state, session);
        Ok(())
    }
}

pub struct StartSpectating;

impl PacketHandler for StartSpectating {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        let target_id = reader.read_i32()?;
        match state.registry.by_id(target_id) {
            Some(target) => crate::spectate::spectate(state, session, &target),
            None => {
                tracing::debug!(target_id, "spectate request for offline user");
                session.enqueue(out::spectator_cant_spectate(target_id));
            }
        }
        Ok(())
    }
}

pub struct StopSpectating;

impl PacketHandler for StopSpectating {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        _reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        crate::spectate::stop_spectating(state, session);
        Ok(())
    }
}

/// Replay frames from a spectated client, forwarded opaquely.
pub struct SpectateFrames;

impl PacketHandler for SpectateFrames {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        let frames = reader.read_bytes(reader.remaining())?;
        crate::spectate::forward_frames(state, session, frames);
        Ok(())
    }
}

/// Batched stats lookup: i16 count, then that many user ids. Offline ids
/// are skipped.
pub struct UserStatsRequest;

impl PacketHandler for UserStatsRequest {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        let count = reader.read_i16()?;
        for _ in 0..count {
            let user_id = reader.read_i32()?;
            if let Some(target) = state.registry.by_id(user_id) {
                let status = target.status.lock().unwrap().clone();
                let stats = target.stats.lock().unwrap().clone();
                session.enqueue(out::user_stats(target.user.id, &status, &stats));
            }
        }
        Ok(())
    }
}

pub struct UserPresenceRequest;

impl PacketHandler for UserPresenceRequest {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError> {
        let count = reader.read_i16()?;
        for _ in 0..count {
            let user_id = reader.read_i32()?;
            if let Some(target) = state.registry.by_id(user_id) {
                let mask = target.client_permissions(&state.permissions);
                let rank = target.stats.lock().unwrap().rank;
                session.enqueue(out::user_presence(&target.user, mask, rank));
            }
        }
        Ok(())
    }
}
