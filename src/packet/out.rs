//! Constructors for every packet the server sends. Payload layouts follow
//! the Bancho wire protocol; see `reader`/`writer` for the primitive
//! encoding.

use super::{Packet, PacketWriter, ServerPacketId};
use crate::chat::channel::Channel;
use crate::chat::message::ChatMessage;
use crate::session::{Stats, Status, User};

/// Login replies below 1 are failure codes; a successful login echoes the
/// user id.
pub const LOGIN_FAILED: i32 = -1;
pub const LOGIN_BANNED: i32 = -3;

pub fn login_reply(value: i32) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_i32(value);
    writer.finish(ServerPacketId::LoginReply)
}

pub fn login_permissions(mask: u8) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_i32(i32::from(mask));
    writer.finish(ServerPacketId::LoginPermissions)
}

pub fn send_message(message: &ChatMessage) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_string(message.source_name());
    writer.write_string(message.text());
    writer.write_string(message.destination_name());
    writer.write_i32(message.source_id());
    writer.finish(ServerPacketId::SendMessage)
}

pub fn ping() -> Packet {
    PacketWriter::new().finish(ServerPacketId::Ping)
}

pub fn user_stats(user_id: i32, status: &Status, stats: &Stats) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_i32(user_id);
    writer.write_u8(status.action);
    writer.write_string(&status.text);
    writer.write_string(&status.beatmap_checksum);
    writer.write_u32(status.mods);
    writer.write_u8(status.mode as u8);
    writer.write_i32(status.beatmap_id);
    writer.write_i64(stats.ranked_score);
    writer.write_f32(stats.accuracy);
    writer.write_i32(stats.playcount);
    writer.write_i64(stats.total_score);
    writer.write_i32(stats.rank);
    writer.write_i16(stats.performance);
    writer.finish(ServerPacketId::UserStats)
}

pub fn user_presence(user: &User, permissions: u8, rank: i32) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_i32(user.id);
    writer.write_string(&user.username);
    writer.write_u8((user.timezone as i16 + 24) as u8);
    writer.write_u8(user.country_code);
    writer.write_u8(permissions);
    writer.write_f32(user.longitude);
    writer.write_f32(user.latitude);
    writer.write_i32(rank);
    writer.finish(ServerPacketId::UserPresence)
}

pub fn user_quit(user_id: i32) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_i32(user_id);
    writer.write_u8(0);
    writer.finish(ServerPacketId::UserQuit)
}

pub fn spectator_joined(user_id: i32) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_i32(user_id);
    writer.finish(ServerPacketId::SpectatorJoined)
}

pub fn spectator_left(user_id: i32) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_i32(user_id);
    writer.finish(ServerPacketId::SpectatorLeft)
}

pub fn fellow_spectator_joined(user_id: i32) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_i32(user_id);
    writer.finish(ServerPacketId::FellowSpectatorJoined)
}

pub fn fellow_spectator_left(user_id: i32) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_i32(user_id);
    writer.finish(ServerPacketId::FellowSpectatorLeft)
}

pub fn spectator_cant_spectate(user_id: i32) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_i32(user_id);
    writer.finish(ServerPacketId::SpectatorCantSpectate)
}

/// Replay frames are forwarded opaquely; the server never inspects them.
pub fn spectate_frames(frames: &[u8]) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_bytes(frames);
    writer.finish(ServerPacketId::SpectateFrames)
}

pub fn announce(text: &str) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_string(text);
    writer.finish(ServerPacketId::Announce)
}

pub fn channel_available(channel: &Channel) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_string(&channel.name);
    writer.write_string(&channel.description);
    writer.write_u16(channel.len() as u16);
    writer.finish(ServerPacketId::ChannelAvailable)
}

pub fn channel_join_success(name: &str) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_string(name);
    writer.finish(ServerPacketId::ChannelJoinSuccess)
}

pub fn channel_revoked(name: &str) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_string(name);
    writer.finish(ServerPacketId::ChannelRevoked)
}

pub fn channel_listing_complete() -> Packet {
    PacketWriter::new().finish(ServerPacketId::ChannelListingComplete)
}

/// Tells the client to reconnect after `delay_ms`. Sent when a request
/// carries a token the registry no longer knows.
pub fn restart(delay_ms: i32) -> Packet {
    let mut writer = PacketWriter::new();
    writer.write_i32(delay_ms);
    writer.finish(ServerPacketId::Restart)
}
