pub mod out;
pub mod reader;
pub mod writer;

use std::fmt;

pub use reader::PacketReader;
pub use writer::PacketWriter;

/// Wire header: u16 packet id, u8 compression flag, u32 payload length.
pub const HEADER_LEN: usize = 7;

/// Packet ids the client sends. Unlisted ids are ignored by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ClientPacketId {
    SendUserStatus = 0,
    SendIrcMessage = 1,
    Exit = 2,
    RequestStatusUpdate = 3,
    Heartbeat = 4,
    StartSpectating = 16,
    StopSpectating = 17,
    SpectateFrames = 18,
    SendIrcMessagePrivate = 25,
    ChannelJoin = 63,
    ChannelLeave = 78,
    UserStatsRequest = 85,
    UserPresenceRequest = 97,
}

/// Packet ids the server sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ServerPacketId {
    LoginReply = 5,
    SendMessage = 7,
    Ping = 8,
    UserStats = 11,
    UserQuit = 12,
    SpectatorJoined = 13,
    SpectatorLeft = 14,
    SpectateFrames = 15,
    SpectatorCantSpectate = 22,
    Announce = 24,
    FellowSpectatorJoined = 42,
    FellowSpectatorLeft = 43,
    ChannelJoinSuccess = 64,
    ChannelAvailable = 65,
    ChannelRevoked = 66,
    LoginPermissions = 71,
    UserPresence = 83,
    Restart = 86,
    ChannelListingComplete = 89,
}

/// A framed packet ready to be queued or flushed to a client.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub id: u16,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(id: ServerPacketId, payload: Vec<u8>) -> Self {
        Self {
            id: id as u16,
            payload,
        }
    }

    /// Serialize header + payload. The payload is assembled first by a
    /// `PacketWriter`, so the length is known by the time we get here.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        out.extend_from_slice(&self.id.to_le_bytes());
        out.push(0);
        out.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Codec failure. Always recoverable per connection: the offending packet
/// is dropped, the session stays up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketError {
    /// Read past the end of the available bytes.
    Truncated,
    /// String field did not start with 0x00 or 0x0b.
    BadStringTag(u8),
    /// String bytes were not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::Truncated => write!(f, "packet truncated"),
            PacketError::BadStringTag(tag) => write!(f, "bad string tag 0x{tag:02x}"),
            PacketError::InvalidUtf8 => write!(f, "string is not valid utf-8"),
        }
    }
}

impl std::error::Error for PacketError {}
