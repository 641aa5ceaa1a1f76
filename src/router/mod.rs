pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AppError;
use crate::packet::{ClientPacketId, PacketReader};
use crate::session::Session;
use crate::state::AppState;

/// One packet type's worth of behavior. Handlers validate their own
/// payload and answer by queueing packets; a failure drops the packet,
/// never the session.
pub trait PacketHandler: Send + Sync {
    fn handle(
        &self,
        state: &AppState,
        session: &Arc<Session>,
        reader: &mut PacketReader<'_>,
    ) -> Result<(), AppError>;
}

/// Maps incoming packet-type codes to handlers. Codes nothing is
/// registered for are ignored: newer clients send packet types this
/// server version does not implement, and that must stay harmless.
#[derive(Default)]
pub struct PacketRouter {
    handlers: HashMap<u16, Box<dyn PacketHandler>>,
}

impl PacketRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, id: ClientPacketId, handler: H)
    where
        H: PacketHandler + 'static,
    {
        self.handlers.insert(id as u16, Box::new(handler));
    }

    pub fn dispatch(&self, state: &AppState, session: &Arc<Session>, id: u16, payload: &[u8]) {
        let Some(handler) = self.handlers.get(&id) else {
            tracing::trace!(packet_id = id, "ignoring unhandled packet type");
            return;
        };
        let mut reader = PacketReader::new(payload);
        if let Err(error) = handler.handle(state, session, &mut reader) {
            tracing::warn!(
                packet_id = id,
                user_id = session.user.id,
                %error,
                "dropping packet"
            );
        }
    }
}

/// The full handler table for the protocol surface this server speaks.
pub fn default_router() -> PacketRouter {
    let mut router = PacketRouter::new();
    router.register(ClientPacketId::SendUserStatus, handlers::UserStatus);
    router.register(ClientPacketId::SendIrcMessage, handlers::PublicMessage);
    router.register(ClientPacketId::Exit, handlers::Exit);
    router.register(ClientPacketId::RequestStatusUpdate, handlers::StatusUpdateRequest);
    router.register(ClientPacketId::Heartbeat, handlers::Heartbeat);
    router.register(ClientPacketId::StartSpectating, handlers::StartSpectating);
    router.register(ClientPacketId::StopSpectating, handlers::StopSpectating);
    router.register(ClientPacketId::SpectateFrames, handlers::SpectateFrames);
    router.register(ClientPacketId::SendIrcMessagePrivate, handlers::PrivateMessage);
    router.register(ClientPacketId::ChannelJoin, handlers::ChannelJoin);
    router.register(ClientPacketId::ChannelLeave, handlers::ChannelLeave);
    router.register(ClientPacketId::UserStatsRequest, handlers::UserStatsRequest);
    router.register(ClientPacketId::UserPresenceRequest, handlers::UserPresenceRequest);
    router
}
