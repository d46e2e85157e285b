use tether_core::{RoomId, SenderId, SignalEnvelope};
use tracing::debug;

/// Drops reflected self-messages and messages addressed to other rooms.
#[derive(Debug, Clone)]
pub struct InboundFilter {
    room: RoomId,
    local: SenderId,
}

impl InboundFilter {
    pub fn new(room: RoomId, local: SenderId) -> Self {
        Self { room, local }
    }

    pub fn accepts(&self, envelope: &SignalEnvelope) -> bool {
        if envelope.sender_id == self.local {
            debug!("Dropping self-echoed {}", envelope.signal.kind());
            return false;
        }
        if envelope.room_id != self.room {
            debug!(
                "Dropping {} addressed to room {}",
                envelope.signal.kind(),
                envelope.room_id
            );
            return false;
        }
        true
    }
}
