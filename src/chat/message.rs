use crate::session::Session;

/// A routed chat message, immutable once constructed. Global messages are
/// channel-addressed, private messages user-addressed.
#[derive(Debug, Clone)]
pub enum ChatMessage {
    Global {
        source_id: i32,
        source_name: String,
        channel: String,
        text: String,
    },
    Private {
        source_id: i32,
        source_name: String,
        target: String,
        text: String,
    },
}

impl ChatMessage {
    pub fn global(source: &Session, channel: &str, text: &str) -> Self {
        ChatMessage::Global {
            source_id: source.user.id,
            source_name: source.user.username.clone(),
            channel: channel.to_string(),
            text: text.to_string(),
        }
    }

    pub fn private(source: &Session, target: &str, text: &str) -> Self {
        ChatMessage::Private {
            source_id: source.user.id,
            source_name: source.user.username.clone(),
            target: target.to_string(),
            text: text.to_string(),
        }
    }

    pub fn source_id(&self) -> i32 {
        match self {
            ChatMessage::Global { source_id, .. } | ChatMessage::Private { source_id, .. } => {
                *source_id
            }
        }
    }

    pub fn source_name(&self) -> &str {
        match self {
            ChatMessage::Global { source_name, .. } | ChatMessage::Private { source_name, .. } => {
                source_name
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ChatMessage::Global { text, .. } | ChatMessage::Private { text, .. } => text,
        }
    }

    pub fn destination_name(&self) -> &str {
        match self {
            ChatMessage::Global { channel, .. } => channel,
            ChatMessage::Private { target, .. } => target,
        }
    }
}
