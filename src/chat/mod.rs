pub mod channel;
pub mod command;
pub mod message;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use dashmap::DashMap;

use crate::error::AppError;
use crate::events::{Event, EventKind};
use crate::packet::out;
use crate::session::Session;
use crate::state::AppState;
use channel::Channel;
use command::{CommandContext, RegisteredCommand};
use message::ChatMessage;

/// Reserved destination that logs instead of delivering.
pub const CONSOLE_CHANNEL: &str = "!CONSOLE";
/// Pseudo-channel shared by a spectated session and its spectators.
pub const SPECTATOR_CHANNEL: &str = "#spectator";
/// Public alias clients address the resident bot by, whatever its real
/// account name is.
pub const BOT_ALIAS: &str = "BanchoBot";

/// Routes chat to channels, users, the spectator relation or the console,
/// and dispatches `!commands` typed into public channels.
pub struct ChatEngine {
    channels: DashMap<String, Arc<Channel>>,
    commands: RwLock<HashMap<String, Arc<RegisteredCommand>>>,
    spectator: Arc<Channel>,
}

impl Default for ChatEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatEngine {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            commands: RwLock::new(HashMap::new()),
            spectator: Arc::new(Channel::new(SPECTATOR_CHANNEL, "", false)),
        }
    }

    pub fn add_channel(&self, channel: Channel) {
        self.channels
            .insert(channel.name.clone(), Arc::new(channel));
    }

    pub fn remove_channel(&self, name: &str) -> bool {
        self.channels.remove(name).is_some()
    }

    pub fn channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.get(name).map(|c| Arc::clone(&c))
    }

    pub fn channels(&self) -> Vec<Arc<Channel>> {
        self.channels.iter().map(|c| Arc::clone(&c)).collect()
    }

    pub fn spectator_channel(&self) -> &Arc<Channel> {
        &self.spectator
    }

    /// Drop a departing session from every channel, the spectator
    /// pseudo-channel included.
    pub fn remove_session(&self, session: &Session) {
        for entry in self.channels.iter() {
            entry.leave(&session.token);
        }
        self.spectator.leave(&session.token);
    }

    pub fn register_command<F>(&self, name: &str, owner: &str, handler: F)
    where
        F: Fn(&CommandContext<'_>, &[&str]) + Send + Sync + 'static,
    {
        self.commands.write().unwrap().insert(
            name.to_string(),
            Arc::new(RegisteredCommand {
                name: name.to_string(),
                owner: owner.to_string(),
                handler: Box::new(handler),
            }),
        );
    }

    /// Deregister everything a collaborator registered, in one sweep.
    pub fn remove_commands(&self, owner: &str) {
        self.commands
            .write()
            .unwrap()
            .retain(|_, command| command.owner != owner);
    }

    /// Route a message by destination name. Resolution order: console
    /// sink, spectator pseudo-channel, `#`-prefixed public channel,
    /// username. Lookup misses surface as errors for the caller to log;
    /// the sending session is never torn down over them.
    pub fn handle_chat(
        &self,
        state: &AppState,
        source: &Arc<Session>,
        destination: &str,
        text: &str,
    ) -> Result<(), AppError> {
        if destination == CONSOLE_CHANNEL {
            tracing::info!(from = %source.user.username, "{text}");
            return Ok(());
        }

        if destination == self.spectator.name {
            let message = ChatMessage::global(source, SPECTATOR_CHANNEL, text);
            if self.chat_event_cancelled(state, &message) {
                return Ok(());
            }
            self.spectator_chat(state, source, &message);
            return Ok(());
        }

        if destination.starts_with('#') {
            let channel = self
                .channel(destination)
                .ok_or_else(|| AppError::ChannelNotFound(destination.to_string()))?;
            let message = ChatMessage::global(source, &channel.name, text);
            if self.chat_event_cancelled(state, &message) {
                return Ok(());
            }
            self.global_chat(state, source, &channel, &message);
            return Ok(());
        }

        // Clients talk to the bot by its public alias. If the live bot
        // session runs under a different account name, revoke the alias
        // conversation and re-route to the real one.
        if destination == BOT_ALIAS {
            if let Some(bot) = state.bot() {
                if bot.user.username != destination {
                    source.enqueue(out::channel_revoked(destination));
                    let real_name = bot.user.username.clone();
                    return self.handle_chat(state, source, &real_name, text);
                }
            }
        }

        let target = state
            .registry
            .by_name(destination)
            .ok_or_else(|| AppError::UserNotFound(destination.to_string()))?;
        let message = ChatMessage::private(source, &target.user.username, text);
        if self.chat_event_cancelled(state, &message) {
            return Ok(());
        }
        self.private_chat(state, &target, &message);
        Ok(())
    }

    /// Publish the cancelable chat event. True means an observer vetoed
    /// the message and nothing further may happen.
    fn chat_event_cancelled(&self, state: &AppState, message: &ChatMessage) -> bool {
        let mut event = Event::new(EventKind::Chat {
            source_id: message.source_id(),
            destination: message.destination_name().to_string(),
            text: message.text().to_string(),
        });
        state.events.publish(&mut event);
        if event.is_cancelled() {
            tracing::debug!(
                destination = message.destination_name(),
                "chat message vetoed by observer"
            );
        }
        event.is_cancelled()
    }

    fn global_chat(
        &self,
        state: &AppState,
        source: &Arc<Session>,
        channel: &Arc<Channel>,
        message: &ChatMessage,
    ) {
        channel.broadcast(&state.registry, out::send_message(message), Some(source.token));

        if message.text().starts_with('!') {
            let segments: Vec<&str> = message.text().split_whitespace().collect();
            self.dispatch_command(state, source, channel, &segments);
        }
    }

    /// Best-effort: the target resolved as online a moment ago, but if it
    /// vanished in between the message is dropped, not queued or errored.
    fn private_chat(&self, state: &AppState, target: &Arc<Session>, message: &ChatMessage) {
        if state.registry.by_token(&target.token).is_none() {
            tracing::debug!(target = %target.user.username, "dropping private message to offline user");
            return;
        }
        target.enqueue(out::send_message(message));
    }

    /// Spectator chat reaches the other parties in the relation, never the
    /// sender: a spectator's message goes to the spectated session and its
    /// other spectators; a spectated session's message goes to its own
    /// spectators.
    fn spectator_chat(&self, state: &AppState, source: &Arc<Session>, message: &ChatMessage) {
        let packet = out::send_message(message);
        let fan_out = |tokens: Vec<uuid::Uuid>| {
            for token in tokens {
                if token == source.token {
                    continue;
                }
                if let Some(member) = state.registry.by_token(&token) {
                    member.enqueue(packet.clone());
                }
            }
        };

        if let Some(target_token) = state.spectators.target_of(source.token) {
            if let Some(target) = state.registry.by_token(&target_token) {
                target.enqueue(packet.clone());
            }
            fan_out(state.spectators.watchers_of(target_token));
        } else {
            fan_out(state.spectators.watchers_of(source.token));
        }
    }

    /// `segments` is the whitespace-split message, command token first.
    /// Unknown commands are plain chat: no dispatch, no error back.
    pub fn dispatch_command(
        &self,
        state: &AppState,
        sender: &Arc<Session>,
        channel: &Arc<Channel>,
        segments: &[&str],
    ) {
        let Some(first) = segments.first() else {
            return;
        };
        let name = first.trim_start_matches('!');
        let command = self.commands.read().unwrap().get(name).cloned();
        if let Some(command) = command {
            tracing::debug!(command = %command.name, sender = %sender.user.username, "dispatching chat command");
            let context = CommandContext {
                state,
                sender,
                channel,
            };
            (command.handler)(&context, &segments[1..]);
        }
    }
}
