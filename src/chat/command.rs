use std::sync::Arc;

use super::channel::Channel;
use crate::session::Session;
use crate::state::AppState;

/// Everything a command handler gets to work with: the sending session and
/// the channel the command was typed into.
pub struct CommandContext<'a> {
    pub state: &'a AppState,
    pub sender: &'a Arc<Session>,
    pub channel: &'a Arc<Channel>,
}

pub type CommandHandler = Box<dyn Fn(&CommandContext<'_>, &[&str]) + Send + Sync>;

/// A command plus the owner that registered it. The owner tag is what
/// bulk deregistration keys on when a collaborator unloads.
pub struct RegisteredCommand {
    pub name: String,
    pub owner: String,
    pub handler: CommandHandler,
}
