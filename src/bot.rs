use std::sync::Arc;

use crate::chat::BOT_ALIAS;
use crate::db;
use crate::error::AppError;
use crate::packet::out;
use crate::session::{Session, User};
use crate::state::AppState;

/// Owner tag for commands and subscriptions registered at startup.
/// Removing this owner deregisters them all in one sweep.
pub const INTERNAL_OWNER: &str = "internal";

/// Put the resident bot into the registry and wire up the built-in
/// commands. Nothing ever flushes the bot's queue, so it discards, and
/// the sweep leaves it alone.
pub async fn install(state: &AppState) -> Result<(), AppError> {
    let user = match db::users::get_by_id(&state.db, i64::from(state.config.bot_user_id)).await? {
        Some(row) => row.to_session_user(0),
        None => {
            tracing::warn!(
                bot_user_id = state.config.bot_user_id,
                "bot account missing from database, running under its alias"
            );
            User {
                id: state.config.bot_user_id,
                username: BOT_ALIAS.to_string(),
                ..User::default()
            }
        }
    };

    let groups = db::permissions::group_memberships(&state.db, i64::from(user.id)).await?;
    let session = Arc::new(Session::sink(user, groups, state.now_secs()));
    state.registry.add(Arc::clone(&session));

    register_builtin_commands(state);

    tracing::info!(username = %session.user.username, "resident bot installed");
    Ok(())
}

fn register_builtin_commands(state: &AppState) {
    state.chat.register_command("online", INTERNAL_OWNER, |ctx, _args| {
        let count = ctx.state.registry.len();
        ctx.sender
            .enqueue(out::announce(&format!("{count} user(s) online")));
    });

    state.chat.register_command("echo", INTERNAL_OWNER, |ctx, args| {
        if args.is_empty() {
            return;
        }
        ctx.sender.enqueue(out::announce(&args.join(" ")));
    });
}
