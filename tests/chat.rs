mod common;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use banchoserver::chat::{BOT_ALIAS, CONSOLE_CHANNEL};
use banchoserver::error::AppError;
use banchoserver::events::EventType;
use banchoserver::packet::ServerPacketId;
use banchoserver::session::{Session, User};

use common::{decode_message, drain_ids, id_of, TestServer};

#[tokio::test]
async fn test_channel_message_reaches_every_other_member_once() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");
    let c = server.connect(3, "c");
    for session in [&a, &b, &c] {
        server.join_channel(session, "#osu");
    }

    server
        .state
        .chat
        .handle_chat(&server.state, &a, "#osu", "hello")
        .unwrap();

    for receiver in [&b, &c] {
        let packets = receiver.drain();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].id, id_of(ServerPacketId::SendMessage));
        let (sender, text, destination, sender_id) = decode_message(&packets[0]);
        assert_eq!(sender, "a");
        assert_eq!(text, "hello");
        assert_eq!(destination, "#osu");
        assert_eq!(sender_id, 1);
    }
    assert_eq!(a.queued(), 0, "sender does not get their own message back");
}

#[tokio::test]
async fn test_command_dispatch_passes_remaining_tokens() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");
    server.join_channel(&a, "#osu");
    server.join_channel(&b, "#osu");

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        server.state.chat.register_command("foo", "test", move |ctx, args| {
            assert_eq!(ctx.sender.user.id, 1);
            assert_eq!(ctx.channel.name, "#osu");
            seen.lock()
                .unwrap()
                .extend(args.iter().map(|s| s.to_string()));
        });
    }

    server
        .state
        .chat
        .handle_chat(&server.state, &a, "#osu", "!foo bar baz")
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["bar", "baz"]);
    // the command line is still chat, so members see it
    assert_eq!(
        drain_ids(&b),
        vec![id_of(ServerPacketId::SendMessage)]
    );
}

#[tokio::test]
async fn test_unknown_command_is_plain_chat_not_an_error() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");
    server.join_channel(&a, "#osu");
    server.join_channel(&b, "#osu");

    let result = server
        .state
        .chat
        .handle_chat(&server.state, &a, "#osu", "!foo bar baz");
    assert!(result.is_ok());
    assert_eq!(drain_ids(&b), vec![id_of(ServerPacketId::SendMessage)]);
}

#[tokio::test]
async fn test_removed_owner_commands_stop_dispatching() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    server.join_channel(&a, "#osu");

    let calls = Arc::new(Mutex::new(0));
    {
        let calls = Arc::clone(&calls);
        server
            .state
            .chat
            .register_command("foo", "plugin-x", move |_, _| {
                *calls.lock().unwrap() += 1;
            });
    }

    server.state.chat.remove_commands("plugin-x");
    server
        .state
        .chat
        .handle_chat(&server.state, &a, "#osu", "!foo")
        .unwrap();
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_private_message_delivered_when_online() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");

    server
        .state
        .chat
        .handle_chat(&server.state, &a, "b", "psst")
        .unwrap();

    let packets = b.drain();
    assert_eq!(packets.len(), 1);
    let (sender, text, destination, _) = decode_message(&packets[0]);
    assert_eq!(sender, "a");
    assert_eq!(text, "psst");
    assert_eq!(destination, "b");
}

#[tokio::test]
async fn test_private_message_to_offline_user_is_a_lookup_miss() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");

    let result = server
        .state
        .chat
        .handle_chat(&server.state, &a, "ghost", "anyone there?");
    assert!(matches!(result, Err(AppError::UserNotFound(name)) if name == "ghost"));
}

#[tokio::test]
async fn test_unknown_channel_is_a_lookup_miss() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");

    let result = server
        .state
        .chat
        .handle_chat(&server.state, &a, "#void", "hello?");
    assert!(matches!(result, Err(AppError::ChannelNotFound(name)) if name == "#void"));
}

#[tokio::test]
async fn test_cancelled_chat_event_drops_the_message() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");
    server.join_channel(&a, "#osu");
    server.join_channel(&b, "#osu");

    server
        .state
        .events
        .subscribe("filter", EventType::Chat, |event| event.cancel());

    server
        .state
        .chat
        .handle_chat(&server.state, &a, "#osu", "blocked")
        .unwrap();
    assert_eq!(b.queued(), 0);
}

#[tokio::test]
async fn test_console_destination_only_logs() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");

    server
        .state
        .chat
        .handle_chat(&server.state, &a, CONSOLE_CHANNEL, "server notice")
        .unwrap();
    assert_eq!(a.queued(), 0);
    assert_eq!(b.queued(), 0);
}

#[tokio::test]
async fn test_bot_alias_redirects_to_real_bot_session() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");

    // resident bot runs under a different account name than its alias
    let bot = Arc::new(Session::sink(
        User {
            id: server.state.config.bot_user_id,
            username: "Resident".to_string(),
            ..User::default()
        },
        HashSet::new(),
        0,
    ));
    server.state.registry.add(Arc::clone(&bot));

    server
        .state
        .chat
        .handle_chat(&server.state, &a, BOT_ALIAS, "!help")
        .unwrap();

    // the alias conversation is revoked, then the message is re-routed to
    // the bot's real session (whose queue discards)
    assert_eq!(drain_ids(&a), vec![id_of(ServerPacketId::ChannelRevoked)]);
}

#[tokio::test]
async fn test_bot_alias_passes_through_when_names_match() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");

    let bot = Arc::new(Session::sink(
        User {
            id: server.state.config.bot_user_id,
            username: BOT_ALIAS.to_string(),
            ..User::default()
        },
        HashSet::new(),
        0,
    ));
    server.state.registry.add(Arc::clone(&bot));

    server
        .state
        .chat
        .handle_chat(&server.state, &a, BOT_ALIAS, "hi bot")
        .unwrap();
    assert_eq!(a.queued(), 0, "no revoke when the alias is the real name");
}

#[tokio::test]
async fn test_removing_a_channel_drops_membership() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    server.join_channel(&a, "#osu");

    assert!(server.state.chat.remove_channel("#osu"));
    let result = server
        .state
        .chat
        .handle_chat(&server.state, &a, "#osu", "hello?");
    assert!(matches!(result, Err(AppError::ChannelNotFound(_))));
}
