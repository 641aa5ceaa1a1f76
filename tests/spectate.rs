mod common;

use banchoserver::chat::SPECTATOR_CHANNEL;
use banchoserver::events::EventType;
use banchoserver::packet::{PacketReader, ServerPacketId};
use banchoserver::spectate;

use common::{decode_message, drain_ids, id_of, TestServer};

fn payload_user_id(payload: &[u8]) -> i32 {
    PacketReader::new(payload).read_i32().unwrap()
}

#[tokio::test]
async fn test_spectate_links_both_directions() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");

    spectate::spectate(&server.state, &a, &b);

    assert_eq!(server.state.spectators.target_of(a.token), Some(b.token));
    assert_eq!(server.state.spectators.watchers_of(b.token), vec![a.token]);

    let b_packets = b.drain();
    assert_eq!(
        b_packets.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![
            id_of(ServerPacketId::SpectatorJoined),
            id_of(ServerPacketId::ChannelJoinSuccess)
        ]
    );
    assert_eq!(payload_user_id(&b_packets[0].payload), 1);
    assert_eq!(
        drain_ids(&a),
        vec![id_of(ServerPacketId::ChannelJoinSuccess)]
    );
}

#[tokio::test]
async fn test_stop_spectating_clears_both_directions() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");

    spectate::spectate(&server.state, &a, &b);
    a.drain();
    b.drain();

    spectate::stop_spectating(&server.state, &a);

    assert_eq!(server.state.spectators.target_of(a.token), None);
    assert!(server.state.spectators.watchers_of(b.token).is_empty());
    assert_eq!(drain_ids(&b), vec![id_of(ServerPacketId::SpectatorLeft)]);
    assert_eq!(drain_ids(&a), vec![id_of(ServerPacketId::ChannelRevoked)]);
}

#[tokio::test]
async fn test_stop_spectating_when_not_spectating_is_a_noop() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    spectate::stop_spectating(&server.state, &a);
    assert_eq!(a.queued(), 0);
}

#[tokio::test]
async fn test_switching_targets_moves_the_relation() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");
    let c = server.connect(3, "c");

    spectate::spectate(&server.state, &a, &b);
    b.drain();
    spectate::spectate(&server.state, &a, &c);

    assert_eq!(server.state.spectators.target_of(a.token), Some(c.token));
    assert!(server.state.spectators.watchers_of(b.token).is_empty());
    assert_eq!(server.state.spectators.watchers_of(c.token), vec![a.token]);
    assert_eq!(drain_ids(&b), vec![id_of(ServerPacketId::SpectatorLeft)]);
}

#[tokio::test]
async fn test_fellow_spectators_learn_about_joiners() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");
    let c = server.connect(3, "c");

    spectate::spectate(&server.state, &a, &b);
    a.drain();
    b.drain();

    spectate::spectate(&server.state, &c, &b);

    let a_packets = a.drain();
    assert_eq!(a_packets.len(), 1);
    assert_eq!(a_packets[0].id, id_of(ServerPacketId::FellowSpectatorJoined));
    assert_eq!(payload_user_id(&a_packets[0].payload), 3);

    let b_packets = b.drain();
    assert_eq!(b_packets[0].id, id_of(ServerPacketId::SpectatorJoined));
    assert_eq!(payload_user_id(&b_packets[0].payload), 3);

    assert_eq!(
        drain_ids(&c),
        vec![id_of(ServerPacketId::ChannelJoinSuccess)],
        "one join confirmation, not duplicated"
    );
}

#[tokio::test]
async fn test_fellow_spectators_learn_about_leavers() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");
    let c = server.connect(3, "c");

    spectate::spectate(&server.state, &a, &b);
    spectate::spectate(&server.state, &c, &b);
    for session in [&a, &b, &c] {
        session.drain();
    }

    spectate::stop_spectating(&server.state, &c);

    let a_packets = a.drain();
    assert_eq!(a_packets.len(), 1);
    assert_eq!(a_packets[0].id, id_of(ServerPacketId::FellowSpectatorLeft));
    assert_eq!(payload_user_id(&a_packets[0].payload), 3);
    assert_eq!(drain_ids(&b), vec![id_of(ServerPacketId::SpectatorLeft)]);
}

#[tokio::test]
async fn test_self_spectate_is_refused() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");

    spectate::spectate(&server.state, &a, &a);

    assert_eq!(server.state.spectators.target_of(a.token), None);
    assert!(server.state.spectators.watchers_of(a.token).is_empty());
    assert_eq!(
        drain_ids(&a),
        vec![id_of(ServerPacketId::SpectatorCantSpectate)]
    );
}

// Nothing prevents a mutual relation; this pins down the current contract
// rather than asserting it is desirable.
#[tokio::test]
async fn test_mutual_spectate_cycle_is_not_prevented() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");

    spectate::spectate(&server.state, &a, &b);
    spectate::spectate(&server.state, &b, &a);

    assert_eq!(server.state.spectators.target_of(a.token), Some(b.token));
    assert_eq!(server.state.spectators.target_of(b.token), Some(a.token));
    assert_eq!(server.state.spectators.watchers_of(a.token), vec![b.token]);
    assert_eq!(server.state.spectators.watchers_of(b.token), vec![a.token]);
}

#[tokio::test]
async fn test_spectator_chat_from_viewer_reaches_target_and_fellows() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");
    let c = server.connect(3, "c");

    spectate::spectate(&server.state, &a, &b);
    spectate::spectate(&server.state, &c, &b);
    for session in [&a, &b, &c] {
        session.drain();
    }

    server
        .state
        .chat
        .handle_chat(&server.state, &a, SPECTATOR_CHANNEL, "nice play")
        .unwrap();

    for receiver in [&b, &c] {
        let packets = receiver.drain();
        assert_eq!(packets.len(), 1);
        let (sender, text, destination, _) = decode_message(&packets[0]);
        assert_eq!(sender, "a");
        assert_eq!(text, "nice play");
        assert_eq!(destination, SPECTATOR_CHANNEL);
    }
    assert_eq!(a.queued(), 0, "the sender is the source, not a recipient");
}

#[tokio::test]
async fn test_spectator_chat_from_target_reaches_its_spectators() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");
    let c = server.connect(3, "c");

    spectate::spectate(&server.state, &a, &b);
    spectate::spectate(&server.state, &c, &b);
    for session in [&a, &b, &c] {
        session.drain();
    }

    server
        .state
        .chat
        .handle_chat(&server.state, &b, SPECTATOR_CHANNEL, "thanks")
        .unwrap();

    for receiver in [&a, &c] {
        assert_eq!(drain_ids(receiver), vec![id_of(ServerPacketId::SendMessage)]);
    }
    assert_eq!(b.queued(), 0);
}

#[tokio::test]
async fn test_disconnecting_a_spectated_session_unwinds_its_watchers() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");

    spectate::spectate(&server.state, &a, &b);
    a.drain();

    banchoserver::session::disconnect(&server.state, &b);

    assert_eq!(server.state.spectators.target_of(a.token), None);
    let ids = drain_ids(&a);
    assert!(ids.contains(&id_of(ServerPacketId::ChannelRevoked)));
    assert!(ids.contains(&id_of(ServerPacketId::UserQuit)));
    assert!(server.state.registry.by_name("b").is_none());
}

#[tokio::test]
async fn test_cancelled_leave_event_keeps_the_relation() {
    let server = TestServer::new().await;
    let a = server.connect(1, "a");
    let b = server.connect(2, "b");
    let c = server.connect(3, "c");

    spectate::spectate(&server.state, &a, &b);
    server
        .state
        .events
        .subscribe("guard", EventType::SpectateLeave, |event| event.cancel());

    spectate::stop_spectating(&server.state, &a);
    assert_eq!(server.state.spectators.target_of(a.token), Some(b.token));

    // a vetoed leave also aborts a switch; the old link must stay the
    // only one
    spectate::spectate(&server.state, &a, &c);
    assert_eq!(server.state.spectators.target_of(a.token), Some(b.token));
    assert!(server.state.spectators.watchers_of(c.token).is_empty());
}
