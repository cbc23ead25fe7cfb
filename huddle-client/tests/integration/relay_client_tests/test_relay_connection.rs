use crate::integration::init_tracing;
use huddle_client::RelayConnection;
use huddle_core::{ClientEvent, ServerEvent, SessionId};
use huddle_server::{RelayConfig, RelayService};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;

const STEP_TIMEOUT: Duration = Duration::from_secs(3);

async fn spawn_relay() -> (SocketAddr, oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind relay");
    let addr = listener.local_addr().expect("No local addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let relay = RelayService::new(RelayConfig::default());
    tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        let _ = huddle_server::serve(listener, relay, shutdown).await;
    });

    (addr, shutdown_tx)
}

#[tokio::test]
async fn test_create_room_round_trip() {
    init_tracing();
    let (addr, _shutdown) = spawn_relay().await;

    let mut relay = RelayConnection::connect(&format!("ws://{}", addr), SessionId::new())
        .await
        .unwrap();
    let room_id = tokio::time::timeout(STEP_TIMEOUT, relay.create_room())
        .await
        .unwrap()
        .unwrap();

    assert!(relay.ice_servers().is_some());
    assert_eq!(room_id.to_string().len(), 36);
}

#[tokio::test]
async fn test_join_over_websocket() {
    init_tracing();
    let (addr, _shutdown) = spawn_relay().await;
    let base = format!("ws://{}/", addr);

    let ann_id = SessionId::new();
    let mut ann = RelayConnection::connect(&base, ann_id).await.unwrap();
    let room_id = ann.create_room().await.unwrap();
    ann.send(ClientEvent::JoinRoom {
        room_id,
        session_id: ann_id,
        display_name: "ann".into(),
    })
    .unwrap();
    let roster = tokio::time::timeout(STEP_TIMEOUT, ann.recv())
        .await
        .unwrap();
    assert_eq!(roster, Some(ServerEvent::AllUsers { users: vec![] }));

    let bob_id = SessionId::new();
    let bob = RelayConnection::connect(&base, bob_id).await.unwrap();
    bob.send(ClientEvent::JoinRoom {
        room_id,
        session_id: bob_id,
        display_name: "bob".into(),
    })
    .unwrap();

    let notice = tokio::time::timeout(STEP_TIMEOUT, ann.recv())
        .await
        .unwrap();
    assert!(matches!(
        notice,
        Some(ServerEvent::UserConnected(p)) if p.session_id == bob_id && p.display_name == "bob"
    ));

    drop(bob);
    let departed = tokio::time::timeout(STEP_TIMEOUT, ann.recv())
        .await
        .unwrap();
    assert_eq!(
        departed,
        Some(ServerEvent::UserDisconnected { session_id: bob_id })
    );
}

#[tokio::test]
async fn test_queued_leave_is_flushed_before_socket_closes() {
    init_tracing();
    let (addr, _shutdown) = spawn_relay().await;
    let base = format!("ws://{}/", addr);

    let ann_id = SessionId::new();
    let mut ann = RelayConnection::connect(&base, ann_id).await.unwrap();
    let room_id = ann.create_room().await.unwrap();
    ann.send(ClientEvent::JoinRoom {
        room_id,
        session_id: ann_id,
        display_name: "ann".into(),
    })
    .unwrap();
    tokio::time::timeout(STEP_TIMEOUT, ann.recv())
        .await
        .unwrap();

    let bob_id = SessionId::new();
    let bob = RelayConnection::connect(&base, bob_id).await.unwrap();
    let parts = bob.into_parts();
    for event in [
        ClientEvent::JoinRoom {
            room_id,
            session_id: bob_id,
            display_name: "bob".into(),
        },
        ClientEvent::SendMessage {
            content: "bye".into(),
        },
        ClientEvent::LeaveRoom,
    ] {
        parts.outbound.send(event).unwrap();
    }
    drop(parts.outbound);
    tokio::time::timeout(STEP_TIMEOUT, parts.writer)
        .await
        .unwrap()
        .unwrap();

    let mut seen = Vec::new();
    while seen.len() < 3 {
        let event = tokio::time::timeout(STEP_TIMEOUT, ann.recv())
            .await
            .unwrap()
            .unwrap();
        seen.push(event);
    }
    assert!(matches!(&seen[0], ServerEvent::UserConnected(p) if p.session_id == bob_id));
    assert!(matches!(&seen[1], ServerEvent::ReceiveMessage(m) if m.content == "bye"));
    assert_eq!(
        seen[2],
        ServerEvent::UserDisconnected { session_id: bob_id }
    );
}

#[tokio::test]
async fn test_close_flushes_pending_sends() {
    init_tracing();
    let (addr, _shutdown) = spawn_relay().await;
    let base = format!("ws://{}/", addr);

    let ann_id = SessionId::new();
    let mut ann = RelayConnection::connect(&base, ann_id).await.unwrap();
    let room_id = ann.create_room().await.unwrap();
    ann.send(ClientEvent::JoinRoom {
        room_id,
        session_id: ann_id,
        display_name: "ann".into(),
    })
    .unwrap();
    tokio::time::timeout(STEP_TIMEOUT, ann.recv())
        .await
        .unwrap();

    let bob_id = SessionId::new();
    let bob = RelayConnection::connect(&base, bob_id).await.unwrap();
    bob.send(ClientEvent::JoinRoom {
        room_id,
        session_id: bob_id,
        display_name: "bob".into(),
    })
    .unwrap();
    tokio::time::timeout(STEP_TIMEOUT, bob.close())
        .await
        .unwrap();

    let notice = tokio::time::timeout(STEP_TIMEOUT, ann.recv())
        .await
        .unwrap();
    assert!(matches!(notice, Some(ServerEvent::UserConnected(p)) if p.session_id == bob_id));
}
