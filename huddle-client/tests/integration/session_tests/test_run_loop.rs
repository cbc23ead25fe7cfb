use super::{Harness, participant};
use crate::integration::init_tracing;
use huddle_client::SessionCommand;
use huddle_core::{ClientEvent, ServerEvent, SignalPayload};
use std::time::Duration;
use tokio::sync::mpsc;

const STEP_TIMEOUT: Duration = Duration::from_secs(3);

#[tokio::test]
async fn test_run_handles_events_until_leave() {
    init_tracing();
    let Harness {
        session,
        mut outbound,
        link_events,
        ..
    } = Harness::new().await;
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::channel(8);
    let task = tokio::spawn(session.run(link_events, inbound_rx, command_rx));

    let x = participant("x");
    inbound_tx
        .send(ServerEvent::AllUsers {
            users: vec![x.clone()],
        })
        .unwrap();

    let event = tokio::time::timeout(STEP_TIMEOUT, outbound.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        event,
        ClientEvent::Signal { to, payload: SignalPayload::Offer { .. } } if to == x.session_id
    ));

    command_tx
        .send(SessionCommand::SendChat("hello".into()))
        .await
        .unwrap();
    command_tx.send(SessionCommand::Leave).await.unwrap();
    tokio::time::timeout(STEP_TIMEOUT, task)
        .await
        .unwrap()
        .unwrap();

    let mut rest = Vec::new();
    while let Some(event) = outbound.recv().await {
        rest.push(event);
    }
    assert!(rest.contains(&ClientEvent::SendMessage {
        content: "hello".into()
    }));
    assert_eq!(rest.last(), Some(&ClientEvent::LeaveRoom));
}

#[tokio::test]
async fn test_relay_loss_ends_session() {
    init_tracing();
    let Harness {
        session,
        mut outbound,
        link_events,
        ..
    } = Harness::new().await;
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (_command_tx, command_rx) = mpsc::channel(8);
    let task = tokio::spawn(session.run(link_events, inbound_rx, command_rx));

    drop(inbound_tx);
    tokio::time::timeout(STEP_TIMEOUT, task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outbound.recv().await, Some(ClientEvent::LeaveRoom));
}
