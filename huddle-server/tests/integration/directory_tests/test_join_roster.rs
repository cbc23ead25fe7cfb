use huddle_core::{Participant, ServerEvent, SessionId};

use crate::integration::{create_test_directory, init_tracing};

#[tokio::test]
async fn test_first_joiner_gets_empty_roster() {
    init_tracing();

    let (directory, output) = create_test_directory();
    let room = directory.create_room();
    let ann = SessionId::new();

    let roster = directory
        .join(room, ann, "Ann".into())
        .await
        .expect("Join failed");

    assert!(roster.is_empty());
    assert_eq!(
        output.events_for(&ann).await,
        vec![ServerEvent::AllUsers { users: vec![] }]
    );
    assert!(directory.is_live(&room));
    assert_eq!(directory.room_of(&ann), Some(room));
}

#[tokio::test]
async fn test_roster_lists_others_in_join_order() {
    init_tracing();

    let (directory, output) = create_test_directory();
    let room = directory.create_room();
    let (a, b, c) = (SessionId::new(), SessionId::new(), SessionId::new());

    directory.join(room, a, "A".into()).await.expect("Join A");
    directory.join(room, b, "B".into()).await.expect("Join B");
    let roster = directory.join(room, c, "C".into()).await.expect("Join C");

    assert_eq!(
        roster,
        vec![Participant::new(a, "A"), Participant::new(b, "B")]
    );
    assert!(roster.iter().all(|p| p.session_id != c));

    let c_joined = ServerEvent::UserConnected(Participant::new(c, "C"));
    assert_eq!(
        output.events_for(&a).await,
        vec![
            ServerEvent::AllUsers { users: vec![] },
            ServerEvent::UserConnected(Participant::new(b, "B")),
            c_joined.clone(),
        ]
    );
    assert_eq!(
        output.events_for(&b).await,
        vec![
            ServerEvent::AllUsers {
                users: vec![Participant::new(a, "A")]
            },
            c_joined,
        ]
    );
}

#[tokio::test]
async fn test_roster_reaches_joiner_before_join_notice() {
    init_tracing();

    let (directory, output) = create_test_directory();
    let room = directory.create_room();
    let (a, b) = (SessionId::new(), SessionId::new());

    directory.join(room, a, "A".into()).await.expect("Join A");
    directory.join(room, b, "B".into()).await.expect("Join B");

    let roster_at = output
        .position(|to, e| *to == b && matches!(e, ServerEvent::AllUsers { .. }))
        .await
        .expect("B never got a roster");
    let notice_at = output
        .position(|to, e| {
            *to == a && matches!(e, ServerEvent::UserConnected(p) if p.session_id == b)
        })
        .await
        .expect("A never heard of B");

    assert!(roster_at < notice_at);
}

#[tokio::test]
async fn test_rejoin_updates_name_without_duplicating() {
    init_tracing();

    let (directory, output) = create_test_directory();
    let room = directory.create_room();
    let (a, b) = (SessionId::new(), SessionId::new());

    directory.join(room, a, "A".into()).await.expect("Join A");
    directory.join(room, b, "B".into()).await.expect("Join B");
    let again = directory
        .join(room, b, "Bea".into())
        .await
        .expect("Rejoin B");
    assert_eq!(again, vec![Participant::new(a, "A")]);

    let notices = output
        .events_for(&a)
        .await
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::UserConnected(_)))
        .count();
    assert_eq!(notices, 1, "rejoin must not re-announce");

    let newcomer = SessionId::new();
    let roster = directory
        .join(room, newcomer, "Newcomer".into())
        .await
        .expect("Join newcomer");
    assert_eq!(
        roster,
        vec![Participant::new(a, "A"), Participant::new(b, "Bea")]
    );
}

#[tokio::test]
async fn test_joining_other_room_leaves_current() {
    init_tracing();

    let (directory, output) = create_test_directory();
    let first = directory.create_room();
    let second = directory.create_room();
    let (a, b) = (SessionId::new(), SessionId::new());

    directory.join(first, a, "A".into()).await.expect("Join A");
    directory.join(first, b, "B".into()).await.expect("Join B");
    directory
        .join(second, b, "B".into())
        .await
        .expect("Move B");

    assert_eq!(directory.room_of(&b), Some(second));
    assert!(
        output
            .events_for(&a)
            .await
            .contains(&ServerEvent::UserDisconnected { session_id: b })
    );
}
