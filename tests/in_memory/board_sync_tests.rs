//! Multi-participant convergence over the in-process hub.

use super::helpers::{clock, column_titles, connected, hub, session_with, wait_until};
use rstest::rstest;
use trellis::board::{
    adapters::memory::{BoardHub, ManualClock},
    domain::{ActivityKind, ColumnId},
    services::SyncConfig,
};

fn column(id: &str) -> ColumnId {
    ColumnId::new(id).expect("valid column id")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn three_participants_converge_on_one_board(hub: BoardHub, clock: ManualClock) {
    let alice = connected(&hub, &clock, "alice").await;
    let bob = connected(&hub, &clock, "bob").await;
    let carol = connected(&hub, &clock, "carol").await;
    for session in [&alice, &bob, &carol] {
        wait_until(session, |board| board.active_users() == 3).await;
    }

    let task_id = alice
        .create_task(&column("column-1"), "Draft", None)
        .await
        .expect("task created");
    wait_until(&bob, |board| board.task(&task_id).is_some()).await;
    bob.update_task(&task_id, "Draft v2", Some("with notes"))
        .await
        .expect("task updated");
    wait_until(&carol, |board| {
        board
            .task(&task_id)
            .is_some_and(|task| task.title() == "Draft v2")
    })
    .await;
    carol
        .move_task(&task_id, &column("column-1"), &column("column-3"), 0)
        .await
        .expect("task moved");

    let expected = carol.current_board();
    for session in [&alice, &bob] {
        let seen = wait_until(session, |board| {
            board
                .column(&column("column-3"))
                .is_some_and(|done| done.contains(&task_id))
        })
        .await;
        assert_eq!(seen.tasks(), expected.tasks());
        assert_eq!(seen.columns(), expected.columns());
        assert!(seen.check_invariants().is_ok());
    }
    let activity = alice.activity_for(&task_id).expect("activity recorded");
    assert_eq!(activity.action(), ActivityKind::Moved);
    assert_eq!(activity.actor().as_str(), "carol");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn column_creations_follow_apply_order(hub: BoardHub, clock: ManualClock) {
    let alice = connected(&hub, &clock, "alice").await;
    let bob = connected(&hub, &clock, "bob").await;
    let carol = connected(&hub, &clock, "carol").await;

    let first = alice.create_column("A").await.expect("column created");
    wait_until(&bob, |board| board.column(&first).is_some()).await;
    let second = bob.create_column("B").await.expect("column created");

    for session in [&alice, &bob, &carol] {
        let seen = wait_until(session, |board| board.column(&second).is_some()).await;
        assert_eq!(
            column_titles(&seen),
            ["To Do", "In Progress", "Done", "A", "B"]
        );
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_column_cascades_for_every_peer(hub: BoardHub, clock: ManualClock) {
    let alice = connected(&hub, &clock, "alice").await;
    let bob = connected(&hub, &clock, "bob").await;
    let doomed = alice.create_column("Scratch").await.expect("column created");
    let first = alice
        .create_task(&doomed, "One", None)
        .await
        .expect("task created");
    let second = alice
        .create_task(&doomed, "Two", None)
        .await
        .expect("task created");
    wait_until(&bob, |board| board.task(&second).is_some()).await;

    bob.delete_column(&doomed).await.expect("column deleted");

    let seen = wait_until(&alice, |board| board.column(&doomed).is_none()).await;
    assert!(seen.task(&first).is_none());
    assert!(seen.task(&second).is_none());
    assert!(seen.user_activity().is_empty());
    assert!(seen.check_invariants().is_ok());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sessions_load_settings_from_toml(hub: BoardHub, clock: ManualClock) {
    let config = SyncConfig::from_toml_str(
        r#"
        actor = "dora"
        outbox_capacity = 8
        "#,
    )
    .expect("valid config");
    let dora = session_with(&hub, &clock, config);

    dora.connect().await.expect("dora connects");
    let column_id = dora.create_column("Mine").await.expect("column created");

    assert_eq!(dora.actor().as_str(), "dora");
    assert!(column_id.as_str().starts_with("column-dora-"));
    assert_eq!(hub.peer_count(), 1);
}
