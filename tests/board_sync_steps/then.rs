//! Then steps for board synchronization BDD scenarios.

use super::world::{BoardSyncWorld, column_id, wait_for_board};
use trellis::board::{
    domain::{ActivityKind, Board, ErrorKind},
    services::{ConnectionState, SyncError},
};
use rstest_bdd_macros::then;

#[then(r#""{name}" sees task "{title}" at the head of column "{column}""#)]
fn task_at_head(
    world: &BoardSyncWorld,
    name: String,
    title: String,
    column: String,
) -> Result<(), eyre::Report> {
    let target = column_id(&column)?;
    let task_id = world.task_id(&title)?;
    let board = wait_for_board(world.participant(&name)?, |board| {
        board
            .column(&target)
            .and_then(|owner| owner.task_ids().first())
            == Some(&task_id)
    })?;
    if board.check_invariants().is_err() {
        return Err(eyre::eyre!("{name}'s board violates its invariants"));
    }
    Ok(())
}

#[then(r#""{name}" sees the latest activity on "{title}" as "{action}""#)]
fn latest_activity(
    world: &BoardSyncWorld,
    name: String,
    title: String,
    action: String,
) -> Result<(), eyre::Report> {
    let expected = ActivityKind::try_from(action.as_str())
        .map_err(|err| eyre::eyre!("invalid expected activity in scenario: {err}"))?;
    let task_id = world.task_id(&title)?;
    let participant = world.participant(&name)?;
    wait_for_board(participant, |board| {
        board.activity_for(&task_id).map(|activity| activity.action()) == Some(expected)
    })?;
    Ok(())
}

#[then(r#""{name}" sees a column titled "{title}""#)]
fn column_titled(world: &BoardSyncWorld, name: String, title: String) -> Result<(), eyre::Report> {
    wait_for_board(world.participant(&name)?, |board| {
        board.columns().values().any(|column| column.title() == title)
    })?;
    Ok(())
}

#[then(r#""{name}" does not see task "{title}""#)]
fn task_absent(world: &BoardSyncWorld, name: String, title: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&title)?;
    let board = world.participant(&name)?.session.current_board();
    if board.task(&task_id).is_some() {
        return Err(eyre::eyre!("{name} still sees task {title}"));
    }
    Ok(())
}

#[then("the last operation fails with an invalid argument error")]
fn last_operation_invalid(world: &BoardSyncWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing operation result"))?;
    match result {
        Err(SyncError::Domain(err)) if err.kind() == ErrorKind::InvalidArgument => Ok(()),
        other => Err(eyre::eyre!("expected an invalid argument error, got {other:?}")),
    }
}

#[then(r#""{name}" still sees the seed board"#)]
fn still_seed(world: &BoardSyncWorld, name: String) -> Result<(), eyre::Report> {
    let board = world.participant(&name)?.session.current_board();
    if *board != Board::seed() {
        return Err(eyre::eyre!("{name}'s board changed: {board:?}"));
    }
    Ok(())
}

#[then(r#""{name}" sees {count:u32} active users"#)]
fn active_users(world: &BoardSyncWorld, name: String, count: u32) -> Result<(), eyre::Report> {
    wait_for_board(world.participant(&name)?, |board| board.active_users() == count)?;
    Ok(())
}

#[then(r#""{name}" is disconnected"#)]
fn is_disconnected(world: &BoardSyncWorld, name: String) -> Result<(), eyre::Report> {
    let state = world.participant(&name)?.session.connection_state();
    if state != ConnectionState::Disconnected {
        return Err(eyre::eyre!("expected {name} to be disconnected, found {state}"));
    }
    Ok(())
}
