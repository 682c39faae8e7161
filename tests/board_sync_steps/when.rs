//! When steps for board synchronization BDD scenarios.

use super::world::{BoardSyncWorld, column_id, run_async, wait_for_board};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#""{name}" creates task "{title}" in column "{column}""#)]
fn create_task(
    world: &mut BoardSyncWorld,
    name: String,
    title: String,
    column: String,
) -> Result<(), eyre::Report> {
    let target = column_id(&column)?;
    let participant = world.participant(&name)?;
    let task_id = run_async(participant.session.create_task(&target, &title, None))
        .wrap_err("create task")?;
    world.tasks.insert(title, task_id);
    Ok(())
}

#[when(r#""{name}" tries to create task "{title}" in column "{column}""#)]
fn try_create_task(
    world: &mut BoardSyncWorld,
    name: String,
    title: String,
    column: String,
) -> Result<(), eyre::Report> {
    let target = column_id(&column)?;
    let participant = world.participant(&name)?;
    let result = run_async(participant.session.create_task(&target, &title, None));
    world.last_result = Some(result.map(|_| ()));
    Ok(())
}

#[when(r#""{name}" moves task "{title}" to column "{column}" at index {index:usize}"#)]
fn move_task(
    world: &mut BoardSyncWorld,
    name: String,
    title: String,
    column: String,
    index: usize,
) -> Result<(), eyre::Report> {
    let destination = column_id(&column)?;
    let task_id = world.task_id(&title)?;
    let participant = world.participant(&name)?;
    let board = participant.session.current_board();
    let source = board
        .column_of(&task_id)
        .map(|owner| owner.id().clone())
        .ok_or_else(|| eyre::eyre!("task {title} is not on {name}'s board"))?;
    run_async(
        participant
            .session
            .move_task(&task_id, &source, &destination, index),
    )
    .wrap_err("move task")?;
    Ok(())
}

#[when(r#""{name}" deletes task "{title}""#)]
fn delete_task(world: &mut BoardSyncWorld, name: String, title: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&title)?;
    let participant = world.participant(&name)?;
    let board = wait_for_board(participant, |board| board.task(&task_id).is_some())?;
    let owner = board
        .column_of(&task_id)
        .map(|column| column.id().clone())
        .ok_or_else(|| eyre::eyre!("task {title} has no owning column"))?;
    run_async(participant.session.delete_task(&task_id, &owner)).wrap_err("delete task")?;
    Ok(())
}

#[when(r#""{name}" creates column "{title}""#)]
fn create_column(world: &mut BoardSyncWorld, name: String, title: String) -> Result<(), eyre::Report> {
    let participant = world.participant(&name)?;
    run_async(participant.session.create_column(&title)).wrap_err("create column")?;
    Ok(())
}

#[when(r#""{name}" connects"#)]
fn connect(world: &mut BoardSyncWorld, name: String) -> Result<(), eyre::Report> {
    let participant = world.participant(&name)?;
    run_async(participant.session.connect()).wrap_err("connect participant")?;
    Ok(())
}

#[when(r#""{name}" disconnects"#)]
fn disconnect(world: &mut BoardSyncWorld, name: String) -> Result<(), eyre::Report> {
    let participant = world.participant(&name)?;
    run_async(participant.session.disconnect()).wrap_err("disconnect participant")?;
    Ok(())
}

#[when(r#""{name}" can no longer send to the hub"#)]
fn link_fails(world: &mut BoardSyncWorld, name: String) -> Result<(), eyre::Report> {
    world.participant(&name)?.link.set_available(false);
    Ok(())
}
