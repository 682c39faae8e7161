//! Given steps for board synchronization BDD scenarios.

use super::world::{BoardSyncWorld, run_async, wait_for_board};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"participants "{first}" and "{second}" are connected to the hub"#)]
fn participants_connected(
    world: &mut BoardSyncWorld,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    for name in [&first, &second] {
        world.add_participant(name)?;
        let participant = world.participant(name)?;
        run_async(participant.session.connect()).wrap_err("connect participant")?;
    }
    wait_for_board(world.participant(&first)?, |board| board.active_users() == 2)?;
    Ok(())
}

#[given(r#"participant "{name}" is offline"#)]
fn participant_offline(world: &mut BoardSyncWorld, name: String) -> Result<(), eyre::Report> {
    world.add_participant(&name)
}

#[given(r#"participant "{name}" is connected to the hub"#)]
fn participant_connected(world: &mut BoardSyncWorld, name: String) -> Result<(), eyre::Report> {
    world.add_participant(&name)?;
    let participant = world.participant(&name)?;
    run_async(participant.session.connect()).wrap_err("connect participant")?;
    Ok(())
}
