//! Mutation engine: pure transitions from one valid board to the next.
//!
//! Every operation borrows the current board and returns either a new board
//! or a [`BoardDomainError`]. The input is never modified, so a failed
//! operation leaves the caller's snapshot exactly as it was.
//!
//! Local operations ([`create_task`], [`move_task`], ...) resolve their
//! arguments into a [`BoardEvent`] and then call [`apply`], which is also the
//! entry point for events received from peers. Both paths therefore run the
//! same transition code.
//!
//! Index arguments follow splice semantics: the element is removed first,
//! then inserted at `new_index` clamped to the shortened list's length.

use super::{
    Activity, ActivityKind, ActorId, Board, BoardCommand, BoardDomainError, BoardEvent, Column,
    ColumnId, Task, TaskId,
};
use super::task::normalize_description;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

/// Result type for mutation engine operations.
pub type MutationResult<T> = Result<T, BoardDomainError>;

/// Who is mutating the board, and when.
#[derive(Debug, Clone, Copy)]
pub struct MutationContext<'a> {
    actor: &'a ActorId,
    now: DateTime<Utc>,
}

impl<'a> MutationContext<'a> {
    /// Creates a context with an explicit timestamp.
    #[must_use]
    pub const fn new(actor: &'a ActorId, now: DateTime<Utc>) -> Self {
        Self { actor, now }
    }

    /// Creates a context stamped with the clock's current time.
    #[must_use]
    pub fn from_clock(actor: &'a ActorId, clock: &impl Clock) -> Self {
        Self::new(actor, clock.utc())
    }

    /// Returns the acting participant.
    #[must_use]
    pub const fn actor(&self) -> &ActorId {
        self.actor
    }

    /// Returns the mutation timestamp.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Outcome of a local operation: the next board and the event to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    board: Board,
    event: BoardEvent,
    changed: bool,
}

impl Mutation {
    fn new(before: &Board, board: Board, event: BoardEvent) -> Self {
        let changed = board != *before;
        Self {
            board,
            event,
            changed,
        }
    }

    /// Returns the resulting board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the event describing the operation.
    #[must_use]
    pub const fn event(&self) -> &BoardEvent {
        &self.event
    }

    /// Returns whether the operation changed the board. Unchanged results
    /// (no-op moves) need not be published.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.changed
    }

    /// Splits the mutation into board and event.
    #[must_use]
    pub fn into_parts(self) -> (Board, BoardEvent) {
        (self.board, self.event)
    }
}

/// Resolves and applies a local command.
///
/// # Errors
///
/// Returns the error of the underlying operation.
pub fn execute(
    board: &Board,
    command: &BoardCommand,
    ctx: &MutationContext<'_>,
) -> MutationResult<Mutation> {
    match command {
        BoardCommand::CreateTask {
            column_id,
            task_id,
            title,
            description,
        } => create_task(
            board,
            column_id,
            task_id.clone(),
            title,
            description.as_deref(),
            ctx,
        ),
        BoardCommand::UpdateTask {
            task_id,
            title,
            description,
        } => update_task(board, task_id, title, description.as_deref(), ctx),
        BoardCommand::DeleteTask { task_id, column_id } => {
            delete_task(board, task_id, column_id, ctx)
        }
        BoardCommand::CreateColumn { column_id, title } => {
            create_column(board, column_id.clone(), title, ctx)
        }
        BoardCommand::UpdateColumn { column_id, title } => {
            update_column(board, column_id, title, ctx)
        }
        BoardCommand::DeleteColumn { column_id } => delete_column(board, column_id, ctx),
        BoardCommand::MoveTask {
            task_id,
            source_column_id,
            destination_column_id,
            new_index,
        } => move_task(
            board,
            task_id,
            source_column_id,
            destination_column_id,
            *new_index,
            ctx,
        ),
        BoardCommand::MoveColumn {
            column_id,
            new_index,
        } => move_column(board, column_id, *new_index, ctx),
    }
}

/// Appends a new task to `column_id`.
///
/// # Errors
///
/// Returns [`BoardDomainError::ColumnNotFound`] when the column is absent,
/// [`BoardDomainError::EmptyTaskTitle`] for a blank title and
/// [`BoardDomainError::DuplicateTask`] when `task_id` is already in use.
pub fn create_task(
    board: &Board,
    column_id: &ColumnId,
    task_id: TaskId,
    title: &str,
    description: Option<&str>,
    ctx: &MutationContext<'_>,
) -> MutationResult<Mutation> {
    let event = BoardEvent::CreateTask {
        column_id: column_id.clone(),
        task: Task::new(task_id, title, description, ctx.now()),
    };
    resolve(board, event, ctx)
}

/// Replaces a task's title and description.
///
/// # Errors
///
/// Returns [`BoardDomainError::TaskNotFound`] or
/// [`BoardDomainError::EmptyTaskTitle`].
pub fn update_task(
    board: &Board,
    task_id: &TaskId,
    title: &str,
    description: Option<&str>,
    ctx: &MutationContext<'_>,
) -> MutationResult<Mutation> {
    let event = BoardEvent::UpdateTask {
        task_id: task_id.clone(),
        title: title.trim().to_owned(),
        description: normalize_description(description),
    };
    resolve(board, event, ctx)
}

/// Deletes a task owned by `column_id`.
///
/// # Errors
///
/// Returns a not-found error when the task or column is absent or the
/// column does not list the task.
pub fn delete_task(
    board: &Board,
    task_id: &TaskId,
    column_id: &ColumnId,
    ctx: &MutationContext<'_>,
) -> MutationResult<Mutation> {
    let event = BoardEvent::DeleteTask {
        task_id: task_id.clone(),
        column_id: column_id.clone(),
    };
    resolve(board, event, ctx)
}

/// Appends a new empty column to the column order.
///
/// # Errors
///
/// Returns [`BoardDomainError::EmptyColumnTitle`] or
/// [`BoardDomainError::DuplicateColumn`].
pub fn create_column(
    board: &Board,
    column_id: ColumnId,
    title: &str,
    ctx: &MutationContext<'_>,
) -> MutationResult<Mutation> {
    let event = BoardEvent::CreateColumn {
        column: Column::new(column_id, title),
    };
    resolve(board, event, ctx)
}

/// Renames a column.
///
/// # Errors
///
/// Returns [`BoardDomainError::ColumnNotFound`] or
/// [`BoardDomainError::EmptyColumnTitle`].
pub fn update_column(
    board: &Board,
    column_id: &ColumnId,
    title: &str,
    ctx: &MutationContext<'_>,
) -> MutationResult<Mutation> {
    let event = BoardEvent::UpdateColumn {
        column_id: column_id.clone(),
        title: title.trim().to_owned(),
    };
    resolve(board, event, ctx)
}

/// Deletes a column together with every task it owns.
///
/// # Errors
///
/// Returns [`BoardDomainError::ColumnNotFound`].
pub fn delete_column(
    board: &Board,
    column_id: &ColumnId,
    ctx: &MutationContext<'_>,
) -> MutationResult<Mutation> {
    let event = BoardEvent::DeleteColumn {
        column_id: column_id.clone(),
    };
    resolve(board, event, ctx)
}

/// Moves a task within or between columns.
///
/// # Errors
///
/// Returns a not-found error when the task or either column is absent, or
/// the source column does not list the task.
pub fn move_task(
    board: &Board,
    task_id: &TaskId,
    source_column_id: &ColumnId,
    destination_column_id: &ColumnId,
    new_index: usize,
    ctx: &MutationContext<'_>,
) -> MutationResult<Mutation> {
    let event = BoardEvent::MoveTask {
        task_id: task_id.clone(),
        source_column_id: source_column_id.clone(),
        destination_column_id: destination_column_id.clone(),
        new_index,
    };
    resolve(board, event, ctx)
}

/// Moves a column within the column order.
///
/// # Errors
///
/// Returns [`BoardDomainError::ColumnNotFound`].
pub fn move_column(
    board: &Board,
    column_id: &ColumnId,
    new_index: usize,
    ctx: &MutationContext<'_>,
) -> MutationResult<Mutation> {
    let event = BoardEvent::MoveColumn {
        column_id: column_id.clone(),
        new_index,
    };
    resolve(board, event, ctx)
}

fn resolve(
    board: &Board,
    event: BoardEvent,
    ctx: &MutationContext<'_>,
) -> MutationResult<Mutation> {
    let next = apply(board, &event, ctx)?;
    Ok(Mutation::new(board, next, event))
}

/// Applies an event to `board`, returning the next board.
///
/// # Errors
///
/// Returns a [`BoardDomainError`] when the event references ids that do not
/// exist on `board` or carries invalid arguments.
pub fn apply(
    board: &Board,
    event: &BoardEvent,
    ctx: &MutationContext<'_>,
) -> MutationResult<Board> {
    match event {
        BoardEvent::CreateTask { column_id, task } => apply_create_task(board, column_id, task, ctx),
        BoardEvent::UpdateTask {
            task_id,
            title,
            description,
        } => apply_update_task(board, task_id, title, description.as_deref(), ctx),
        BoardEvent::DeleteTask { task_id, column_id } => {
            apply_delete_task(board, task_id, column_id)
        }
        BoardEvent::CreateColumn { column } => apply_create_column(board, column),
        BoardEvent::UpdateColumn { column_id, title } => {
            apply_update_column(board, column_id, title)
        }
        BoardEvent::DeleteColumn { column_id } => apply_delete_column(board, column_id),
        BoardEvent::MoveTask {
            task_id,
            source_column_id,
            destination_column_id,
            new_index,
        } => apply_move_task(
            board,
            task_id,
            source_column_id,
            destination_column_id,
            *new_index,
            ctx,
        ),
        BoardEvent::MoveColumn {
            column_id,
            new_index,
        } => apply_move_column(board, column_id, *new_index),
    }
}

/// Drops activity entries older than `ttl` at `now`.
///
/// Returns `None` when nothing expired.
#[must_use]
pub fn expire_activity(board: &Board, now: DateTime<Utc>, ttl: TimeDelta) -> Option<Board> {
    let any_expired = board
        .user_activity
        .values()
        .any(|activity| activity.is_expired(now, ttl));
    if !any_expired {
        return None;
    }
    let mut next = board.clone();
    next.user_activity
        .retain(|_, activity| !activity.is_expired(now, ttl));
    Some(next)
}

/// Replaces the active-user count.
#[must_use]
pub fn set_active_users(board: &Board, active_users: u32) -> Board {
    let mut next = board.clone();
    next.active_users = active_users;
    next
}

fn apply_create_task(
    board: &Board,
    column_id: &ColumnId,
    task: &Task,
    ctx: &MutationContext<'_>,
) -> MutationResult<Board> {
    require_column(board, column_id)?;
    if is_blank(task.title()) {
        return Err(BoardDomainError::EmptyTaskTitle);
    }
    if board.tasks.contains_key(task.id()) {
        return Err(BoardDomainError::DuplicateTask(task.id().clone()));
    }

    // Peers may send untrimmed fields; store them as a local create would.
    let stored = task.normalized();
    let mut next = board.clone();
    column_mut(&mut next, column_id)?.push_task(stored.id().clone());
    next.tasks.insert(stored.id().clone(), stored);
    record_activity(&mut next, task.id(), ActivityKind::Created, ctx);
    Ok(next)
}

fn apply_update_task(
    board: &Board,
    task_id: &TaskId,
    title: &str,
    description: Option<&str>,
    ctx: &MutationContext<'_>,
) -> MutationResult<Board> {
    require_task(board, task_id)?;
    if is_blank(title) {
        return Err(BoardDomainError::EmptyTaskTitle);
    }

    let mut next = board.clone();
    next.tasks
        .get_mut(task_id)
        .ok_or_else(|| BoardDomainError::TaskNotFound(task_id.clone()))?
        .revise(title, description, ctx.now());
    record_activity(&mut next, task_id, ActivityKind::Updated, ctx);
    Ok(next)
}

fn apply_delete_task(
    board: &Board,
    task_id: &TaskId,
    column_id: &ColumnId,
) -> MutationResult<Board> {
    let column = require_column(board, column_id)?;
    require_task(board, task_id)?;
    require_membership(column, task_id)?;

    let mut next = board.clone();
    column_mut(&mut next, column_id)?.remove_task(task_id);
    next.tasks.remove(task_id);
    next.user_activity.remove(task_id);
    Ok(next)
}

fn apply_create_column(board: &Board, column: &Column) -> MutationResult<Board> {
    if is_blank(column.title()) {
        return Err(BoardDomainError::EmptyColumnTitle);
    }
    if board.columns.contains_key(column.id()) {
        return Err(BoardDomainError::DuplicateColumn(column.id().clone()));
    }

    // Columns are always born empty; task ids in a peer's payload are ignored.
    let fresh = Column::new(column.id().clone(), column.title());
    let mut next = board.clone();
    next.column_order.push(fresh.id().clone());
    next.columns.insert(fresh.id().clone(), fresh);
    Ok(next)
}

fn apply_update_column(board: &Board, column_id: &ColumnId, title: &str) -> MutationResult<Board> {
    require_column(board, column_id)?;
    if is_blank(title) {
        return Err(BoardDomainError::EmptyColumnTitle);
    }

    let mut next = board.clone();
    column_mut(&mut next, column_id)?.rename(title);
    Ok(next)
}

fn apply_delete_column(board: &Board, column_id: &ColumnId) -> MutationResult<Board> {
    require_column(board, column_id)?;

    let mut next = board.clone();
    let mut removed = next
        .columns
        .remove(column_id)
        .ok_or_else(|| BoardDomainError::ColumnNotFound(column_id.clone()))?;
    for task_id in removed.take_task_ids() {
        next.tasks.remove(&task_id);
        next.user_activity.remove(&task_id);
    }
    next.column_order.retain(|id| id != column_id);
    Ok(next)
}

fn apply_move_task(
    board: &Board,
    task_id: &TaskId,
    source_column_id: &ColumnId,
    destination_column_id: &ColumnId,
    new_index: usize,
    ctx: &MutationContext<'_>,
) -> MutationResult<Board> {
    let source = require_column(board, source_column_id)?;
    let destination = require_column(board, destination_column_id)?;
    require_task(board, task_id)?;
    let current_index = require_membership(source, task_id)?;

    if source_column_id == destination_column_id {
        let last_index = source.task_ids().len().saturating_sub(1);
        if new_index.min(last_index) == current_index {
            return Ok(board.clone());
        }
    }
    // Splice semantics: in the cross-column case the destination length is
    // unaffected by the removal.
    let target_index = if source_column_id == destination_column_id {
        new_index
    } else {
        new_index.min(destination.task_ids().len())
    };

    let mut next = board.clone();
    column_mut(&mut next, source_column_id)?.remove_task(task_id);
    column_mut(&mut next, destination_column_id)?.insert_task(target_index, task_id.clone());
    record_activity(&mut next, task_id, ActivityKind::Moved, ctx);
    Ok(next)
}

fn apply_move_column(board: &Board, column_id: &ColumnId, new_index: usize) -> MutationResult<Board> {
    require_column(board, column_id)?;
    let current_index = board
        .column_order
        .iter()
        .position(|id| id == column_id)
        .ok_or_else(|| BoardDomainError::ColumnNotFound(column_id.clone()))?;
    let last_index = board.column_order.len().saturating_sub(1);
    let target_index = new_index.min(last_index);
    if target_index == current_index {
        return Ok(board.clone());
    }

    let mut next = board.clone();
    let moved = next.column_order.remove(current_index);
    next.column_order.insert(target_index, moved);
    Ok(next)
}

fn is_blank(title: &str) -> bool {
    title.trim().is_empty()
}

fn require_column<'b>(board: &'b Board, column_id: &ColumnId) -> MutationResult<&'b Column> {
    board
        .columns
        .get(column_id)
        .ok_or_else(|| BoardDomainError::ColumnNotFound(column_id.clone()))
}

fn require_task<'b>(board: &'b Board, task_id: &TaskId) -> MutationResult<&'b Task> {
    board
        .tasks
        .get(task_id)
        .ok_or_else(|| BoardDomainError::TaskNotFound(task_id.clone()))
}

fn require_membership(column: &Column, task_id: &TaskId) -> MutationResult<usize> {
    column
        .position_of(task_id)
        .ok_or_else(|| BoardDomainError::TaskNotInColumn {
            task_id: task_id.clone(),
            column_id: column.id().clone(),
        })
}

fn column_mut<'b>(board: &'b mut Board, column_id: &ColumnId) -> MutationResult<&'b mut Column> {
    board
        .columns
        .get_mut(column_id)
        .ok_or_else(|| BoardDomainError::ColumnNotFound(column_id.clone()))
}

fn record_activity(
    board: &mut Board,
    task_id: &TaskId,
    action: ActivityKind,
    ctx: &MutationContext<'_>,
) {
    board.user_activity.insert(
        task_id.clone(),
        Activity::new(ctx.actor().clone(), action, ctx.now()),
    );
}
