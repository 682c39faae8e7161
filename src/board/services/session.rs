//! Board session: the presentation surface and sync state machine.

use super::applier::{Applier, Command};
use super::config::{ConfigError, SyncConfig};
use super::connection::{ConnectionLink, ConnectionState};
use super::outbox::Outbox;
use super::store::BoardStore;
use crate::board::domain::{
    Activity, ActorId, Board, BoardCommand, BoardDomainError, ColumnId, TaskId,
};
use crate::board::ports::{BoardTransport, IdGenerator, InboundSink, TransportError};
use chrono::TimeDelta;
use mockable::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Service-level errors for board sessions.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The mutation was rejected; the board is unchanged.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),
    /// The transport failed.
    #[error(transparent)]
    Connection(#[from] TransportError),
    /// The session's apply loop has stopped.
    #[error("board session is closed")]
    SessionClosed,
}

/// Result type for board session operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// One participant's view of a shared board.
///
/// Owns the [`BoardStore`] and a background apply loop. Local mutations and
/// messages from the transport are funnelled into that loop and applied
/// one at a time, so the board only ever changes through the mutation
/// engine and always in arrival order. Local mutations are applied
/// optimistically; their events are sent when connected and queued
/// otherwise.
///
/// Must be created inside a Tokio runtime.
pub struct BoardSession<T, C, G>
where
    T: BoardTransport + 'static,
    C: Clock + Send + Sync + 'static,
    G: IdGenerator,
{
    actor: ActorId,
    activity_ttl: Option<TimeDelta>,
    store: Arc<BoardStore>,
    link: Arc<ConnectionLink>,
    commands: mpsc::UnboundedSender<Command>,
    attempt: tokio::sync::Mutex<()>,
    apply_task: Mutex<Option<JoinHandle<()>>>,
    transport: Arc<T>,
    clock: Arc<C>,
    ids: Arc<G>,
}

impl<T, C, G> BoardSession<T, C, G>
where
    T: BoardTransport + 'static,
    C: Clock + Send + Sync + 'static,
    G: IdGenerator,
{
    /// Starts a session on the seed board, in the `Connecting` state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn new(
        config: SyncConfig,
        transport: Arc<T>,
        clock: Arc<C>,
        ids: Arc<G>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = Arc::new(BoardStore::default());
        let link = Arc::new(ConnectionLink::new());
        let (commands, queue) = mpsc::unbounded_channel();
        let applier = Applier {
            actor: config.actor.clone(),
            activity_ttl: config.activity_ttl(),
            sweep_period: config.expiry_sweep(),
            store: Arc::clone(&store),
            link: Arc::clone(&link),
            transport: Arc::clone(&transport),
            clock: Arc::clone(&clock),
            outbox: Outbox::new(config.outbox_capacity),
        };
        let apply_task = tokio::spawn(applier.run(queue));
        Ok(Self {
            actor: config.actor.clone(),
            activity_ttl: config.activity_ttl(),
            store,
            link,
            commands,
            attempt: tokio::sync::Mutex::new(()),
            apply_task: Mutex::new(Some(apply_task)),
            transport,
            clock,
            ids,
        })
    }

    /// Returns the local participant.
    #[must_use]
    pub const fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// Establishes the transport link.
    ///
    /// Does nothing when already connected or while another attempt is in
    /// flight. Events queued while disconnected are replayed in order once
    /// the link is up.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Connection`] when the transport cannot connect;
    /// the session is then `Disconnected`.
    pub async fn connect(&self) -> SyncResult<()> {
        let Ok(_attempt) = self.attempt.try_lock() else {
            debug!(target: "trellis::sync", "connect already in flight");
            return Ok(());
        };
        self.connect_locked().await
    }

    /// Tears down the current link, if any, and connects again.
    ///
    /// Does nothing while another attempt is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Connection`] when the transport fails.
    pub async fn reconnect(&self) -> SyncResult<()> {
        let Ok(_attempt) = self.attempt.try_lock() else {
            debug!(target: "trellis::sync", "reconnect ignored; attempt in flight");
            return Ok(());
        };
        self.disconnect_locked().await?;
        self.connect_locked().await
    }

    /// Leaves the shared board. Local edits keep applying and are queued
    /// for the next connection.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Connection`] when the transport fails to close
    /// cleanly; the session is `Disconnected` regardless.
    pub async fn disconnect(&self) -> SyncResult<()> {
        let _attempt = self.attempt.lock().await;
        self.disconnect_locked().await
    }

    /// Disconnects and stops the apply loop. Later calls fail with
    /// [`SyncError::SessionClosed`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Connection`] when the transport fails to close
    /// cleanly.
    pub async fn close(&self) -> SyncResult<()> {
        let disconnected = self.disconnect().await;
        if self.commands.send(Command::Shutdown).is_err() {
            debug!(target: "trellis::sync", "apply loop already stopped");
        }
        let handle = self
            .apply_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = handle
            && let Err(err) = task.await
        {
            warn!(target: "trellis::sync", error = %err, "apply loop ended abnormally");
        }
        match disconnected {
            Err(SyncError::SessionClosed) => Ok(()),
            other => other,
        }
    }

    async fn connect_locked(&self) -> SyncResult<()> {
        let Some(generation) = self.link.begin_attempt() else {
            return Ok(());
        };
        let inbound = self.inbound_sink(generation);
        match self.transport.connect(&self.actor, inbound).await {
            Ok(ack) => {
                self.link
                    .finish_attempt(generation, ConnectionState::Connected);
                self.enqueue(Command::Joined { generation, ack })
            }
            Err(err) => {
                warn!(target: "trellis::sync", error = %err, "connect failed");
                self.link
                    .finish_attempt(generation, ConnectionState::Disconnected);
                Err(err.into())
            }
        }
    }

    async fn disconnect_locked(&self) -> SyncResult<()> {
        let was_connected = self.link.mark_disconnected(None);
        let left = self.enqueue(Command::Left { was_connected });
        self.transport.disconnect().await?;
        left
    }

    fn inbound_sink(&self, generation: u64) -> InboundSink {
        let commands = self.commands.clone();
        InboundSink::new(move |message| {
            commands
                .send(Command::Inbound {
                    generation,
                    message,
                })
                .is_ok()
        })
    }

    fn enqueue(&self, command: Command) -> SyncResult<()> {
        self.commands
            .send(command)
            .map_err(|_| SyncError::SessionClosed)
    }

    async fn submit(&self, command: BoardCommand) -> SyncResult<Arc<Board>> {
        let (reply, outcome) = oneshot::channel();
        self.enqueue(Command::Local { command, reply })?;
        let board = outcome.await.map_err(|_| SyncError::SessionClosed)??;
        Ok(board)
    }

    /// Returns the current board snapshot.
    #[must_use]
    pub fn current_board(&self) -> Arc<Board> {
        self.store.current()
    }

    /// Subscribes to board snapshot replacements.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Board>> {
        self.store.subscribe()
    }

    /// Returns the connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.link.state()
    }

    /// Returns whether the session is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Returns the number of participants on the board.
    #[must_use]
    pub fn active_user_count(&self) -> u32 {
        self.store.current().active_users()
    }

    /// Returns the latest unexpired activity on a task.
    #[must_use]
    pub fn activity_for(&self, task_id: &TaskId) -> Option<Activity> {
        let board = self.store.current();
        let activity = board.activity_for(task_id)?;
        match self.activity_ttl {
            Some(ttl) if activity.is_expired(self.clock.utc(), ttl) => None,
            _ => Some(activity.clone()),
        }
    }

    /// Appends a task to a column and returns its new id.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Domain`] when the column is unknown or the title
    /// is blank.
    pub async fn create_task(
        &self,
        column_id: &ColumnId,
        title: &str,
        description: Option<&str>,
    ) -> SyncResult<TaskId> {
        let task_id = self.ids.next_task_id();
        self.submit(BoardCommand::CreateTask {
            column_id: column_id.clone(),
            task_id: task_id.clone(),
            title: title.to_owned(),
            description: description.map(str::to_owned),
        })
        .await?;
        Ok(task_id)
    }

    /// Replaces a task's title and description.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Domain`] when the task is unknown or the title
    /// is blank.
    pub async fn update_task(
        &self,
        task_id: &TaskId,
        title: &str,
        description: Option<&str>,
    ) -> SyncResult<()> {
        self.submit(BoardCommand::UpdateTask {
            task_id: task_id.clone(),
            title: title.to_owned(),
            description: description.map(str::to_owned),
        })
        .await?;
        Ok(())
    }

    /// Deletes a task from its column.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Domain`] when the task or column is unknown or
    /// the column does not hold the task.
    pub async fn delete_task(&self, task_id: &TaskId, column_id: &ColumnId) -> SyncResult<()> {
        self.submit(BoardCommand::DeleteTask {
            task_id: task_id.clone(),
            column_id: column_id.clone(),
        })
        .await?;
        Ok(())
    }

    /// Appends an empty column and returns its new id.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Domain`] when the title is blank.
    pub async fn create_column(&self, title: &str) -> SyncResult<ColumnId> {
        let column_id = self.ids.next_column_id();
        self.submit(BoardCommand::CreateColumn {
            column_id: column_id.clone(),
            title: title.to_owned(),
        })
        .await?;
        Ok(column_id)
    }

    /// Renames a column.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Domain`] when the column is unknown or the title
    /// is blank.
    pub async fn update_column(&self, column_id: &ColumnId, title: &str) -> SyncResult<()> {
        self.submit(BoardCommand::UpdateColumn {
            column_id: column_id.clone(),
            title: title.to_owned(),
        })
        .await?;
        Ok(())
    }

    /// Deletes a column together with its tasks.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Domain`] when the column is unknown.
    pub async fn delete_column(&self, column_id: &ColumnId) -> SyncResult<()> {
        self.submit(BoardCommand::DeleteColumn {
            column_id: column_id.clone(),
        })
        .await?;
        Ok(())
    }

    /// Moves a task within or between columns. `new_index` is clamped to the
    /// destination length.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Domain`] when the task or a column is unknown or
    /// the source column does not hold the task.
    pub async fn move_task(
        &self,
        task_id: &TaskId,
        source_column_id: &ColumnId,
        destination_column_id: &ColumnId,
        new_index: usize,
    ) -> SyncResult<()> {
        self.submit(BoardCommand::MoveTask {
            task_id: task_id.clone(),
            source_column_id: source_column_id.clone(),
            destination_column_id: destination_column_id.clone(),
            new_index,
        })
        .await?;
        Ok(())
    }

    /// Moves a column within the column order. `new_index` is clamped.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Domain`] when the column is unknown.
    pub async fn move_column(&self, column_id: &ColumnId, new_index: usize) -> SyncResult<()> {
        self.submit(BoardCommand::MoveColumn {
            column_id: column_id.clone(),
            new_index,
        })
        .await?;
        Ok(())
    }
}

impl<T, C, G> Drop for BoardSession<T, C, G>
where
    T: BoardTransport + 'static,
    C: Clock + Send + Sync + 'static,
    G: IdGenerator,
{
    fn drop(&mut self) {
        let handle = self
            .apply_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = handle {
            info!(target: "trellis::sync", actor = %self.actor, "session dropped without close");
            task.abort();
        }
    }
}
