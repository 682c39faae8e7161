//! The single serialized apply path.
//!
//! Local commands and transport messages are queued on one unbounded
//! channel and handled here one at a time, in arrival order. This task is
//! the only writer of the [`BoardStore`].

use super::connection::{ConnectionLink, ConnectionState};
use super::outbox::Outbox;
use super::store::BoardStore;
use crate::board::domain::engine::{self, MutationResult};
use crate::board::domain::{ActorId, Board, BoardCommand, EventEnvelope, MutationContext};
use crate::board::ports::{BoardTransport, InboundMessage, JoinAck};
use chrono::TimeDelta;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Work item for the apply loop.
#[derive(Debug)]
pub(super) enum Command {
    /// A local mutation awaiting its outcome.
    Local {
        command: BoardCommand,
        reply: oneshot::Sender<MutationResult<Arc<Board>>>,
    },
    /// A message delivered by the link opened under `generation`.
    Inbound {
        generation: u64,
        message: InboundMessage,
    },
    /// The link opened under `generation` was acknowledged.
    Joined { generation: u64, ack: JoinAck },
    /// The local participant left on request.
    Left { was_connected: bool },
    /// Stop the loop.
    Shutdown,
}

/// Collaborators and settings owned by the apply loop.
pub(super) struct Applier<T, C> {
    pub(super) actor: ActorId,
    pub(super) activity_ttl: Option<TimeDelta>,
    pub(super) sweep_period: Option<Duration>,
    pub(super) store: Arc<BoardStore>,
    pub(super) link: Arc<ConnectionLink>,
    pub(super) transport: Arc<T>,
    pub(super) clock: Arc<C>,
    pub(super) outbox: Outbox,
}

impl<T, C> Applier<T, C>
where
    T: BoardTransport,
    C: Clock + Send + Sync,
{
    /// Runs until [`Command::Shutdown`] arrives or every sender is gone.
    pub(super) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut sweep = self.sweep_period.map(|period| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        loop {
            tokio::select! {
                received = commands.recv() => match received {
                    None | Some(Command::Shutdown) => break,
                    Some(item) => self.handle(item),
                },
                () = next_tick(sweep.as_mut()) => self.sweep(),
            }
        }
        debug!(target: "trellis::sync", actor = %self.actor, "apply loop stopped");
    }

    fn handle(&mut self, item: Command) {
        match item {
            Command::Local { command, reply } => {
                let outcome = self.apply_local(&command);
                if reply.send(outcome).is_err() {
                    debug!(target: "trellis::sync", "local caller went away before the reply");
                }
            }
            Command::Inbound {
                generation,
                message,
            } => self.handle_inbound(generation, message),
            Command::Joined { generation, ack } => self.handle_joined(generation, ack),
            Command::Left { was_connected } => {
                if was_connected {
                    self.adjust_presence(|count| count.saturating_sub(1));
                }
            }
            Command::Shutdown => {}
        }
    }

    fn apply_local(&mut self, command: &BoardCommand) -> MutationResult<Arc<Board>> {
        let current = self.store.current();
        let ctx = MutationContext::from_clock(&self.actor, &*self.clock);
        let mutation = engine::execute(&current, command, &ctx)?;
        if !mutation.changed() {
            return Ok(current);
        }
        let (board, event) = mutation.into_parts();
        debug!(target: "trellis::sync", event = event.name(), "applied local mutation");
        self.store.replace(board);
        self.emit(EventEnvelope::new(self.actor.clone(), event));
        Ok(self.store.current())
    }

    fn handle_inbound(&mut self, generation: u64, message: InboundMessage) {
        if generation != self.link.generation() {
            debug!(target: "trellis::sync", generation, "dropping message from a replaced link");
            return;
        }
        match message {
            InboundMessage::Event(envelope) => self.apply_remote(&envelope),
            InboundMessage::Presence(active_users) => {
                self.adjust_presence(|_| active_users);
            }
            InboundMessage::ConnectionLost(reason) => {
                warn!(target: "trellis::sync", %reason, "connection lost");
                self.mark_lost(generation);
            }
        }
    }

    fn apply_remote(&self, envelope: &EventEnvelope) {
        if envelope.origin() == &self.actor {
            debug!(target: "trellis::sync", event = envelope.event().name(), "ignoring echo of own event");
            return;
        }
        let current = self.store.current();
        let ctx = MutationContext::from_clock(envelope.origin(), &*self.clock);
        match engine::apply(&current, envelope.event(), &ctx) {
            Ok(board) => {
                debug!(
                    target: "trellis::sync",
                    origin = %envelope.origin(),
                    event = envelope.event().name(),
                    "applied remote event"
                );
                self.store.replace(board);
            }
            Err(err) => warn!(
                target: "trellis::sync",
                origin = %envelope.origin(),
                event = envelope.event().name(),
                error = %err,
                "discarding remote event that does not apply"
            ),
        }
    }

    fn handle_joined(&mut self, generation: u64, ack: JoinAck) {
        if generation != self.link.generation() || self.link.state() != ConnectionState::Connected
        {
            return;
        }
        match ack.active_users() {
            Some(active_users) => self.adjust_presence(|_| active_users),
            None => self.adjust_presence(|count| count.saturating_add(1)),
        }
        self.flush();
    }

    fn emit(&mut self, envelope: EventEnvelope) {
        if self.outbox.is_empty() && self.link.state() == ConnectionState::Connected {
            match self.transport.send(&envelope) {
                Ok(()) => return,
                Err(err) => {
                    warn!(
                        target: "trellis::sync",
                        event = envelope.event().name(),
                        error = %err,
                        "send failed; queueing event"
                    );
                    self.mark_lost(self.link.generation());
                }
            }
        }
        self.enqueue(envelope);
    }

    fn enqueue(&mut self, envelope: EventEnvelope) {
        if let Some(dropped) = self.outbox.push(envelope) {
            warn!(
                target: "trellis::sync",
                event = dropped.event().name(),
                queued = self.outbox.len(),
                "outbox full; dropping oldest event"
            );
        }
    }

    fn flush(&mut self) {
        while self.link.state() == ConnectionState::Connected {
            let Some(envelope) = self.outbox.front() else {
                return;
            };
            if let Err(err) = self.transport.send(envelope) {
                warn!(
                    target: "trellis::sync",
                    error = %err,
                    queued = self.outbox.len(),
                    "replay interrupted"
                );
                self.mark_lost(self.link.generation());
                return;
            }
            self.outbox.pop_front();
        }
    }

    fn mark_lost(&self, generation: u64) {
        if self.link.mark_disconnected(Some(generation)) {
            self.adjust_presence(|count| count.saturating_sub(1));
        }
    }

    fn adjust_presence(&self, update: impl FnOnce(u32) -> u32) {
        let current = self.store.current();
        let active_users = update(current.active_users());
        if active_users != current.active_users() {
            self.store
                .replace(engine::set_active_users(&current, active_users));
        }
    }

    fn sweep(&self) {
        let Some(ttl) = self.activity_ttl else {
            return;
        };
        let current = self.store.current();
        if let Some(board) = engine::expire_activity(&current, self.clock.utc(), ttl) {
            debug!(target: "trellis::sync", "expired stale activity");
            self.store.replace(board);
        }
    }
}

async fn next_tick(sweep: Option<&mut Interval>) {
    match sweep {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
