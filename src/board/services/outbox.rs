//! Bounded queue of events awaiting delivery.

use crate::board::domain::EventEnvelope;
use std::collections::VecDeque;

/// FIFO of events emitted while the transport could not take them.
#[derive(Debug)]
pub(super) struct Outbox {
    capacity: usize,
    queue: VecDeque<EventEnvelope>,
}

impl Outbox {
    pub(super) const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: VecDeque::new(),
        }
    }

    pub(super) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(super) fn len(&self) -> usize {
        self.queue.len()
    }

    /// Queues `envelope`, returning the event evicted to make room (or
    /// `envelope` itself when the capacity is zero).
    pub(super) fn push(&mut self, envelope: EventEnvelope) -> Option<EventEnvelope> {
        if self.capacity == 0 {
            return Some(envelope);
        }
        let evicted = if self.queue.len() >= self.capacity {
            self.queue.pop_front()
        } else {
            None
        };
        self.queue.push_back(envelope);
        evicted
    }

    pub(super) fn front(&self) -> Option<&EventEnvelope> {
        self.queue.front()
    }

    pub(super) fn pop_front(&mut self) -> Option<EventEnvelope> {
        self.queue.pop_front()
    }
}
