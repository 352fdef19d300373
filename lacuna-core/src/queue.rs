//! Single-producer/single-consumer feed between a data source and the live
//! enumerator.
//!
//! The producer half lives on the source's thread or task, the consumer half
//! is polled by the enumerator. Dequeues never block: the consumer learns
//! whether an item is [`Ready`](Dequeue::Ready), whether the feed is merely
//! [`Empty`](Dequeue::Empty) for now, or whether it has
//! [`Ended`](Dequeue::Ended).

use std::collections::VecDeque;

use crate::LacunaError;
use crate::sync::{Arc, Mutex, lock};

/// Outcome of a non-blocking dequeue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeue<T> {
    /// The oldest buffered item.
    Ready(T),
    /// Nothing buffered yet; ask again later.
    Empty,
    /// The feed was stopped, or the producer is gone and the buffer drained.
    Ended,
}

impl<T> Dequeue<T> {
    /// Whether this marks end-of-stream.
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

#[derive(Debug)]
struct Inner<T> {
    buffer: VecDeque<T>,
    last: Option<T>,
    producer_closed: bool,
    stopped: bool,
}

/// Producer half of a feed.
#[derive(Debug)]
pub struct FeedProducer<T> {
    shared: Arc<Mutex<Inner<T>>>,
}

/// Consumer half of a feed.
#[derive(Debug)]
pub struct FeedConsumer<T> {
    shared: Arc<Mutex<Inner<T>>>,
}

/// Create a connected producer/consumer pair.
#[must_use]
pub fn feed_queue<T: Clone>() -> (FeedProducer<T>, FeedConsumer<T>) {
    let shared = Arc::new(Mutex::new(Inner {
        buffer: VecDeque::new(),
        last: None,
        producer_closed: false,
        stopped: false,
    }));
    (
        FeedProducer {
            shared: Arc::clone(&shared),
        },
        FeedConsumer { shared },
    )
}

fn stop_inner<T>(shared: &Mutex<Inner<T>>) {
    let mut g = lock(shared);
    g.stopped = true;
    g.buffer.clear();
}

impl<T: Clone> FeedProducer<T> {
    /// Append an item.
    ///
    /// # Errors
    /// Returns `LacunaError::QueueClosed` once the feed has been stopped.
    pub fn enqueue(&self, item: T) -> Result<(), LacunaError> {
        let mut g = lock(&self.shared);
        if g.stopped {
            return Err(LacunaError::QueueClosed);
        }
        g.last = Some(item.clone());
        g.buffer.push_back(item);
        Ok(())
    }

    /// Most recently enqueued item, even if already consumed.
    #[must_use]
    pub fn last_enqueued(&self) -> Option<T> {
        lock(&self.shared).last.clone()
    }
}

impl<T> FeedProducer<T> {
    /// End the feed now, discarding buffered items. Idempotent.
    pub fn stop(&self) {
        stop_inner(&self.shared);
    }

    /// Number of buffered items.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.shared).buffer.len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether either half called `stop()`.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        lock(&self.shared).stopped
    }
}

impl<T> Drop for FeedProducer<T> {
    fn drop(&mut self) {
        lock(&self.shared).producer_closed = true;
    }
}

impl<T> FeedConsumer<T> {
    /// Take the oldest item without blocking.
    pub fn try_dequeue(&self) -> Dequeue<T> {
        let mut g = lock(&self.shared);
        if g.stopped {
            return Dequeue::Ended;
        }
        match g.buffer.pop_front() {
            Some(item) => Dequeue::Ready(item),
            None if g.producer_closed => Dequeue::Ended,
            None => Dequeue::Empty,
        }
    }

    /// End the feed now, discarding buffered items. Idempotent.
    pub fn stop(&self) {
        stop_inner(&self.shared);
    }

    /// Number of buffered items.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.shared).buffer.len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether either half called `stop()`.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        lock(&self.shared).stopped
    }
}

impl<T: Clone> FeedConsumer<T> {
    /// Most recently enqueued item, even if already consumed.
    #[must_use]
    pub fn last_enqueued(&self) -> Option<T> {
        lock(&self.shared).last.clone()
    }
}

impl<T> Drop for FeedConsumer<T> {
    fn drop(&mut self) {
        stop_inner(&self.shared);
    }
}
