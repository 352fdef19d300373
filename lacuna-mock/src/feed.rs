use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lacuna_core::{DataPoint, FeedProducer, LacunaError};
use tokio::sync::mpsc;

/// Points that reach the feed queue only once simulated time catches up
/// with their arrival instant.
///
/// Models a data source whose bars arrive late, early, or not at all.
#[derive(Debug)]
pub struct ScheduledFeed {
    pending: VecDeque<(DateTime<Utc>, DataPoint)>,
    producer: FeedProducer<DataPoint>,
}

impl ScheduledFeed {
    /// Wrap the producer half of a feed queue.
    #[must_use]
    pub const fn new(producer: FeedProducer<DataPoint>) -> Self {
        Self {
            pending: VecDeque::new(),
            producer,
        }
    }

    /// Schedule `point` to arrive at `arrives_at`.
    pub fn push_at(&mut self, arrives_at: DateTime<Utc>, point: DataPoint) {
        let idx = self.pending.partition_point(|(t, _)| *t <= arrives_at);
        self.pending.insert(idx, (arrives_at, point));
    }

    /// Enqueue every point due at or before `now`; returns how many moved.
    ///
    /// # Errors
    /// Returns `LacunaError::QueueClosed` if the queue was stopped.
    pub fn release_due(&mut self, now: DateTime<Utc>) -> Result<usize, LacunaError> {
        let mut moved = 0;
        while self.pending.front().is_some_and(|(t, _)| *t <= now) {
            if let Some((_, point)) = self.pending.pop_front() {
                self.producer.enqueue(point)?;
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Points still waiting for their arrival time.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Stop the underlying queue.
    pub fn stop(&self) {
        self.producer.stop();
    }
}

/// Async source that sends each point after its delay (relative to the
/// previous send), then closes.
///
/// Must be called from within a Tokio runtime.
#[must_use]
pub fn scripted_source(script: Vec<(Duration, DataPoint)>) -> mpsc::Receiver<DataPoint> {
    let (tx, rx) = mpsc::channel(script.len().max(1));
    tokio::spawn(async move {
        for (delay, point) in script {
            tokio::time::sleep(delay).await;
            if tx.send(point).await.is_err() {
                break;
            }
        }
    });
    rx
}
