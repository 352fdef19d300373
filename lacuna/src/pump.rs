//! Tokio tasks that drive live sources and feed the SPSC queue.

use lacuna_core::stream::PumpHandle;
use lacuna_core::{DataPoint, FeedProducer, LacunaError, LiveConfig};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::enumerator::{LivePoll, LiveSource};

/// Poll `source` every `config.poll_interval` and forward what it produces.
///
/// Each tick drains the source until it reports [`LivePoll::Empty`], so a
/// backlog of due bars is delivered without waiting for further ticks. The
/// task ends when the source ends, when `tx` is closed, when the returned
/// handle is stopped or dropped, or after forwarding an error.
pub fn spawn_live_pump<S>(
    mut source: S,
    config: LiveConfig,
    tx: mpsc::Sender<Result<DataPoint, LacunaError>>,
) -> PumpHandle
where
    S: LiveSource + 'static,
{
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        'pump: loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {}
            }
            loop {
                match source.advance() {
                    Ok(LivePoll::Data(point)) => {
                        if tx.send(Ok(point)).await.is_err() {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(target = "lacuna::pump", "downstream closed; stopping pump");
                            break 'pump;
                        }
                    }
                    Ok(LivePoll::Empty) => break,
                    Ok(LivePoll::Ended) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(target = "lacuna::pump", "live source ended");
                        break 'pump;
                    }
                    Err(e) => {
                        #[cfg(feature = "tracing")]
                        tracing::error!(target = "lacuna::pump", error = %e, "live source failed");
                        let _ = tx.send(Err(e)).await;
                        break 'pump;
                    }
                }
            }
        }
    });
    PumpHandle::new(join, stop_tx)
}

/// Move items from an async source into the feed queue.
///
/// The producer half is dropped when the source closes, which ends the
/// queue once the consumer has drained it. An enqueue refused because the
/// consumer stopped ends the task as well.
pub fn bridge_into_queue(mut source: mpsc::Receiver<DataPoint>, producer: FeedProducer<DataPoint>) -> PumpHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let join = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                item = source.recv() => {
                    let Some(point) = item else {
                        break;
                    };
                    if producer.enqueue(point).is_err() {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(target = "lacuna::pump", "feed queue stopped; ending bridge");
                        break;
                    }
                }
            }
        }
        drop(producer);
    });
    PumpHandle::new(join, stop_tx)
}
