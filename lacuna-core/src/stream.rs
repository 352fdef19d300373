use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Owner of a background pump task.
///
/// `stop().await` requests a graceful shutdown and waits for the task.
/// Dropping the handle requests shutdown and aborts the task if it is
/// still running, so a pump never outlives its owner.
#[derive(Debug)]
pub struct PumpHandle {
    task: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl PumpHandle {
    /// Wrap a spawned task and the sender half of its stop signal.
    #[must_use]
    pub const fn new(task: JoinHandle<()>, stop_tx: oneshot::Sender<()>) -> Self {
        Self {
            task: Some(task),
            stop_tx: Some(stop_tx),
        }
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn stop(mut self) {
        self.request_stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Abort the task without waiting.
    pub fn abort(mut self) {
        self.stop_tx = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether the task has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    fn request_stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // the pump may already be gone
            let _ = tx.send(());
        }
    }
}

impl Drop for PumpHandle {
    fn drop(&mut self) {
        self.request_stop();
        if let Some(task) = self.task.take()
            && !task.is_finished()
        {
            task.abort();
        }
    }
}
