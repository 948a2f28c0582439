//! Wake-up channel between job producers and the scheduler.
//!
//! The channel holds at most one pending signal. A producer that finds the
//! slot already occupied drops its signal, because the scheduler drains the
//! whole queue on every wake-up and will see the new job anyway.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Create a connected signal/wake-up pair.
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use peapod::domain::job_signal;
///
/// let (signal, mut wakeups) = job_signal();
/// signal.notify();
/// signal.notify();
/// assert!(wakeups.recv().await);
/// # }
/// ```
#[must_use]
pub fn job_signal() -> (JobSignal, JobWakeups) {
    let (sender, receiver) = mpsc::channel(1);
    (JobSignal(sender), JobWakeups(receiver))
}

/// Producer half. Cheap to clone; every clone feeds the same scheduler.
#[derive(Debug, Clone)]
pub struct JobSignal(mpsc::Sender<()>);

impl JobSignal {
    /// Ask the scheduler to look for work. Never blocks.
    pub fn notify(&self) {
        match self.0.try_send(()) {
            Ok(()) => {}
            Err(TrySendError::Full(())) => debug!("job signal already pending"),
            Err(TrySendError::Closed(())) => debug!("job scheduler stopped; signal dropped"),
        }
    }
}

/// Consumer half, owned by the scheduler.
#[derive(Debug)]
pub struct JobWakeups(mpsc::Receiver<()>);

impl JobWakeups {
    /// Wait for the next signal. Returns `false` once every [`JobSignal`] has
    /// been dropped.
    pub async fn recv(&mut self) -> bool {
        self.0.recv().await.is_some()
    }

    /// Consume a pending signal without waiting.
    pub fn try_recv(&mut self) -> bool {
        self.0.try_recv().is_ok()
    }
}
