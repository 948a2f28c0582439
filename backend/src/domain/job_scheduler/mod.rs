//! Background dispatcher that drains the job queue.
//!
//! One loop owns the wake-up channel. Every pass claims jobs until the queue
//! has no pending work (or the concurrency cap is reached), launching each
//! claimed job as its own task, then sleeps until a wake-up, a finished task
//! or shutdown. Jobs are claimed in queue order; they may finish in any
//! order.
//!
//! Shutdown stops claiming new work and waits for in-flight jobs to finish.
//! They are never cancelled.
//!
//! [`JobScheduler::shutdown`] is the only way a running daemon stops the
//! loop. The store-backed queue owns a [`JobSignal`](crate::domain::JobSignal),
//! so the wake-up channel stays open for as long as the scheduler holds its
//! queue. The loop also ends when every signal has been dropped, which only
//! happens with queues that do not keep one.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, oneshot};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::domain::Job;
use crate::domain::job_signal::JobWakeups;
use crate::domain::ports::{JobExecutor, JobQueue};

/// Port bundle required by the scheduler.
pub struct JobSchedulerPorts {
    /// Durable queue the scheduler claims from and reports outcomes to.
    pub queue: Arc<dyn JobQueue>,
    /// Performs each claimed job.
    pub executor: Arc<dyn JobExecutor>,
}

impl JobSchedulerPorts {
    /// Build a strongly-typed port bundle.
    pub fn new(queue: Arc<dyn JobQueue>, executor: Arc<dyn JobExecutor>) -> Self {
        Self { queue, executor }
    }
}

/// Scheduler tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSchedulerConfig {
    /// Upper bound on jobs executing at once; `None` is unbounded.
    pub max_concurrent_jobs: Option<usize>,
}

/// Handle to a running scheduler task.
#[derive(Debug)]
pub struct JobScheduler {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl JobScheduler {
    /// Start the dispatch loop on the current tokio runtime.
    ///
    /// The loop checks the queue once immediately, so work persisted before
    /// start-up (including jobs reset by crash recovery) runs without a
    /// wake-up.
    pub fn spawn(ports: JobSchedulerPorts, wakeups: JobWakeups, config: JobSchedulerConfig) -> Self {
        let (shutdown, shutdown_rx) = oneshot::channel();
        let dispatcher = Dispatcher::new(ports, config);
        let handle = tokio::spawn(dispatcher.run(wakeups, shutdown_rx));
        Self { shutdown, handle }
    }

    /// Stop claiming jobs and wait for every in-flight job to finish.
    pub async fn shutdown(self) {
        if self.shutdown.send(()).is_err() {
            debug!("job scheduler already stopped");
        }
        if let Err(err) = self.handle.await {
            error!(error = %err, "job scheduler task failed");
        }
    }
}

struct Dispatcher {
    queue: Arc<dyn JobQueue>,
    executor: Arc<dyn JobExecutor>,
    limit: Option<Arc<Semaphore>>,
    in_flight: JoinSet<()>,
}

impl Dispatcher {
    fn new(ports: JobSchedulerPorts, config: JobSchedulerConfig) -> Self {
        Self {
            queue: ports.queue,
            executor: ports.executor,
            limit: config
                .max_concurrent_jobs
                .map(|max| Arc::new(Semaphore::new(max.max(1)))),
            in_flight: JoinSet::new(),
        }
    }

    async fn run(mut self, mut wakeups: JobWakeups, mut shutdown: oneshot::Receiver<()>) {
        info!(limit = ?self.limit.as_ref().map(|s| s.available_permits()), "job scheduler started");
        loop {
            self.dispatch_available().await;
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                woke = wakeups.recv() => {
                    if !woke {
                        debug!("every job signal dropped; scheduler stopping");
                        break;
                    }
                }
                Some(outcome) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    log_task_outcome(outcome);
                }
            }
        }

        let waiting = self.in_flight.len();
        if waiting > 0 {
            info!(in_flight = waiting, "job scheduler draining");
        }
        while let Some(outcome) = self.in_flight.join_next().await {
            log_task_outcome(outcome);
        }
        info!("job scheduler stopped");
    }

    /// Claim and launch jobs until none are pending or the cap is reached.
    async fn dispatch_available(&mut self) {
        loop {
            let permit = match &self.limit {
                Some(limit) => match Arc::clone(limit).try_acquire_owned() {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };
            match self.queue.next_job().await {
                Ok(Some(job)) => self.launch(job, permit),
                Ok(None) => return,
                Err(err) => {
                    error!(error = %err, kind = err.kind(), "next job failed");
                    return;
                }
            }
        }
    }

    fn launch(&mut self, job: Job, permit: Option<OwnedSemaphorePermit>) {
        let queue = Arc::clone(&self.queue);
        let executor = Arc::clone(&self.executor);
        self.in_flight.spawn(async move {
            let _permit = permit;
            run_job(queue.as_ref(), executor.as_ref(), job).await;
        });
    }
}

async fn run_job(queue: &dyn JobQueue, executor: &dyn JobExecutor, job: Job) {
    let job_id = job.id();
    info!(%job_id, job_type = %job.job_type, "job started");

    let error = match AssertUnwindSafe(executor.execute(&job)).catch_unwind().await {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(panic) => Some(panic_message(panic.as_ref())),
    };
    match &error {
        None => info!(%job_id, "job completed"),
        Some(message) => warn!(%job_id, error = %message, "job completed with error"),
    }

    if let Err(err) = queue.complete_job(job_id, error).await {
        error!(%job_id, error = %err, kind = err.kind(), "complete job failed");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned());
    format!("job panicked: {detail}")
}

fn log_task_outcome(outcome: Result<(), JoinError>) {
    if let Err(err) = outcome {
        error!(error = %err, "job task aborted");
    }
}

#[cfg(test)]
mod tests;
