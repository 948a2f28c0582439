//! Unit tests for job dispatch, outcome recording and shutdown.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rstest::rstest;
use tokio::sync::{Notify, mpsc};
use tokio::time::timeout;

use super::{JobScheduler, JobSchedulerConfig, JobSchedulerPorts};
use crate::domain::job_signal::job_signal;
use crate::domain::ports::{JobExecutionError, JobExecutor, JobQueue, RepositoryError};
use crate::domain::{Job, JobId, PlaylistId, UserId};

const WAIT: Duration = Duration::from_secs(5);

fn job(id: u64) -> Job {
    let mut job = Job::from_text(UserId::new(1), PlaylistId::new(1), format!("job {id}"));
    job.assign_id(JobId::new(id));
    job
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("test mutex poisoned"),
    }
}

#[derive(Default)]
struct QueueStub {
    pending: Mutex<VecDeque<Job>>,
    claimed: Mutex<Vec<JobId>>,
    completed: Mutex<Vec<(JobId, Option<String>)>>,
    failing_claims: AtomicUsize,
}

impl QueueStub {
    fn with_jobs(ids: &[u64]) -> Arc<Self> {
        let queue = Self::default();
        lock(&queue.pending).extend(ids.iter().copied().map(job));
        Arc::new(queue)
    }

    fn push(&self, id: u64) {
        lock(&self.pending).push_back(job(id));
    }

    fn claimed(&self) -> Vec<JobId> {
        lock(&self.claimed).clone()
    }

    fn outcome(&self, id: u64) -> Option<Option<String>> {
        lock(&self.completed)
            .iter()
            .find(|(job_id, _)| *job_id == JobId::new(id))
            .map(|(_, error)| error.clone())
    }
}

#[async_trait]
impl JobQueue for QueueStub {
    async fn create_job(&self, job: Job) -> Result<Job, RepositoryError> {
        lock(&self.pending).push_back(job.clone());
        Ok(job)
    }

    async fn find_job_by_id(&self, _id: JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(None)
    }

    async fn next_job(&self) -> Result<Option<Job>, RepositoryError> {
        let failing = self.failing_claims.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_claims.store(failing - 1, Ordering::SeqCst);
            return Err(RepositoryError::substrate("disk unavailable"));
        }
        let next = lock(&self.pending).pop_front();
        if let Some(job) = &next {
            lock(&self.claimed).push(job.id());
        }
        Ok(next)
    }

    async fn complete_job(&self, id: JobId, error: Option<String>) -> Result<(), RepositoryError> {
        lock(&self.completed).push((id, error));
        Ok(())
    }

    async fn reset_job_queue(&self) -> Result<usize, RepositoryError> {
        Ok(0)
    }
}

enum Script {
    Fail(&'static str),
    Panic,
}

#[derive(Default)]
struct ExecutorStub {
    scripts: HashMap<u64, Script>,
    entered: Option<mpsc::UnboundedSender<JobId>>,
    release: Option<Arc<Notify>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ExecutorStub {
    fn scripted(scripts: impl IntoIterator<Item = (u64, Script)>) -> Self {
        Self {
            scripts: scripts.into_iter().collect(),
            ..Self::default()
        }
    }

    fn reporting(entered: mpsc::UnboundedSender<JobId>) -> Self {
        Self {
            entered: Some(entered),
            ..Self::default()
        }
    }

    fn gated(entered: mpsc::UnboundedSender<JobId>, release: Arc<Notify>) -> Self {
        Self {
            release: Some(release),
            ..Self::reporting(entered)
        }
    }
}

#[async_trait]
impl JobExecutor for ExecutorStub {
    async fn execute(&self, job: &Job) -> Result<(), JobExecutionError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        if let Some(entered) = &self.entered {
            entered.send(job.id()).expect("report entry");
        }
        if let Some(release) = &self.release {
            release.notified().await;
        } else {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        match self.scripts.get(&job.id().get()) {
            None => Ok(()),
            Some(Script::Fail(message)) => Err(JobExecutionError::failed(*message)),
            Some(Script::Panic) => panic!("executor exploded"),
        }
    }
}

fn spawn(
    queue: &Arc<QueueStub>,
    executor: &Arc<ExecutorStub>,
    config: JobSchedulerConfig,
) -> (JobScheduler, crate::domain::JobSignal) {
    let (signal, wakeups) = job_signal();
    let ports = JobSchedulerPorts::new(
        Arc::clone(queue) as Arc<dyn JobQueue>,
        Arc::clone(executor) as Arc<dyn JobExecutor>,
    );
    (JobScheduler::spawn(ports, wakeups, config), signal)
}

async fn wait_entered(entered: &mut mpsc::UnboundedReceiver<JobId>, count: usize) -> Vec<JobId> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let id = timeout(WAIT, entered.recv())
            .await
            .expect("job entered in time")
            .expect("executor alive");
        ids.push(id);
    }
    ids
}

#[rstest]
#[tokio::test]
async fn initial_check_dispatches_backlog_in_queue_order() {
    let queue = QueueStub::with_jobs(&[1, 2]);
    let executor = Arc::new(ExecutorStub::scripted([(1, Script::Fail("boom"))]));
    let (scheduler, _signal) = spawn(&queue, &executor, JobSchedulerConfig::default());

    scheduler.shutdown().await;

    assert_eq!(queue.claimed(), vec![JobId::new(1), JobId::new(2)]);
    assert_eq!(queue.outcome(1), Some(Some("boom".to_owned())));
    assert_eq!(queue.outcome(2), Some(None));
}

#[rstest]
#[tokio::test]
async fn panics_are_recorded_as_failures() {
    let queue = QueueStub::with_jobs(&[7]);
    let executor = Arc::new(ExecutorStub::scripted([(7, Script::Panic)]));
    let (scheduler, _signal) = spawn(&queue, &executor, JobSchedulerConfig::default());

    scheduler.shutdown().await;

    assert_eq!(
        queue.outcome(7),
        Some(Some("job panicked: executor exploded".to_owned()))
    );
}

#[rstest]
#[tokio::test]
async fn wakeup_dispatches_work_created_after_start() {
    let queue = QueueStub::with_jobs(&[]);
    let (entered_tx, mut entered) = mpsc::unbounded_channel();
    let executor = Arc::new(ExecutorStub::reporting(entered_tx));
    let (scheduler, signal) = spawn(&queue, &executor, JobSchedulerConfig::default());

    queue.push(3);
    signal.notify();
    assert_eq!(wait_entered(&mut entered, 1).await, vec![JobId::new(3)]);

    scheduler.shutdown().await;
    assert_eq!(queue.outcome(3), Some(None));
}

#[rstest]
#[tokio::test]
async fn backlog_runs_concurrently_when_unbounded() {
    let queue = QueueStub::with_jobs(&[1, 2, 3]);
    let (entered_tx, mut entered) = mpsc::unbounded_channel();
    let release = Arc::new(Notify::new());
    let executor = Arc::new(ExecutorStub::gated(entered_tx, Arc::clone(&release)));
    let (scheduler, _signal) = spawn(&queue, &executor, JobSchedulerConfig::default());

    let ids = wait_entered(&mut entered, 3).await;
    assert_eq!(ids.len(), 3);
    assert_eq!(executor.max_active.load(Ordering::SeqCst), 3);

    release.notify_waiters();
    scheduler.shutdown().await;
    assert!((1..=3).all(|id| queue.outcome(id) == Some(None)));
}

#[rstest]
#[tokio::test]
async fn concurrency_cap_limits_active_jobs() {
    let queue = QueueStub::with_jobs(&[1, 2, 3]);
    let (entered_tx, mut entered) = mpsc::unbounded_channel();
    let executor = Arc::new(ExecutorStub::reporting(entered_tx));
    let config = JobSchedulerConfig {
        max_concurrent_jobs: Some(1),
    };
    let (scheduler, _signal) = spawn(&queue, &executor, config);

    let ids = wait_entered(&mut entered, 3).await;
    assert_eq!(ids, vec![JobId::new(1), JobId::new(2), JobId::new(3)]);

    scheduler.shutdown().await;
    assert_eq!(executor.max_active.load(Ordering::SeqCst), 1);
}

#[rstest]
#[tokio::test]
async fn shutdown_waits_for_in_flight_jobs() {
    let queue = QueueStub::with_jobs(&[1]);
    let (entered_tx, mut entered) = mpsc::unbounded_channel();
    let release = Arc::new(Notify::new());
    let executor = Arc::new(ExecutorStub::gated(entered_tx, Arc::clone(&release)));
    let (scheduler, _signal) = spawn(&queue, &executor, JobSchedulerConfig::default());
    wait_entered(&mut entered, 1).await;

    let mut stopping = tokio::spawn(scheduler.shutdown());
    assert!(
        timeout(Duration::from_millis(50), &mut stopping).await.is_err(),
        "shutdown returned while a job was running"
    );
    assert_eq!(queue.outcome(1), None);

    release.notify_one();
    timeout(WAIT, stopping)
        .await
        .expect("shutdown finished")
        .expect("shutdown task");
    assert_eq!(queue.outcome(1), Some(None));
}

#[rstest]
#[tokio::test]
async fn claim_failure_is_retried_on_next_wakeup() {
    let queue = QueueStub::with_jobs(&[4]);
    queue.failing_claims.store(1, Ordering::SeqCst);
    let (entered_tx, mut entered) = mpsc::unbounded_channel();
    let executor = Arc::new(ExecutorStub::reporting(entered_tx));
    let (scheduler, signal) = spawn(&queue, &executor, JobSchedulerConfig::default());

    signal.notify();
    assert_eq!(wait_entered(&mut entered, 1).await, vec![JobId::new(4)]);

    scheduler.shutdown().await;
}

#[rstest]
#[tokio::test]
async fn dropping_every_signal_stops_the_loop() {
    let queue = QueueStub::with_jobs(&[1]);
    let executor = Arc::new(ExecutorStub::default());
    let (scheduler, signal) = spawn(&queue, &executor, JobSchedulerConfig::default());
    drop(signal);

    timeout(WAIT, scheduler.shutdown())
        .await
        .expect("scheduler stopped");
    assert_eq!(queue.outcome(1), Some(None));
}
