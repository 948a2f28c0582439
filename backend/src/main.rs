//! Peapod daemon: opens the store, recovers the job queue and runs the
//! scheduler until interrupted.

use std::sync::Arc;

use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use peapod::domain::ports::JobQueue;
use peapod::domain::{
    JobScheduler, JobSchedulerPorts, MediaJobExecutor, MediaJobExecutorPorts, job_signal,
};
use peapod::outbound::store::{Store, StoreJobQueue, StoreTrackService, StoreUserService};
use peapod::outbound::{LocalFileStore, TracingSmsSender, UnconfiguredMediaSource};
use peapod::settings::PeapodSettings;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        PeapodSettings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let database_path = settings.database_path();
    let store = Store::open(&database_path, Arc::new(DefaultClock))
        .with_context(|| format!("failed to open store at {}", database_path.display()))?;
    let store = Arc::new(store);

    let (signal, wakeups) = job_signal();
    let queue = Arc::new(StoreJobQueue::new(Arc::clone(&store), signal));
    let recovered = queue
        .reset_job_queue()
        .await
        .wrap_err("failed to reset job queue")?;
    info!(recovered, "job queue recovered");

    let media = Arc::new(UnconfiguredMediaSource::new());
    let executor = MediaJobExecutor::new(MediaJobExecutorPorts {
        users: Arc::new(StoreUserService::new(Arc::clone(&store))),
        tracks: Arc::new(StoreTrackService::new(Arc::clone(&store))),
        files: Arc::new(LocalFileStore::new(settings.file_path())),
        sms: Arc::new(TracingSmsSender::new()),
        url_generator: Arc::clone(&media) as _,
        speech: media,
    });

    let scheduler = JobScheduler::spawn(
        JobSchedulerPorts::new(queue, Arc::new(executor)),
        wakeups,
        settings.scheduler_config(),
    );
    info!(database = %database_path.display(), "peapodd running");

    tokio::signal::ctrl_c()
        .await
        .wrap_err("failed to listen for interrupt")?;
    info!("interrupt received; shutting down");
    scheduler.shutdown().await;
    Ok(())
}
