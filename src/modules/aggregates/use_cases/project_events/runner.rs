// Background worker that keeps the read model store converging on the event log.
//
// Purpose
// - Own the projector and drive it from commit notifications, a poll tick, and
//   admin commands, one at a time.
//
// Responsibilities
// - Wake as soon as the log head moves past the cursor.
// - Retry transient failures with capped exponential backoff.
// - Persist the cursor on graceful shutdown.

use crate::modules::aggregates::adapters::outbound::read_models::{
    DeadLetterRepository, ReadModelRepository, WatermarkRepository,
};
use crate::modules::aggregates::use_cases::project_events::projector::Projector;
use crate::modules::aggregates::use_cases::project_events::status::{
    LagThresholds, ProjectionStatus,
};
use crate::shared::infrastructure::event_store::EventStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    pub poll_interval: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub lag: LagThresholds,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_secs(10),
            lag: LagThresholds::default(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub(crate) fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let factor = 2u32.saturating_pow(self.attempt.min(16));
        self.attempt = self.attempt.saturating_add(1);
        self.base.saturating_mul(factor).min(self.max)
    }

    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }
}

pub enum ProjectorCommand {
    /// Catch up now and report how many events were read.
    Trigger(oneshot::Sender<anyhow::Result<usize>>),
    /// Clear the read models and rebuild them from position zero.
    Replay(oneshot::Sender<anyhow::Result<usize>>),
    Status(oneshot::Sender<anyhow::Result<ProjectionStatus>>),
}

#[derive(Debug, Error)]
pub enum ProjectorHandleError {
    #[error("projector is not running")]
    Stopped,

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct ProjectorHandle {
    commands: mpsc::Sender<ProjectorCommand>,
    shutdown: watch::Sender<bool>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ProjectorHandle {
    pub async fn trigger(&self) -> Result<usize, ProjectorHandleError> {
        self.request(ProjectorCommand::Trigger).await
    }

    pub async fn replay(&self) -> Result<usize, ProjectorHandleError> {
        self.request(ProjectorCommand::Replay).await
    }

    pub async fn status(&self) -> Result<ProjectionStatus, ProjectorHandleError> {
        self.request(ProjectorCommand::Status).await
    }

    /// Stop the worker and wait for it to persist its cursor.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        if let Some(task) = self.task.lock().await.take()
            && let Err(error) = task.await
        {
            tracing::error!(%error, "projector task ended abnormally");
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<anyhow::Result<T>>) -> ProjectorCommand,
    ) -> Result<T, ProjectorHandleError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| ProjectorHandleError::Stopped)?;
        let result = response
            .await
            .map_err(|_| ProjectorHandleError::Stopped)?;
        Ok(result?)
    }
}

pub fn spawn<TEventStore, TRepository, TWatermarkRepository>(
    projector: Projector<TEventStore, TRepository, TWatermarkRepository>,
    config: RunnerConfig,
) -> ProjectorHandle
where
    TEventStore: EventStore + 'static,
    TRepository: ReadModelRepository + DeadLetterRepository + 'static,
    TWatermarkRepository: WatermarkRepository + 'static,
{
    let (commands, command_rx) = mpsc::channel(16);
    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run(projector, config, command_rx, shutdown_rx));
    ProjectorHandle {
        commands,
        shutdown,
        task: Arc::new(Mutex::new(Some(task))),
    }
}

enum Wake {
    Commit,
    Tick,
    Command(ProjectorCommand),
    Shutdown,
}

async fn run<TEventStore, TRepository, TWatermarkRepository>(
    mut projector: Projector<TEventStore, TRepository, TWatermarkRepository>,
    config: RunnerConfig,
    mut commands: mpsc::Receiver<ProjectorCommand>,
    mut shutdown: watch::Receiver<bool>,
) where
    TEventStore: EventStore + 'static,
    TRepository: ReadModelRepository + DeadLetterRepository + 'static,
    TWatermarkRepository: WatermarkRepository + 'static,
{
    let event_store = projector.event_store();
    let mut backoff = Backoff::new(config.backoff_base, config.backoff_max);
    let mut resumed = false;
    let mut next_attempt = Instant::now();
    tracing::info!(projector = %projector.name(), "projector started");

    loop {
        if Instant::now() >= next_attempt {
            match step(&mut projector, &mut resumed).await {
                Ok(_) => backoff.reset(),
                Err(error) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        projector = %projector.name(),
                        %error,
                        retry_in_ms = delay.as_millis() as u64,
                        "projection failed, backing off"
                    );
                    next_attempt = Instant::now() + delay;
                }
            }
        }

        let backing_off = Instant::now() < next_attempt;
        let deadline = if backing_off {
            next_attempt
        } else {
            Instant::now() + config.poll_interval
        };
        let cursor = projector.cursor();

        let wake = tokio::select! {
            biased;
            _ = shutdown.changed() => Wake::Shutdown,
            command = commands.recv() => match command {
                Some(command) => Wake::Command(command),
                None => Wake::Shutdown,
            },
            _ = event_store.wait_for_commit(cursor), if !backing_off => Wake::Commit,
            _ = sleep_until(deadline) => Wake::Tick,
        };

        match wake {
            Wake::Commit | Wake::Tick => {}
            Wake::Command(ProjectorCommand::Trigger(reply)) => {
                let result = step(&mut projector, &mut resumed).await;
                if result.is_ok() {
                    backoff.reset();
                    next_attempt = Instant::now();
                }
                let _ = reply.send(result);
            }
            Wake::Command(ProjectorCommand::Replay(reply)) => {
                let result = replay(&mut projector).await;
                if result.is_ok() {
                    resumed = true;
                    backoff.reset();
                    next_attempt = Instant::now();
                }
                let _ = reply.send(result);
            }
            Wake::Command(ProjectorCommand::Status(reply)) => {
                let _ = reply.send(projector.status(config.lag).await);
            }
            Wake::Shutdown => {
                if resumed && let Err(error) = projector.checkpoint().await {
                    tracing::error!(%error, "failed to persist projector cursor on shutdown");
                }
                tracing::info!(
                    projector = %projector.name(),
                    cursor = projector.cursor(),
                    "projector stopped"
                );
                return;
            }
        }
    }
}

async fn step<TEventStore, TRepository, TWatermarkRepository>(
    projector: &mut Projector<TEventStore, TRepository, TWatermarkRepository>,
    resumed: &mut bool,
) -> anyhow::Result<usize>
where
    TEventStore: EventStore + 'static,
    TRepository: ReadModelRepository + DeadLetterRepository + 'static,
    TWatermarkRepository: WatermarkRepository + 'static,
{
    if !*resumed {
        projector.resume().await?;
        *resumed = true;
    }
    catch_up(projector).await
}

async fn replay<TEventStore, TRepository, TWatermarkRepository>(
    projector: &mut Projector<TEventStore, TRepository, TWatermarkRepository>,
) -> anyhow::Result<usize>
where
    TEventStore: EventStore + 'static,
    TRepository: ReadModelRepository + DeadLetterRepository + 'static,
    TWatermarkRepository: WatermarkRepository + 'static,
{
    projector.reset().await?;
    let replayed = catch_up(projector).await?;
    tracing::info!(projector = %projector.name(), replayed, "replay finished");
    Ok(replayed)
}

async fn catch_up<TEventStore, TRepository, TWatermarkRepository>(
    projector: &mut Projector<TEventStore, TRepository, TWatermarkRepository>,
) -> anyhow::Result<usize>
where
    TEventStore: EventStore + 'static,
    TRepository: ReadModelRepository + DeadLetterRepository + 'static,
    TWatermarkRepository: WatermarkRepository + 'static,
{
    let mut total = 0;
    loop {
        let read = projector.run_batch().await?;
        total += read;
        if read < projector.batch_size() {
            return Ok(total);
        }
    }
}
