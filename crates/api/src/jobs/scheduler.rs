//! Interval scheduler for background jobs.
//!
//! Each registered job runs on its own tokio task. A `watch` channel carries
//! the shutdown signal so in-flight runs finish before the task exits.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// How often a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFrequency {
    Seconds(u64),
    /// Clamped to at least one minute.
    Minutes(u64),
    Hourly,
    /// Every 24 hours from start-up, not at a fixed wall-clock time.
    Daily,
}

impl JobFrequency {
    pub fn duration(&self) -> Duration {
        match self {
            JobFrequency::Seconds(secs) => Duration::from_secs((*secs).max(1)),
            JobFrequency::Minutes(mins) => Duration::from_secs((*mins).max(1) * 60),
            JobFrequency::Hourly => Duration::from_secs(3600),
            JobFrequency::Daily => Duration::from_secs(86400),
        }
    }
}

#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Stable name, used as the `job` label and in logs.
    fn name(&self) -> &'static str;

    fn frequency(&self) -> JobFrequency;

    /// Run once right after start-up instead of waiting a full period.
    fn run_on_start(&self) -> bool {
        false
    }

    async fn execute(&self) -> Result<(), String>;
}

/// Runs a job once and records its outcome.
async fn run_job(job: &dyn Job) -> Result<(), String> {
    let name = job.name();
    debug!(job = name, "Job starting");

    let started = Instant::now();
    let result = job.execute().await;
    let elapsed = started.elapsed();

    histogram!("job_duration_seconds", "job" => name).record(elapsed.as_secs_f64());
    counter!(
        "job_runs_total",
        "job" => name,
        "result" => if result.is_ok() { "ok" } else { "error" }
    )
    .increment(1);

    match &result {
        Ok(()) => debug!(job = name, elapsed_ms = elapsed.as_millis() as u64, "Job finished"),
        Err(e) => error!(job = name, elapsed_ms = elapsed.as_millis() as u64, error = %e, "Job failed"),
    }
    result
}

async fn run_loop(job: Arc<dyn Job>, mut shutdown_rx: watch::Receiver<bool>) {
    let name = job.name();
    let frequency = job.frequency();

    let mut interval = tokio::time::interval(frequency.duration());
    // ticks missed during a long run are dropped, not replayed
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    if !job.run_on_start() {
        // the first tick completes immediately
        interval.tick().await;
    }

    info!(job = name, frequency = ?frequency, run_on_start = job.run_on_start(), "Job scheduled");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let _ = run_job(job.as_ref()).await;
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!(job = name, "Job stopped");
                    break;
                }
            }
        }
    }
}

pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Names of the registered jobs, in registration order.
    pub fn job_names(&self) -> Vec<&'static str> {
        self.jobs.iter().map(|j| j.name()).collect()
    }

    /// Spawns one task per registered job.
    pub fn start(&mut self) {
        info!(jobs = ?self.job_names(), "Starting job scheduler");
        for job in &self.jobs {
            let handle = tokio::spawn(run_loop(Arc::clone(job), self.shutdown_tx.subscribe()));
            self.handles.push(handle);
        }
    }

    /// Signals every job to stop after its current run. Does not wait.
    pub fn shutdown(&self) {
        info!("Stopping job scheduler");
        let _ = self.shutdown_tx.send(true);
    }

    /// Waits for all job tasks, giving up after `timeout`.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let handles = self.handles;
        let all = async move {
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Job task panicked");
                }
            }
        };

        match tokio::time::timeout(timeout, all).await {
            Ok(()) => info!("All jobs stopped"),
            Err(_) => warn!(timeout_secs = timeout.as_secs(), "Job shutdown timed out"),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: Arc<AtomicUsize>,
        fail: bool,
        on_start: bool,
    }

    impl CountingJob {
        fn new(on_start: bool) -> (Self, Arc<AtomicUsize>) {
            let runs = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    runs: Arc::clone(&runs),
                    fail: false,
                    on_start,
                },
                runs,
            )
        }
    }

    #[async_trait::async_trait]
    impl Job for CountingJob {
        fn name(&self) -> &'static str {
            "counting_job"
        }

        fn frequency(&self) -> JobFrequency {
            JobFrequency::Hourly
        }

        fn run_on_start(&self) -> bool {
            self.on_start
        }

        async fn execute(&self) -> Result<(), String> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("boom".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_frequency_duration() {
        assert_eq!(JobFrequency::Seconds(30).duration(), Duration::from_secs(30));
        assert_eq!(JobFrequency::Seconds(0).duration(), Duration::from_secs(1));
        assert_eq!(JobFrequency::Minutes(5).duration(), Duration::from_secs(300));
        assert_eq!(JobFrequency::Minutes(0).duration(), Duration::from_secs(60));
        assert_eq!(JobFrequency::Hourly.duration(), Duration::from_secs(3600));
        assert_eq!(JobFrequency::Daily.duration(), Duration::from_secs(86400));
    }

    #[test]
    fn test_register_keeps_order() {
        let mut scheduler = JobScheduler::default();
        assert!(scheduler.job_names().is_empty());
        scheduler.register(CountingJob::new(false).0);
        scheduler.register(CountingJob::new(true).0);
        assert_eq!(scheduler.job_names(), vec!["counting_job", "counting_job"]);
    }

    #[test]
    fn test_run_job_success() {
        let (job, runs) = CountingJob::new(false);
        tokio_test::assert_ok!(tokio_test::block_on(run_job(&job)));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_job_reports_failure() {
        let (mut job, runs) = CountingJob::new(false);
        job.fail = true;
        assert_eq!(run_job(&job).await, Err("boom".to_string()));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_waits_a_full_period_by_default() {
        let mut scheduler = JobScheduler::new();
        let (job, runs) = CountingJob::new(false);
        scheduler.register(job);
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_on_start() {
        let mut scheduler = JobScheduler::new();
        let (job, runs) = CountingJob::new(true);
        scheduler.register(job);
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
