use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::WorkerConfig;
use crate::errors::{Error, Result};
use crate::metrics::registry::{JOBS_TOTAL, JOB_DURATION_SECONDS};
use crate::service::ServiceApi;

/// Deferred work executed outside the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    DeleteUser(i64),
    DeleteEmail(i64),
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::DeleteUser(_) => "delete_user",
            Job::DeleteEmail(_) => "delete_email",
        }
    }

    async fn run(self, service: &dyn ServiceApi) -> Result<()> {
        match self {
            Job::DeleteUser(id) => service.delete_user(id).await,
            Job::DeleteEmail(id) => service.delete_email(id).await,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::DeleteUser(id) | Job::DeleteEmail(id) => write!(f, "{}({})", self.name(), id),
        }
    }
}

pub type JobReceiver = mpsc::Receiver<Job>;

/// Producer side of the bounded job queue
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<Job>,
}

impl JobQueue {
    pub fn new(capacity: usize) -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enqueue a job, waiting while the queue is full
    pub async fn enqueue(&self, job: Job) -> Result<()> {
        self.tx
            .send(job)
            .await
            .map_err(|_| Error::msg(format!("could not enqueue {}; job queue is closed", job)))?;

        JOBS_TOTAL.with_label_values(&[job.name(), "enqueued"]).inc();
        debug!(job = %job, "Job enqueued");
        Ok(())
    }
}

/// Running worker tasks
pub struct Workers {
    stop: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Ask workers to finish what is queued, then wait for them to exit
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Worker task failed: {}", e);
            }
        }
    }
}

/// Spawn `config.concurrency` workers draining the queue.
///
/// Workers exit after [`Workers::shutdown`] once the queue is empty, or when
/// every `JobQueue` handle has been dropped.
pub fn start_workers(
    service: Arc<dyn ServiceApi>,
    config: &WorkerConfig,
    rx: JobReceiver,
) -> Workers {
    let rx = Arc::new(Mutex::new(rx));
    let (stop, stopped) = watch::channel(false);
    let concurrency = config.concurrency.max(1);
    info!("Starting {} background workers", concurrency);

    let handles = (0..concurrency)
        .map(|worker| {
            let rx = rx.clone();
            let service = service.clone();
            let mut stopped = stopped.clone();
            tokio::spawn(async move {
                loop {
                    // lock is released before the job runs
                    let next = {
                        let mut rx = rx.lock().await;
                        if *stopped.borrow() {
                            rx.try_recv().ok()
                        } else {
                            tokio::select! {
                                job = rx.recv() => job,
                                _ = stopped.changed() => rx.try_recv().ok(),
                            }
                        }
                    };
                    let Some(job) = next else {
                        debug!(worker, "Job queue drained, worker exiting");
                        break;
                    };
                    process(service.as_ref(), job, worker).await;
                }
            })
        })
        .collect();

    Workers { stop, handles }
}

async fn process(service: &dyn ServiceApi, job: Job, worker: usize) {
    let start = Instant::now();
    info!(job = %job, worker, "Job started");

    let outcome = match job.run(service).await {
        Ok(()) => {
            info!(job = %job, worker, duration_ms = start.elapsed().as_millis() as u64, "Job finished");
            "succeeded"
        }
        Err(err) => {
            error!(job = %job, worker, error = %err, "Job failed");
            "failed"
        }
    };

    JOBS_TOTAL.with_label_values(&[job.name(), outcome]).inc();
    JOB_DURATION_SECONDS
        .with_label_values(&[job.name()])
        .observe(start.elapsed().as_secs_f64());
}
