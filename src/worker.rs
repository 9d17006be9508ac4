//! Single background render worker for interactive front ends.
//!
//! One job at a time: [`RenderWorker::submit`] refuses new work while a render is in flight,
//! which is how a front end keeps its "generate" control disabled. Progress and the final
//! outcome come back as [`WorkerEvent`]s on the receiver returned by [`RenderWorker::spawn`].

use std::{
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread::JoinHandle,
};

use crate::{
    error::{StillvidError, StillvidResult},
    pipeline::RenderPipeline,
    progress::ChannelReporter,
    request::{RenderForm, RenderOutcome},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerEvent {
    Progress(String),
    Finished(RenderOutcome),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a render is already running")]
    Busy,
    #[error("render worker has shut down")]
    Closed,
}

pub struct RenderWorker {
    jobs: Option<mpsc::Sender<RenderForm>>,
    busy: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    pub fn spawn(pipeline: RenderPipeline) -> StillvidResult<(Self, mpsc::Receiver<WorkerEvent>)> {
        let (job_tx, job_rx) = mpsc::channel::<RenderForm>();
        let (event_tx, event_rx) = mpsc::channel::<WorkerEvent>();
        let busy = Arc::new(AtomicBool::new(false));

        let worker_busy = Arc::clone(&busy);
        let handle = std::thread::Builder::new()
            .name("stillvid-render".to_string())
            .spawn(move || worker_loop(pipeline, job_rx, event_tx, worker_busy))
            .map_err(|e| StillvidError::io(format!("failed to spawn render worker: {e}")))?;

        Ok((
            Self {
                jobs: Some(job_tx),
                busy,
                handle: Some(handle),
            },
            event_rx,
        ))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn submit(&self, form: RenderForm) -> Result<(), SubmitError> {
        let jobs = self.jobs.as_ref().ok_or(SubmitError::Closed)?;
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmitError::Busy);
        }
        jobs.send(form).map_err(|_| {
            self.busy.store(false, Ordering::Release);
            SubmitError::Closed
        })
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("render worker thread panicked");
            }
        }
    }
}

fn worker_loop(
    pipeline: RenderPipeline,
    jobs: mpsc::Receiver<RenderForm>,
    events: mpsc::Sender<WorkerEvent>,
    busy: Arc<AtomicBool>,
) {
    while let Ok(form) = jobs.recv() {
        let mut reporter = ChannelReporter::new(events.clone());
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            pipeline.run_form(&form, &mut reporter)
        }))
        .unwrap_or_else(|_| RenderOutcome::Failure {
            message: "render panicked".to_string(),
        });

        // `busy` is cleared before `Finished` goes out.
        busy.store(false, Ordering::Release);
        let _ = events.send(WorkerEvent::Finished(outcome));
    }
    tracing::debug!("render worker stopped");
}
