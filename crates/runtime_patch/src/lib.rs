//! Queued application of edit scripts to a live tree.
//!
//! One [`PatchApplier`] serves one rendering surface. Edits from every caller
//! go into a single FIFO queue and are applied one at a time on the
//! `patch-applier` worker thread, each under its own lock of the shared tree.
//! Failed edits are skipped and recorded in [`Diagnostics`]; they never stop
//! the drain.

mod apply;
mod diagnostics;

pub use crate::apply::apply_edit;
pub use crate::diagnostics::{ApplyWarning, DEFAULT_DIAGNOSTICS_CAPACITY, Diagnostics};

use futures::FutureExt;
use futures::channel::oneshot;
use live_dom::SharedTree;
use markup::Edit;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplierError {
    #[error("failed to spawn the patch-applier thread")]
    Spawn(#[source] std::io::Error),
}

enum Job {
    Drain,
    Shutdown { ack: oneshot::Sender<()> },
}

#[derive(Default)]
struct QueueState {
    edits: VecDeque<Edit>,
    drain_scheduled: bool,
    waiters: Vec<oneshot::Sender<()>>,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        self.edits.is_empty() && !self.drain_scheduled
    }
}

struct Worker {
    jobs: Sender<Job>,
    thread: JoinHandle<()>,
}

pub struct PatchApplier {
    tree: SharedTree,
    queue: Arc<Mutex<QueueState>>,
    diagnostics: Diagnostics,
    worker: Option<Worker>,
}

impl PatchApplier {
    /// Creates a stopped applier for `tree`.
    pub fn new(tree: SharedTree) -> Self {
        Self::with_diagnostics(tree, Diagnostics::new())
    }

    pub fn with_diagnostics(tree: SharedTree, diagnostics: Diagnostics) -> Self {
        Self {
            tree,
            queue: Arc::new(Mutex::new(QueueState::default())),
            diagnostics,
            worker: None,
        }
    }

    pub fn tree(&self) -> &SharedTree {
        &self.tree
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawns the worker. Edits queued while stopped start draining now.
    pub fn start(&mut self) -> Result<(), ApplierError> {
        if self.worker.is_some() {
            return Ok(());
        }
        let (jobs, rx) = mpsc::channel::<Job>();
        let tree = Arc::clone(&self.tree);
        let queue = Arc::clone(&self.queue);
        let diagnostics = self.diagnostics.clone();
        let thread = thread::Builder::new()
            .name("patch-applier".into())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    match job {
                        Job::Drain => drain(&tree, &queue, &diagnostics),
                        Job::Shutdown { ack } => {
                            let _ = ack.send(());
                            break;
                        }
                    }
                }
            })
            .map_err(ApplierError::Spawn)?;
        log::info!(target: "runtime_patch", "patch applier started");
        let worker = Worker { jobs, thread };
        let mut queue = self.queue.lock();
        if !queue.edits.is_empty() && !queue.drain_scheduled {
            queue.drain_scheduled = worker.jobs.send(Job::Drain).is_ok();
        }
        drop(queue);
        self.worker = Some(worker);
        Ok(())
    }

    /// Finishes any scheduled drain, then joins the worker. Later edits wait
    /// in the queue for the next [`start`](Self::start).
    pub fn stop(&mut self) {
        let Some(Worker { jobs, thread }) = self.worker.take() else {
            return;
        };
        let (ack, acked) = oneshot::channel();
        if jobs.send(Job::Shutdown { ack }).is_ok() {
            let _ = futures::executor::block_on(acked);
        }
        drop(jobs);
        if thread.join().is_err() {
            log::warn!(target: "runtime_patch", "patch-applier thread panicked");
        }
        log::info!(target: "runtime_patch", "patch applier stopped");
    }

    /// Appends `edits` to the queue and schedules a drain if none is pending.
    /// Returns without waiting for application.
    pub fn apply_patches(&self, edits: Vec<Edit>) {
        if edits.is_empty() {
            return;
        }
        log::debug!(target: "runtime_patch", "enqueued {} edits", edits.len());
        let mut queue = self.queue.lock();
        queue.edits.extend(edits);
        if queue.drain_scheduled {
            return;
        }
        if let Some(worker) = &self.worker {
            queue.drain_scheduled = worker.jobs.send(Job::Drain).is_ok();
        }
    }

    /// Resolves once the queue is empty and no drain is running.
    pub fn drained(&self) -> Drained {
        let mut queue = self.queue.lock();
        if queue.is_idle() {
            return Drained(None);
        }
        let (tx, rx) = oneshot::channel();
        queue.waiters.push(tx);
        Drained(Some(rx))
    }

    /// Edits waiting in the queue, not counting one being applied.
    pub fn pending(&self) -> usize {
        self.queue.lock().edits.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.lock().is_idle()
    }
}

impl Drop for PatchApplier {
    fn drop(&mut self) {
        self.stop();
    }
}

fn drain(tree: &SharedTree, queue: &Mutex<QueueState>, diagnostics: &Diagnostics) {
    let mut applied = 0usize;
    loop {
        let next = {
            let mut queue = queue.lock();
            let popped = queue.edits.pop_front();
            match popped {
                Some(edit) => edit,
                None => {
                    queue.drain_scheduled = false;
                    let waiters = std::mem::take(&mut queue.waiters);
                    drop(queue);
                    log::debug!(target: "runtime_patch", "drained {applied} edits");
                    for waiter in waiters {
                        let _ = waiter.send(());
                    }
                    return;
                }
            }
        };
        let result = apply_edit(&mut tree.lock(), next);
        if let Err(warning) = result {
            diagnostics.record(warning);
        }
        applied += 1;
    }
}

/// Completion of the applier's queue. Always resolves to `()`, also when the
/// applier is dropped before draining.
#[must_use = "futures do nothing unless awaited"]
pub struct Drained(Option<oneshot::Receiver<()>>);

impl Future for Drained {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match &mut self.0 {
            None => Poll::Ready(()),
            Some(rx) => rx.poll_unpin(cx).map(|_| ()),
        }
    }
}
