//! Fixed-size worker pool with a task-completion fence
//!
//! Row and column tasks are fire-and-forget closures pushed onto an
//! unbounded FIFO channel and drained by a fixed set of worker threads. The
//! driver synchronises at phase boundaries through [`WorkerPool::wait_idle`],
//! which blocks until the queue is empty and no worker is mid-task. The
//! fence is a pending-task counter woken through a condvar rather than a
//! sleep poll.
//!
//! A panic inside a task is caught at the worker boundary and logged; it
//! neither kills the worker nor poisons the pool. Partial output beats a
//! full abort for an offline batch tool.

use crossbeam_channel::{Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use tracing::error;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Tracks how many submitted tasks have not yet finished
#[derive(Default)]
struct TaskLedger {
    pending: Mutex<usize>,
    all_done: Condvar,
}

impl TaskLedger {
    fn task_submitted(&self) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn task_finished(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending -= 1;
        if *pending == 0 {
            self.all_done.notify_all();
        }
    }

    fn is_idle(&self) -> bool {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) == 0
    }

    fn wait_idle(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        while *pending > 0 {
            pending = self
                .all_done
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Fixed pool of worker threads consuming an unbounded FIFO task queue
pub struct WorkerPool {
    sender: Option<Sender<Task>>,
    ledger: Arc<TaskLedger>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start a pool with `num_threads` workers (clamped to at least 1)
    ///
    /// Fails only if the operating system refuses to spawn a thread.
    pub fn new(num_threads: usize) -> std::io::Result<Self> {
        let num_threads = num_threads.max(1);
        let (sender, receiver) = crossbeam_channel::unbounded::<Task>();
        let ledger = Arc::new(TaskLedger::default());

        let mut workers = Vec::with_capacity(num_threads);
        for i in 0..num_threads {
            let receiver = receiver.clone();
            let ledger = Arc::clone(&ledger);
            let handle = std::thread::Builder::new()
                .name(format!("homolog-worker-{i}"))
                .spawn(move || worker_loop(receiver, ledger))?;
            workers.push(handle);
        }

        Ok(Self {
            sender: Some(sender),
            ledger,
            workers,
        })
    }

    /// Start a pool sized to the hardware parallelism
    pub fn with_default_size() -> std::io::Result<Self> {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(threads)
    }

    /// Number of worker threads
    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue a fire-and-forget task
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.ledger.task_submitted();
        if let Some(sender) = &self.sender {
            if sender.send(Box::new(task)).is_ok() {
                return;
            }
        }
        // pool already stopped; the task will never run
        self.ledger.task_finished();
        error!("task submitted to a stopped worker pool; dropped");
    }

    /// True iff the queue is empty and no worker is executing a task
    pub fn tasks_completed(&self) -> bool {
        self.ledger.is_idle()
    }

    /// Block until every submitted task has run; this is the inter-phase
    /// fence
    pub fn wait_idle(&self) {
        self.ledger.wait_idle();
    }

    /// Signal workers to exit after draining and join them
    ///
    /// Safe to call once at shutdown; in-flight tasks finish first.
    pub fn stop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("worker thread terminated abnormally");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(receiver: Receiver<Task>, ledger: Arc<TaskLedger>) {
    while let Ok(task) = receiver.recv() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(task));
        if let Err(payload) = outcome {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!("worker task panicked: {message}");
        }
        // the task box is dropped before the fence can open, so resources
        // captured by the closure are released by the time the driver resumes
        ledger.task_finished();
    }
}
