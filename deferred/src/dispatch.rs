//! Continuation dispatch policies.
//!
//! By default a [`Deferred`](crate::Deferred) fires its continuations inline,
//! on the stack of whoever settles it or registers on it. Routing them through
//! a [`TurnQueue`] instead defers every invocation to a later turn, run by an
//! external driver.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// A continuation invocation ready to run.
pub(crate) type Job = Box<dyn FnOnce() + Send>;

/// How a deferred runs its continuations.
#[derive(Clone, Debug, Default)]
pub enum Dispatch {
    /// Run continuations synchronously, inside the settlement or
    /// registration call that triggered them.
    ///
    /// Settling a chain of pending links recurses once per link, since each
    /// continuation settles its child before returning. Chains thousands of
    /// links deep can exhaust the thread's stack this way; use `Queued` for
    /// such pipelines.
    #[default]
    Inline,

    /// Push continuation invocations onto a turn queue. Nothing runs until
    /// the queue is flushed.
    Queued(TurnQueue),
}

/// FIFO queue of pending continuation invocations.
///
/// `TurnQueue` is a cheap handle; clones share the same queue. Any number of
/// deferreds may dispatch onto one queue, and their jobs run in the order
/// they were pushed.
///
/// # Examples
///
/// ```rust
/// use deferred::{Deferred, Dispatch, TurnQueue};
///
/// let queue = TurnQueue::new();
/// let d = Deferred::<u32, String>::builder()
///     .dispatch(Dispatch::Queued(queue.clone()))
///     .build(|resolve, _| {
///         resolve.resolve(1);
///         Ok(())
///     });
///
/// let child = d.and_then(|v| Ok(v + 1));
/// assert!(child.is_pending());
///
/// queue.run_until_idle();
/// assert_eq!(child.outcome(), Some(Ok(2)));
/// ```
#[derive(Clone, Default)]
pub struct TurnQueue {
    jobs: Arc<Mutex<VecDeque<Job>>>,
}

impl TurnQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs waiting to run.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no job is waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Runs the oldest queued job, if any.
    ///
    /// The queue lock is released before the job runs, so a job may push
    /// further jobs. Returns `false` when the queue was empty.
    pub fn run_next(&self) -> bool {
        let job = self.lock().pop_front();

        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Runs jobs until the queue is empty, including jobs pushed by the jobs
    /// themselves. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;

        while self.run_next() {
            ran += 1;
        }

        tracing::trace!(ran, "turn queue idle");
        ran
    }

    /// Appends `job` to the back of the queue.
    pub(crate) fn push(&self, job: Job) {
        let mut jobs = self.lock();
        jobs.push_back(job);

        tracing::trace!(queued = jobs.len(), "continuation queued");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for TurnQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnQueue")
            .field("len", &self.len())
            .finish()
    }
}
