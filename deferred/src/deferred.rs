use crate::builder::DeferredBuilder;
use crate::dispatch::Dispatch;
use crate::error::{Panicked, catch};
use crate::id::DeferredId;
use crate::release::DropLater;
use crate::settle::{Reject, Resolve};
use crate::state::{State, Status};

use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A queued continuation, called with the outcome of its branch.
pub(crate) type Continuation<V> = Box<dyn FnOnce(V) + Send>;

/// Mutable part of a deferred, guarded by a mutex.
struct Inner<T, E> {
    state: State<T, E>,

    /// Continuations to run when the deferred is fulfilled, in
    /// registration order.
    on_fulfilled: Vec<Continuation<T>>,

    /// Continuations to run when the deferred is rejected, in
    /// registration order.
    on_rejected: Vec<Continuation<E>>,
}

/// State shared between a deferred, its clones and its capabilities.
pub(crate) struct Shared<T, E> {
    id: DeferredId,
    label: Option<&'static str>,
    dispatch: Dispatch,
    inner: Mutex<Inner<T, E>>,
}

impl<T, E> Shared<T, E> {
    /// Locks the inner state.
    ///
    /// User code never runs while the lock is held, so a poisoned lock
    /// still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, Inner<T, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn id(&self) -> DeferredId {
        self.id
    }
}

impl<T, E> Shared<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Moves the deferred out of `Pending` and fires the matching queue.
    ///
    /// Returns `false` without side effects if the deferred has already
    /// settled.
    pub(crate) fn settle(&self, outcome: Result<T, E>) -> bool {
        let mut inner = self.lock();

        if !matches!(inner.state, State::Pending) {
            tracing::debug!(
                id = %self.id,
                status = %inner.state.status(),
                "ignored late settlement"
            );
            return false;
        }

        let on_fulfilled = mem::take(&mut inner.on_fulfilled);
        let on_rejected = mem::take(&mut inner.on_rejected);

        match outcome {
            Ok(value) => {
                inner.state = State::Fulfilled(value.clone());
                drop(inner);
                drop(on_rejected);

                self.log_settled(Status::Fulfilled, on_fulfilled.len());
                self.fire(on_fulfilled, value);
            }
            Err(reason) => {
                inner.state = State::Rejected(reason.clone());
                drop(inner);
                drop(on_fulfilled);

                self.log_settled(Status::Rejected, on_rejected.len());
                self.fire(on_rejected, reason);
            }
        }

        true
    }

    /// Records an effective settlement. Out of line, off the per-link frame.
    #[inline(never)]
    fn log_settled(&self, status: Status, fired: usize) {
        tracing::debug!(id = %self.id, label = ?self.label, %status, fired, "settled");
    }

    /// Queues a continuation pair, or runs the live branch right away if the
    /// deferred has already settled.
    fn register(&self, on_fulfilled: Continuation<T>, on_rejected: Continuation<E>) {
        let mut inner = self.lock();

        match inner.state.outcome() {
            None => {
                inner.on_fulfilled.push(on_fulfilled);
                inner.on_rejected.push(on_rejected);
            }
            Some(Ok(value)) => {
                drop(inner);
                self.fire(vec![on_fulfilled], value);
            }
            Some(Err(reason)) => {
                drop(inner);
                self.fire(vec![on_rejected], reason);
            }
        }
    }

    /// Runs `continuations` in order, each with its own clone of `outcome`.
    ///
    /// Inline dispatch calls them directly on this stack; queued dispatch
    /// pushes one job per continuation onto the turn queue.
    fn fire<V>(&self, continuations: Vec<Continuation<V>>, outcome: V)
    where
        V: Clone + Send + 'static,
    {
        match &self.dispatch {
            Dispatch::Inline => {
                for continuation in continuations {
                    continuation(outcome.clone());
                }
            }
            Dispatch::Queued(queue) => {
                for continuation in continuations {
                    let outcome = outcome.clone();
                    queue.push(Box::new(move || continuation(outcome)));
                }
            }
        }
    }
}

/// The eventual outcome of an operation: pending, fulfilled with a `T`, or
/// rejected with an `E`.
///
/// A `Deferred` settles at most once. Continuations registered with
/// [`then`](Self::then) and friends run exactly once when it settles (or
/// immediately, if it already has), and each registration produces a new
/// child `Deferred` carrying the continuation's result.
///
/// Cloning a `Deferred` yields another handle to the same deferred value.
///
/// # Examples
///
/// ```rust
/// use deferred::Deferred;
///
/// let mut resolve = None;
/// let d = Deferred::<u32, String>::new(|res, _| {
///     resolve = Some(res);
///     Ok(())
/// });
///
/// let next = d.and_then(|x| Ok(x + 1));
/// resolve.unwrap().resolve(41);
///
/// assert_eq!(next.outcome(), Some(Ok(42)));
/// ```
pub struct Deferred<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Deferred<T, E> {
    /// Returns the identity of this deferred.
    pub fn id(&self) -> DeferredId {
        self.shared.id
    }

    /// Returns the diagnostic label, if one was configured.
    pub fn label(&self) -> Option<&'static str> {
        self.shared.label
    }

    /// Returns the dispatch policy used to run continuations.
    pub fn dispatch(&self) -> &Dispatch {
        &self.shared.dispatch
    }

    /// Returns the current settlement status.
    pub fn status(&self) -> Status {
        self.shared.lock().state.status()
    }

    /// Returns `true` while the deferred has not settled.
    pub fn is_pending(&self) -> bool {
        self.status() == Status::Pending
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<Panicked> + 'static,
{
    /// Creates a deferred and runs `initializer` immediately.
    ///
    /// The initializer receives the two settlement capabilities. It may use
    /// one of them right away, or keep them to settle the deferred later.
    /// Returning `Err(reason)` or panicking rejects the deferred, unless it
    /// has already settled.
    ///
    /// A captured panic still goes through the process panic hook, so the
    /// default hook prints its usual "panicked at" message to stderr even
    /// though the panic has become an ordinary rejection.
    pub fn new<I>(initializer: I) -> Self
    where
        I: FnOnce(Resolve<T, E>, Reject<T, E>) -> Result<(), E>,
    {
        Self::builder().build(initializer)
    }

    /// Creates a deferred without an initializer. Nothing can settle it, so it
    /// stays pending.
    pub fn pending() -> Self {
        Self::builder().pending()
    }

    /// Returns a builder to configure dispatch and labelling.
    pub fn builder() -> DeferredBuilder<T, E> {
        DeferredBuilder::new()
    }

    /// Clones the outcome, or returns `None` while pending.
    pub fn outcome(&self) -> Option<Result<T, E>> {
        self.shared.lock().state.outcome()
    }

    /// Registers both a success and a failure handler.
    ///
    /// The returned child is fulfilled with whatever either handler returns
    /// in `Ok`, so a failure handler that returns `Ok` recovers the chain.
    /// A handler returning `Err` or panicking rejects the child. As with
    /// [`new`](Self::new), a captured panic is still reported by the panic
    /// hook before it becomes a rejection.
    ///
    /// Handlers must be `Send + 'static` because a settlement capability may
    /// run them on another thread. Share state through `Arc` rather than
    /// `Rc`.
    pub fn then<U, F, G>(&self, on_fulfilled: F, on_rejected: G) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
        G: FnOnce(E) -> Result<U, E> + Send + 'static,
    {
        self.chain(on_fulfilled, on_rejected)
    }

    /// Registers a success handler. A rejection is forwarded to the child
    /// unchanged.
    ///
    /// The handler must be `Send + 'static`, see [`then`](Self::then).
    pub fn and_then<U, F>(&self, on_fulfilled: F) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        self.chain(on_fulfilled, Err)
    }

    /// Registers a failure handler. A fulfilled value is forwarded to the
    /// child unchanged.
    ///
    /// The handler must be `Send + 'static`, see [`then`](Self::then).
    pub fn or_else<G>(&self, on_rejected: G) -> Deferred<T, E>
    where
        G: FnOnce(E) -> Result<T, E> + Send + 'static,
    {
        self.chain(Ok, on_rejected)
    }

    /// Returns a child that settles exactly like this deferred.
    pub fn fork(&self) -> Deferred<T, E> {
        self.chain(Ok, Err)
    }

    /// Allocates a pending deferred with empty continuation queues.
    pub(crate) fn from_parts(dispatch: Dispatch, label: Option<&'static str>) -> Self {
        let id = DeferredId::next();
        tracing::trace!(%id, ?label, "created deferred");

        Self {
            shared: Arc::new(Shared {
                id,
                label,
                dispatch,
                inner: Mutex::new(Inner {
                    state: State::Pending,
                    on_fulfilled: Vec::new(),
                    on_rejected: Vec::new(),
                }),
            }),
        }
    }

    /// Runs the initializer once with fresh capabilities, rejecting on `Err`
    /// or panic.
    pub(crate) fn initialize<I>(self, initializer: I) -> Self
    where
        I: FnOnce(Resolve<T, E>, Reject<T, E>) -> Result<(), E>,
    {
        let resolve = Resolve::new(self.shared.clone());
        let reject = Reject::new(self.shared.clone());

        if let Err(reason) = catch(self.id(), || initializer(resolve, reject)) {
            self.shared.settle(Err(reason));
        }

        self
    }

    /// Creates the child and registers the success/failure wrappers that
    /// settle it.
    ///
    /// The wrappers hold the child through `DropLater`, so dropping a long
    /// pending chain releases its links iteratively.
    fn chain<U, F, G>(&self, on_fulfilled: F, on_rejected: G) -> Deferred<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
        G: FnOnce(E) -> Result<U, E> + Send + 'static,
    {
        let child = Deferred::<U, E>::from_parts(self.shared.dispatch.clone(), None);
        let parent = self.id();

        let target = DropLater::new(child.shared.clone());
        let success: Continuation<T> = Box::new(move |value| {
            target.settle(catch(parent, || on_fulfilled(value)));
        });

        let target = DropLater::new(child.shared.clone());
        let failure: Continuation<E> = Box::new(move |reason| {
            target.settle(catch(parent, || on_rejected(reason)));
        });

        tracing::trace!(
            %parent,
            child = %child.id(),
            status = %self.status(),
            "registered continuation"
        );
        self.shared.register(success, failure);

        child
    }
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("id", &self.id())
            .field("label", &self.label())
            .field("status", &self.status())
            .finish()
    }
}
