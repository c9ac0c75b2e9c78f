use crate::dispatch::Dispatch;
use crate::error::Panicked;
use crate::settle::{Reject, Resolve};
use crate::Deferred;

use std::marker::PhantomData;

/// Builder for configuring and creating a [`Deferred`].
///
/// `DeferredBuilder` allows choosing how continuations are dispatched and
/// attaching a diagnostic label before the deferred is created. Children
/// produced by chaining inherit the dispatch policy but not the label.
///
/// # Examples
///
/// ```rust
/// use deferred::{Deferred, Dispatch, TurnQueue};
///
/// let queue = TurnQueue::new();
/// let d = Deferred::<u8, String>::builder()
///     .dispatch(Dispatch::Queued(queue.clone()))
///     .label("config-load")
///     .pending();
///
/// assert_eq!(d.label(), Some("config-load"));
/// ```
pub struct DeferredBuilder<T, E> {
    /// How continuations are run.
    dispatch: Dispatch,

    /// Optional label carried in logs.
    label: Option<&'static str>,

    _outcome: PhantomData<fn() -> (T, E)>,
}

impl<T, E> DeferredBuilder<T, E> {
    /// Creates a builder with inline dispatch and no label.
    pub fn new() -> Self {
        Self {
            dispatch: Dispatch::Inline,
            label: None,
            _outcome: PhantomData,
        }
    }

    /// Sets the dispatch policy.
    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Sets a diagnostic label.
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }
}

impl<T, E> DeferredBuilder<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + From<Panicked> + 'static,
{
    /// Builds the deferred and runs `initializer` immediately.
    pub fn build<I>(self, initializer: I) -> Deferred<T, E>
    where
        I: FnOnce(Resolve<T, E>, Reject<T, E>) -> Result<(), E>,
    {
        self.pending().initialize(initializer)
    }

    /// Builds a deferred without an initializer.
    pub fn pending(self) -> Deferred<T, E> {
        Deferred::from_parts(self.dispatch, self.label)
    }
}

impl<T, E> Default for DeferredBuilder<T, E> {
    fn default() -> Self {
        Self::new()
    }
}
