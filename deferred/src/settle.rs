use crate::deferred::Shared;
use crate::id::DeferredId;

use std::fmt;
use std::sync::Arc;

/// Capability to fulfil a [`Deferred`](crate::Deferred).
///
/// Handed to the initializer at construction. It can be cloned, stored and
/// moved to another thread; every clone settles the same deferred.
pub struct Resolve<T, E> {
    shared: Arc<Shared<T, E>>,
}

/// Capability to reject a [`Deferred`](crate::Deferred).
///
/// The failure-side twin of [`Resolve`].
pub struct Reject<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Resolve<T, E> {
    pub(crate) fn new(shared: Arc<Shared<T, E>>) -> Self {
        Self { shared }
    }

    /// Identity of the deferred this capability settles.
    pub fn id(&self) -> DeferredId {
        self.shared.id()
    }
}

impl<T, E> Resolve<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Fulfils the deferred with `value` and runs its success continuations.
    ///
    /// Does nothing and returns `false` if the deferred has already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.shared.settle(Ok(value))
    }
}

impl<T, E> Reject<T, E> {
    pub(crate) fn new(shared: Arc<Shared<T, E>>) -> Self {
        Self { shared }
    }

    /// Identity of the deferred this capability settles.
    pub fn id(&self) -> DeferredId {
        self.shared.id()
    }
}

impl<T, E> Reject<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Rejects the deferred with `reason` and runs its failure continuations.
    ///
    /// Does nothing and returns `false` if the deferred has already settled.
    pub fn reject(&self, reason: E) -> bool {
        self.shared.settle(Err(reason))
    }
}

impl<T, E> Clone for Resolve<T, E> {
    fn clone(&self) -> Self {
        Self::new(self.shared.clone())
    }
}

impl<T, E> Clone for Reject<T, E> {
    fn clone(&self) -> Self {
        Self::new(self.shared.clone())
    }
}

impl<T, E> fmt::Debug for Resolve<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Resolve").field(&self.id()).finish()
    }
}

impl<T, E> fmt::Debug for Reject<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reject").field(&self.id()).finish()
    }
}
