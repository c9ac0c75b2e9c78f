//! Iterative release of chained deferreds.
//!
//! A pending deferred owns its continuations, and each continuation owns the
//! child it settles. Dropping the head of a long chain would otherwise drop
//! every link from inside the previous link's destructor, one stack frame
//! per link. Values wrapped in [`DropLater`] are instead handed to a
//! thread-local list that the outermost release drains in a loop.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::mem::ManuallyDrop;
use std::ops::Deref;

thread_local! {
    /// Set while this thread is draining released values.
    static DRAINING: Cell<bool> = const { Cell::new(false) };

    /// Values released while draining, dropped by the outermost `release`.
    static RELEASED: RefCell<Vec<Box<dyn Any>>> = const { RefCell::new(Vec::new()) };
}

/// Wrapper whose contents are dropped through [`release`] instead of in
/// place.
pub(crate) struct DropLater<X: 'static>(ManuallyDrop<X>);

impl<X: 'static> DropLater<X> {
    pub(crate) fn new(value: X) -> Self {
        Self(ManuallyDrop::new(value))
    }
}

impl<X: 'static> Deref for DropLater<X> {
    type Target = X;

    fn deref(&self) -> &X {
        &self.0
    }
}

impl<X: 'static> Drop for DropLater<X> {
    fn drop(&mut self) {
        // Safety: the value is taken exactly once, here, and `self.0` is
        // never accessed again.
        let value = unsafe { ManuallyDrop::take(&mut self.0) };
        release(Box::new(value));
    }
}

/// Resets `DRAINING` when the outermost release ends, even on unwind.
struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        let _ = DRAINING.try_with(|draining| draining.set(false));
    }
}

/// Drops `value`, deferring any nested release to a loop at the outermost
/// call.
///
/// If the thread-local storage is already torn down, the value is dropped in
/// place.
pub(crate) fn release(value: Box<dyn Any>) {
    let Ok(nested) = DRAINING.try_with(|draining| draining.replace(true)) else {
        drop(value);
        return;
    };

    if nested {
        let _ = RELEASED.try_with(move |released| released.borrow_mut().push(value));
        return;
    }

    let _guard = DrainGuard;
    drop(value);

    while let Some(next) = RELEASED
        .try_with(|released| released.borrow_mut().pop())
        .ok()
        .flatten()
    {
        drop(next);
    }
}
