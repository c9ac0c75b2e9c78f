use crate::DeferredId;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

/// A panic captured while running an initializer or a continuation handler.
///
/// Panics never escape a [`Deferred`](crate::Deferred). They are caught at
/// the call site and turned into a rejection, using `E: From<Panicked>` to
/// build the failure reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("deferred {id} panicked: {message}")]
pub struct Panicked {
    /// The deferred whose initializer or continuation panicked.
    pub id: DeferredId,

    /// The panic message, or a placeholder when the payload was not a string.
    pub message: String,
}

impl From<Panicked> for String {
    fn from(panicked: Panicked) -> Self {
        panicked.to_string()
    }
}

/// Runs `f`, converting a panic into `Err(E::from(Panicked))`.
pub(crate) fn catch<R, E, F>(id: DeferredId, f: F) -> Result<R, E>
where
    E: From<Panicked>,
    F: FnOnce() -> Result<R, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::debug!(%id, %message, "captured panic as rejection");

            Err(E::from(Panicked { id, message }))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
