//! # Deferred
//!
//! **Deferred** is a small deferred-value primitive: a [`Deferred<T, E>`]
//! stands for the eventual outcome of an operation, which is either still
//! pending, fulfilled with a `T`, or rejected with an `E`.
//!
//! Consumers register continuations that run once the outcome is known. Each
//! registration returns a new child deferred carrying the continuation's
//! result, so continuations compose into pipelines:
//!
//! - a deferred settles **at most once**; later settlement attempts are no-ops,
//! - continuations run **exactly once**, in registration order,
//! - an `Err` (or a panic) inside a handler rejects the child,
//! - a failure handler returning `Ok` recovers the chain.
//!
//! Continuations fire synchronously by default, inside the call that settles
//! the deferred or registers on an already-settled one. Use
//! [`Dispatch::Queued`] with a [`TurnQueue`] to defer them to a later turn
//! driven by the caller.
//!
//! A continuation that returns another `Deferred` produces a child whose value
//! *is* that deferred; nested deferreds are never flattened.
//!
//! ## Quick Start
//!
//! ```rust
//! use deferred::{Deferred, Status};
//!
//! let d = Deferred::<i32, String>::new(|_, reject| {
//!     reject.reject("boom".to_owned());
//!     Ok(())
//! });
//!
//! let recovered = d.or_else(|reason| Err(format!("still {reason}")))
//!     .then(|v| Ok(v.to_string()), |reason| Ok(format!("recovered:{reason}")));
//!
//! assert_eq!(d.status(), Status::Rejected);
//! assert_eq!(recovered.outcome(), Some(Ok("recovered:still boom".to_owned())));
//! ```
//!
//! ## Modules
//!
//! - [`Deferred`] — the primitive, its queries and chaining methods
//! - [`Resolve`] / [`Reject`] — settlement capabilities
//! - [`DeferredBuilder`] — dispatch and label configuration
//! - [`Dispatch`] / [`TurnQueue`] — continuation dispatch policies

mod builder;
mod deferred;
mod dispatch;
mod error;
mod id;
mod release;
mod settle;
mod state;

pub use builder::DeferredBuilder;
pub use deferred::Deferred;
pub use dispatch::{Dispatch, TurnQueue};
pub use error::Panicked;
pub use id::DeferredId;
pub use settle::{Reject, Resolve};
pub use state::Status;
