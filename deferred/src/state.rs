use std::fmt;

/// Settlement status of a [`Deferred`](crate::Deferred).
///
/// A deferred starts `Pending` and moves to exactly one of the two terminal
/// statuses, at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The outcome is not known yet.
    Pending,

    /// Settled successfully with a value.
    Fulfilled,

    /// Settled with a failure reason.
    Rejected,
}

impl Status {
    /// Returns `true` once the deferred has settled either way.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Pending => "pending",
            Status::Fulfilled => "fulfilled",
            Status::Rejected => "rejected",
        };

        f.write_str(name)
    }
}

/// Settlement state together with the outcome it carries.
///
/// The outcome lives inside the terminal variants, so there is no value to
/// read while pending.
pub(crate) enum State<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> State<T, E> {
    pub(crate) fn status(&self) -> Status {
        match self {
            State::Pending => Status::Pending,
            State::Fulfilled(_) => Status::Fulfilled,
            State::Rejected(_) => Status::Rejected,
        }
    }
}

impl<T: Clone, E: Clone> State<T, E> {
    /// Clones the outcome out of a terminal state.
    pub(crate) fn outcome(&self) -> Option<Result<T, E>> {
        match self {
            State::Pending => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Rejected(reason) => Some(Err(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_has_no_outcome() {
        let state: State<u8, String> = State::Pending;

        assert_eq!(state.status(), Status::Pending);
        assert_eq!(state.outcome(), None);
    }

    #[test]
    fn test_terminal_outcomes() {
        let ok: State<u8, String> = State::Fulfilled(3);
        let err: State<u8, String> = State::Rejected("bad".to_owned());

        assert_eq!(ok.outcome(), Some(Ok(3)));
        assert_eq!(err.outcome(), Some(Err("bad".to_owned())));
        assert!(ok.status().is_terminal());
        assert!(err.status().is_terminal());
        assert!(!Status::Pending.is_terminal());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Fulfilled.to_string(), "fulfilled");
    }
}
