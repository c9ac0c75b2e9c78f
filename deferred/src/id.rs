use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide allocator handing out deferred identities.
static NEXT_ID: IdAllocator = IdAllocator::new();

/// Unique identity of a [`Deferred`](crate::Deferred).
///
/// Identities are strictly increasing in construction order and never
/// reused during the lifetime of the process. They exist for diagnostics
/// and ordering only; no behavior depends on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeferredId(u64);

impl DeferredId {
    /// Allocates the next identity from the process-wide allocator.
    pub(crate) fn next() -> Self {
        NEXT_ID.allocate()
    }

    /// Returns the raw sequence number.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeferredId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic identity counter.
///
/// The first identity handed out is `1`.
pub(crate) struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub(crate) const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub(crate) fn allocate(&self) -> DeferredId {
        DeferredId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_starts_at_one() {
        let ids = IdAllocator::new();

        assert_eq!(ids.allocate().as_u64(), 1);
        assert_eq!(ids.allocate().as_u64(), 2);
    }

    #[test]
    fn test_global_ids_increase() {
        let a = DeferredId::next();
        let b = DeferredId::next();

        assert!(b > a);
    }

    #[test]
    fn test_display() {
        assert_eq!(IdAllocator::new().allocate().to_string(), "#1");
    }
}
