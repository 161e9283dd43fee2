#![forbid(unsafe_code)]

//! Rebuild scheduling.
//!
//! Bound views never render themselves in response to a notification; they
//! ask the host to schedule a rebuild. [`RebuildQueue`] is the reference
//! host-side scheduler: an insertion-ordered set of pending view ids that the
//! host drains once per frame.
//!
//! # Invariants
//!
//! 1. A view id is pending at most once; repeated requests before a drain
//!    coalesce.
//! 2. `drain()` yields ids in first-requested order and leaves the queue empty.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a bound view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u64);

impl ViewId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Host hook for imperatively scheduling a re-render.
pub trait RebuildScheduler {
    /// Request that view `id` be rendered again on the next frame.
    fn schedule_rebuild(&self, id: ViewId);
}

/// Coalescing queue of views waiting to be rebuilt.
#[derive(Debug, Default)]
pub struct RebuildQueue {
    pending: RefCell<Vec<ViewId>>,
}

impl RebuildQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// True if `id` is pending.
    #[must_use]
    pub fn contains(&self, id: ViewId) -> bool {
        self.pending.borrow().contains(&id)
    }

    /// Take all pending ids in request order.
    pub fn drain(&self) -> Vec<ViewId> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    /// Drop a pending request, e.g. when a view is detached.
    pub fn cancel(&self, id: ViewId) -> bool {
        let mut pending = self.pending.borrow_mut();
        let before = pending.len();
        pending.retain(|&p| p != id);
        pending.len() != before
    }
}

impl RebuildScheduler for RebuildQueue {
    fn schedule_rebuild(&self, id: ViewId) {
        let mut pending = self.pending.borrow_mut();
        if pending.contains(&id) {
            trace!(%id, "rebuild already pending");
            return;
        }
        pending.push(id);
        trace!(%id, pending = pending.len(), "rebuild scheduled");
    }
}
