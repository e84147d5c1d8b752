//! Sequencing for classification results that arrive out of order.

use crate::config::ClassificationOrdering;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out a sequence number per classification request and decides
/// whether a result may still change the animation.
///
/// Call [`admit`](Self::admit) while holding the controller lock so the
/// decision and the transition happen together.
#[derive(Debug)]
pub struct ClassificationGate {
    ordering: ClassificationOrdering,
    next_seq: AtomicU64,
    applied: AtomicU64,
}

impl ClassificationGate {
    pub fn new(ordering: ClassificationOrdering) -> Self {
        Self {
            ordering,
            next_seq: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        }
    }

    pub fn ordering(&self) -> ClassificationOrdering {
        self.ordering
    }

    /// Sequence number for a new request. Starts at 1.
    pub fn issue(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn admit(&self, seq: u64) -> bool {
        let previous = self.applied.fetch_max(seq, Ordering::SeqCst);
        match self.ordering {
            ClassificationOrdering::LatestArrival => true,
            ClassificationOrdering::LatestRequest => seq > previous,
        }
    }

    /// Highest sequence number admitted so far, 0 if none.
    pub fn last_applied(&self) -> u64 {
        self.applied.load(Ordering::SeqCst)
    }
}

impl Default for ClassificationGate {
    fn default() -> Self {
        Self::new(ClassificationOrdering::default())
    }
}
