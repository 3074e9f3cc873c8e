//! Poll sequence numbers.
//!
//! Polls run on a fixed timer and in-flight requests are never cancelled, so
//! responses can arrive out of order. Every poll takes a number when it is
//! issued; a response is applied only if no newer poll has been issued since.

use std::sync::atomic::{AtomicU64, Ordering};

/// Issues monotonically increasing poll sequence numbers.
#[derive(Debug, Default)]
pub struct PollSequencer {
    latest_issued: AtomicU64,
}

impl PollSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a new poll. The first poll gets `1`.
    pub fn issue(&self) -> u64 {
        self.latest_issued.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// The most recently issued number, `0` before the first poll.
    pub fn latest_issued(&self) -> u64 {
        self.latest_issued.load(Ordering::Acquire)
    }

    /// Whether a response tagged `seq` may be applied.
    ///
    /// Only the latest issued poll qualifies. A response that was overtaken
    /// by a newer issued poll is stale even if nothing newer has arrived yet.
    pub fn should_apply(&self, seq: u64) -> bool {
        seq != 0 && seq == self.latest_issued()
    }
}
