use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-request identifier used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId {
    seq: u64,
    uuid: uuid::Uuid,
}

impl RequestId {
    #[must_use]
    pub fn seq(self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn uuid(self) -> uuid::Uuid {
        self.uuid
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.uuid, f)
    }
}

/// Process-seeded sequence; ids are unique within a process and unpredictable across restarts.
pub(crate) struct RequestIdGenerator {
    seed: u128,
    counter: AtomicU64,
}

impl RequestIdGenerator {
    #[must_use]
    pub(crate) fn new() -> Self {
        let seed_hi = u128::from(fastrand::u64(..));
        let seed_lo = u128::from(fastrand::u64(..));
        Self {
            seed: (seed_hi << 64) | seed_lo,
            counter: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_id(&self) -> RequestId {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        RequestId {
            seq,
            uuid: uuid::Uuid::from_u128(self.seed ^ u128::from(seq)),
        }
    }
}
