//! Monotonic identifier source

use chrono::Utc;

/// Hands out strictly increasing ids.
///
/// Each id is the current Unix time in milliseconds, bumped past the
/// previous id when the clock has not advanced (or went backwards).
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    last: u64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(self.last.saturating_add(1));
        self.last = id;
        id
    }
}
