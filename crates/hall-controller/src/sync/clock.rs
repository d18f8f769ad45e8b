//! Logical clock for ordering phase transitions across tasks.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A point on the logical clock. Every call to [`LogicalClock::tick`]
/// returns a value strictly greater than all earlier calls, on any task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(pub u64);

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Monotonic counter shared by the orchestrator and every participant.
#[derive(Debug, Default)]
pub struct LogicalClock {
    last: AtomicU64,
}

impl LogicalClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock and return the new tick.
    pub fn tick(&self) -> Tick {
        Tick(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Most recent tick handed out, `Tick(0)` if none.
    #[must_use]
    pub fn now(&self) -> Tick {
        Tick(self.last.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ticks_strictly_increase() {
        let clock = LogicalClock::new();
        assert_eq!(clock.now(), Tick(0));

        let a = clock.tick();
        let b = clock.tick();
        assert!(b > a);
        assert_eq!(clock.now(), b);
    }

    #[test]
    fn test_ticks_unique_across_threads() {
        let clock = Arc::new(LogicalClock::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let clock = Arc::clone(&clock);
                std::thread::spawn(move || (0..1000).map(|_| clock.tick()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for thread in threads {
            for tick in thread.join().unwrap() {
                assert!(seen.insert(tick), "duplicate tick {tick}");
            }
        }
        assert_eq!(seen.len(), 8000);
        assert_eq!(clock.now(), Tick(8000));
    }
}
