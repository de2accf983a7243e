use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One accepted battery-level observation. Immutable once stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Level fraction in `[0, 1]`.
    pub level: f64,
    /// Monotonic instant the reading was taken.
    pub timestamp: Instant,
}

/// Time-bounded buffer of level observations, ordered by insertion.
///
/// Insertion order is chronological order — the engine only appends with a
/// monotonically advancing `now`, so no reordering ever happens. Every append
/// prunes, which keeps all retained samples within the horizon of the newest
/// one. The window never fails; empty lookups yield `None`.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    horizon: Duration,
}

impl SampleWindow {
    pub fn new(horizon: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            horizon,
        }
    }

    /// Append a sample at the end and drop everything stale.
    pub fn append(&mut self, level: f64, now: Instant) {
        self.samples.push_back(Sample {
            level,
            timestamp: now,
        });
        self.prune(now);
    }

    /// Remove every sample older than the horizon relative to `now`.
    pub fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.samples.front() {
            if now.saturating_duration_since(oldest.timestamp) > self.horizon {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Empty the window. Called on a charging → not-charging transition.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time spanned between the oldest and newest retained sample.
    pub fn span(&self) -> Duration {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => {
                last.timestamp.saturating_duration_since(first.timestamp)
            }
            _ => Duration::ZERO,
        }
    }

    /// Swap the retention horizon (config reload). Takes effect on the next
    /// append; already-retained samples are not re-pruned without a `now`.
    pub fn set_horizon(&mut self, horizon: Duration) {
        self.horizon = horizon;
    }
}
