//! Charging-power estimation engine.
//!
//! Turns periodic battery-level readings into an estimated wattage, a
//! discrete speed tier, and a time-to-full projection. No hardware power
//! telemetry is involved: everything is derived from the slope of the level
//! over a bounded sample window.
//!
//! The engine is pure and synchronous — callers pass `Instant`s in, state
//! comes out. All I/O, timers, and channel plumbing live in `charge-system`
//! and `charge-daemon`.

pub mod estimator;
pub mod window;

pub use estimator::{Estimator, EstimatorConfig};
pub use window::{Sample, SampleWindow};
