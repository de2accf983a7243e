/// All events that can reach the estimation engine.
///
/// Sources:
/// - Battery feed task → `LevelChanged`, `ChargingChanged`
/// - Sampling ticker   → `Tick`
///
/// Delivery is serialized by the daemon's event loop: the engine is never
/// re-entered concurrently, and no ordering is assumed between the two
/// feed-originated kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BatteryEvent {
    /// Battery level reading changed (fraction, nominally in `[0, 1]`;
    /// the engine clamps out-of-range sensor values).
    LevelChanged(f64),
    /// Charging flag flipped. `false` resets the engine unconditionally.
    ChargingChanged(bool),
    /// Fixed-cadence re-sample request. The ticker fires whether or not the
    /// device is charging; the engine ignores ticks while discharging.
    Tick,
}
