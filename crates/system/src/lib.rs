pub mod sysfs;

use std::time::Duration;

use charge_core::event::BatteryEvent;
use tokio::sync::mpsc;
use tokio::time;
use tracing::info;

/// One observation of the host battery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    /// Level fraction in `[0, 1]`.
    pub level: f64,
    /// Whether the device reports charging (or full-on-charger).
    pub charging: bool,
}

/// Capability interface over the host battery subsystem.
///
/// The daemon only ever needs the current level and charging flag; putting
/// that behind a trait lets tests drive the whole pipeline with scripted
/// readings instead of real hardware.
pub trait BatterySource: Send {
    /// Current reading, or `None` when no battery is present / readable.
    fn read(&mut self) -> Option<BatteryReading>;
}

/// Battery source backed by `/sys/class/power_supply`.
#[derive(Debug, Default)]
pub struct SysfsBattery;

impl BatterySource for SysfsBattery {
    fn read(&mut self) -> Option<BatteryReading> {
        sysfs::read_battery()
    }
}

/// Spawn a background Tokio task that polls `source` every `interval_ms`
/// milliseconds and forwards change events through the returned channel.
///
/// The first reading is delivered in full; afterwards only deltas are sent.
/// `LevelChanged` always precedes `ChargingChanged` for the same reading so
/// a charging transition arrives with a current level already applied (the
/// engine assumes no order, this just improves its first estimate).
///
/// The task stops automatically when the receiver is dropped.
pub fn spawn_monitor<S>(mut source: S, interval_ms: u64) -> mpsc::Receiver<BatteryEvent>
where
    S: BatterySource + 'static,
{
    let (tx, rx) = mpsc::channel(8);
    let interval = Duration::from_millis(interval_ms);

    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        let mut previous: Option<BatteryReading> = None;

        loop {
            ticker.tick().await;

            let Some(reading) = source.read() else {
                continue; // no battery right now; keep polling
            };

            if previous.is_none() {
                info!(
                    "battery detected: {:.0}%, {}",
                    reading.level * 100.0,
                    if reading.charging { "charging" } else { "discharging" }
                );
            }

            for event in diff_events(previous, reading) {
                if tx.send(event).await.is_err() {
                    return; // all receivers dropped
                }
            }
            previous = Some(reading);
        }
    });

    rx
}

/// Events needed to bring a consumer from `previous` to `next`.
fn diff_events(previous: Option<BatteryReading>, next: BatteryReading) -> Vec<BatteryEvent> {
    let mut events = Vec::with_capacity(2);
    match previous {
        None => {
            events.push(BatteryEvent::LevelChanged(next.level));
            events.push(BatteryEvent::ChargingChanged(next.charging));
        }
        Some(prev) => {
            if prev.level != next.level {
                events.push(BatteryEvent::LevelChanged(next.level));
            }
            if prev.charging != next.charging {
                events.push(BatteryEvent::ChargingChanged(next.charging));
            }
        }
    }
    events
}
