use crate::BatteryReading;

/// Read battery state from the Linux sysfs power-supply interface.
///
/// Returns the first battery found, or `None` if the system has no battery
/// (desktop, VM). Garbage or negative `capacity` readings clamp to an empty
/// level rather than dropping the reading.
pub fn read_battery() -> Option<BatteryReading> {
    for name in ["BAT0", "BAT1", "BAT2"] {
        let base = std::path::Path::new("/sys/class/power_supply").join(name);
        if !base.exists() {
            continue;
        }

        let capacity = std::fs::read_to_string(base.join("capacity")).ok()?;
        let status = std::fs::read_to_string(base.join("status")).ok()?;

        let percent = capacity.trim().parse::<i32>().ok()?;
        let charging = matches!(status.trim(), "Charging" | "Full");

        return Some(BatteryReading {
            level: (percent as f64 / 100.0).clamp(0.0, 1.0),
            charging,
        });
    }
    None
}
