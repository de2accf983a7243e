use chrono::{DateTime, Local, TimeZone};

/// Discrete charging-speed tier derived from the estimated power draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargeSpeed {
    /// Not charging at all.
    #[default]
    Idle,
    /// Estimated power below 10 W, or charging with no measurable level gain.
    Slow,
    /// Estimated power in 10–20 W.
    Normal,
    /// Estimated power at or above 20 W.
    Fast,
}

/// The engine's published outputs — one atomic snapshot per sampling event.
///
/// All fields are recomputed together from the same input snapshot; observers
/// never see a mix of old and new values.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedState {
    /// Whether the device is currently charging.
    pub is_charging: bool,
    /// Latest battery level as a fraction in `[0, 1]`.
    pub battery_level: f64,
    /// Estimated charging power in watts, clamped to the configured cap.
    /// An estimate derived from level deltas, not a hardware measurement.
    pub estimated_power_watt: f64,
    /// Speed tier classified from `estimated_power_watt`.
    pub charge_speed: ChargeSpeed,
    /// Projected minutes until full, clamped to the configured ceiling.
    /// Zero whenever no positive charge rate is observable.
    pub time_remaining_min: u32,
}

impl Default for DerivedState {
    fn default() -> Self {
        Self {
            is_charging: false,
            battery_level: 0.0,
            estimated_power_watt: 0.0,
            charge_speed: ChargeSpeed::Idle,
            time_remaining_min: 0,
        }
    }
}

impl DerivedState {
    /// Human-readable charge status, derived purely from the published
    /// fields — no additional state.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if !self.is_charging {
            return "On battery";
        }
        if self.battery_level >= 1.0 {
            return "Fully charged";
        }
        match self.charge_speed {
            ChargeSpeed::Idle => "Plugged in",
            ChargeSpeed::Slow => "Charging slowly",
            ChargeSpeed::Normal => "Charging",
            ChargeSpeed::Fast => "Fast charging",
        }
    }

    /// Battery level as a whole percentage (0–100), for raw display.
    #[must_use]
    pub fn percent(&self) -> u8 {
        (self.battery_level.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// Kind of charger powering a session. Not derivable from available signals,
/// so it is manually supplied or left unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChargerKind {
    #[default]
    Unknown,
    UsbA,
    UsbC,
    Wireless,
}

/// Historical record of one completed charge cycle.
///
/// Read-only downstream data: nothing in the engine produces or consumes
/// these, and no persistence exists — only static example entries.
#[derive(Debug, Clone)]
pub struct ChargingSession {
    pub date: DateTime<Local>,
    pub duration_min: u32,
    pub average_power_watt: f64,
    pub max_power_watt: f64,
    pub charger: ChargerKind,
}

impl ChargingSession {
    /// Static demo history shown until a real recording mechanism exists.
    pub fn example_history() -> Vec<Self> {
        let date = |y, m, d, h| {
            Local
                .with_ymd_and_hms(y, m, d, h, 0, 0)
                .single()
                .unwrap_or_else(Local::now)
        };
        vec![
            Self {
                date: date(2025, 6, 3, 8),
                duration_min: 95,
                average_power_watt: 17.2,
                max_power_watt: 24.5,
                charger: ChargerKind::UsbC,
            },
            Self {
                date: date(2025, 6, 2, 22),
                duration_min: 240,
                average_power_watt: 4.8,
                max_power_watt: 7.5,
                charger: ChargerKind::Wireless,
            },
            Self {
                date: date(2025, 6, 1, 13),
                duration_min: 130,
                average_power_watt: 9.1,
                max_power_watt: 12.0,
                charger: ChargerKind::Unknown,
            },
        ]
    }
}
