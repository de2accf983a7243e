use std::time::{Duration, Instant};

use charge_core::event::BatteryEvent;
use charge_core::state::{ChargeSpeed, DerivedState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::window::SampleWindow;

/// Named tunables for the estimator, per device class.
///
/// All values ship as constants-by-default but load from the `[estimator]`
/// config section so a different battery or charger ceiling needs no code
/// change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Usable battery capacity in watt-hours (12.0 ≈ a modern handset).
    pub capacity_wh: f64,
    /// Maximum sample age before it is pruned from the window.
    pub horizon_secs: u64,
    /// Cadence of the periodic re-sample tick.
    pub sample_interval_secs: u64,
    /// Minimum window span for a usable estimate; anything shorter is too
    /// noisy and the previous outputs are held.
    pub min_span_secs: u64,
    /// Powers below this classify as `Slow`.
    pub slow_watt: f64,
    /// Powers at or above this classify as `Fast`; between the two, `Normal`.
    pub fast_watt: f64,
    /// Published power ceiling — a physically plausible maximum for the
    /// device class, guarding against runaway estimates from a short window.
    pub max_power_watt: f64,
    /// Published time-to-full ceiling in minutes.
    pub max_time_remaining_min: u32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            capacity_wh: 12.0,
            horizon_secs: 15 * 60,
            sample_interval_secs: 30,
            min_span_secs: 10,
            slow_watt: 10.0,
            fast_watt: 20.0,
            max_power_watt: 40.0,
            max_time_remaining_min: 360,
        }
    }
}

impl EstimatorConfig {
    pub fn horizon(&self) -> Duration {
        Duration::from_secs(self.horizon_secs)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }
}

/// The estimation engine: owns the sample window exclusively and publishes
/// one [`DerivedState`] snapshot per handled event.
///
/// Single logical owner — [`Estimator::handle`] must be called from one
/// serialized context (the daemon's event loop). Everything here is
/// deterministic in its inputs: re-running an estimation over an unchanged
/// window yields identical outputs.
#[derive(Debug)]
pub struct Estimator {
    config: EstimatorConfig,
    window: SampleWindow,
    state: DerivedState,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        let window = SampleWindow::new(config.horizon());
        Self {
            config,
            window,
            state: DerivedState::default(),
        }
    }

    /// Latest published snapshot.
    pub fn state(&self) -> &DerivedState {
        &self.state
    }

    /// Swap tunables in place (config reload). The window and published
    /// state survive; a shorter horizon takes effect on the next sample.
    pub fn set_config(&mut self, config: EstimatorConfig) {
        self.window.set_horizon(config.horizon());
        self.config = config;
    }

    /// Serialized entry point for all three event classes.
    pub fn handle(&mut self, event: BatteryEvent, now: Instant) {
        match event {
            BatteryEvent::LevelChanged(level) => {
                // Faulty sensors can report out-of-range values; clamp
                // rather than reject.
                let level = level.clamp(0.0, 1.0);
                self.state.battery_level = level;
                if self.state.is_charging {
                    self.sample(level, now);
                } else {
                    self.recompute();
                }
            }
            BatteryEvent::ChargingChanged(true) => {
                if !self.state.is_charging {
                    debug!("charging started at {}%", self.state.percent());
                }
                self.state.is_charging = true;
                self.sample(self.state.battery_level, now);
            }
            BatteryEvent::ChargingChanged(false) => {
                if self.state.is_charging {
                    debug!("charging stopped; estimator reset");
                }
                self.reset();
            }
            BatteryEvent::Tick => {
                // The ticker never stops; its effect is gated here so timer
                // ticks and state changes cannot race at the queue boundary.
                if self.state.is_charging {
                    self.sample(self.state.battery_level, now);
                }
            }
        }
    }

    /// Unconditional reset on leaving the charging state: empty window,
    /// zeroed outputs, whatever the previous values were.
    fn reset(&mut self) {
        self.window.clear();
        self.state.is_charging = false;
        self.state.estimated_power_watt = 0.0;
        self.state.charge_speed = ChargeSpeed::Idle;
        self.state.time_remaining_min = 0;
    }

    fn sample(&mut self, level: f64, now: Instant) {
        self.window.append(level, now);
        self.recompute();
    }

    /// Recompute power, speed, and time-to-full from the current window.
    ///
    /// Every degenerate input maps to a defined output; nothing here fails:
    /// - not charging              → 0 W, idle, 0 min
    /// - fewer than 2 samples      → 0 W, *normal*, 0 min (just plugged in;
    ///   avoids flashing "idle" while data accumulates)
    /// - window span ≤ min_span    → previous outputs held, not zeroed
    /// - no measurable level gain  → 0 W, *slow*, 0 min (still connected)
    fn recompute(&mut self) {
        if !self.state.is_charging {
            self.state.estimated_power_watt = 0.0;
            self.state.charge_speed = ChargeSpeed::Idle;
            self.state.time_remaining_min = 0;
            return;
        }

        let (first, last) = match (self.window.first(), self.window.last()) {
            (Some(first), Some(last)) if self.window.len() >= 2 => (*first, *last),
            _ => {
                self.state.estimated_power_watt = 0.0;
                self.state.charge_speed = ChargeSpeed::Normal;
                self.state.time_remaining_min = 0;
                return;
            }
        };

        let dt_secs = self.window.span().as_secs_f64();
        if dt_secs <= self.config.min_span_secs as f64 {
            return; // too noisy over too short a span — hold previous outputs
        }

        let d_level = last.level - first.level;
        if d_level <= 0.0 {
            // Sensor quantization or a momentary discharge blip: detectably
            // slow, not idle — the charger is still connected.
            self.state.estimated_power_watt = 0.0;
            self.state.charge_speed = ChargeSpeed::Slow;
            self.state.time_remaining_min = 0;
            return;
        }

        let delta_per_hour = d_level / (dt_secs / 3600.0);
        let power = (self.config.capacity_wh * delta_per_hour)
            .clamp(0.0, self.config.max_power_watt);

        let remaining_level = (1.0 - self.state.battery_level).max(0.0);
        let minutes = (remaining_level / delta_per_hour * 60.0).round() as u32;

        self.state.estimated_power_watt = power;
        self.state.charge_speed = self.classify(power);
        self.state.time_remaining_min = minutes.min(self.config.max_time_remaining_min);
    }

    /// Tier the clamped power estimate by the fixed thresholds.
    fn classify(&self, watts: f64) -> ChargeSpeed {
        if watts < self.config.slow_watt {
            ChargeSpeed::Slow
        } else if watts < self.config.fast_watt {
            ChargeSpeed::Normal
        } else {
            ChargeSpeed::Fast
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    /// Estimator already charging, with `readings` applied as level changes
    /// at the given offsets from `t0`.
    fn charged_estimator(t0: Instant, readings: &[(u64, f64)]) -> Estimator {
        let mut est = Estimator::new(EstimatorConfig::default());
        if let Some(&(offset, level)) = readings.first() {
            est.handle(BatteryEvent::LevelChanged(level), t0 + secs(offset));
            est.handle(BatteryEvent::ChargingChanged(true), t0 + secs(offset));
        }
        for &(offset, level) in readings.iter().skip(1) {
            est.handle(BatteryEvent::LevelChanged(level), t0 + secs(offset));
        }
        est
    }

    #[test]
    fn default_state_is_idle_zeros() {
        let est = Estimator::new(EstimatorConfig::default());
        assert!(!est.state().is_charging);
        assert_eq!(est.state().estimated_power_watt, 0.0);
        assert_eq!(est.state().charge_speed, ChargeSpeed::Idle);
        assert_eq!(est.state().time_remaining_min, 0);
    }

    #[test]
    fn single_sample_defaults_to_normal_not_idle() {
        let t0 = Instant::now();
        let est = charged_estimator(t0, &[(0, 0.50)]);

        assert!(est.state().is_charging);
        assert_eq!(est.state().estimated_power_watt, 0.0);
        assert_eq!(est.state().charge_speed, ChargeSpeed::Normal);
        assert_eq!(est.state().time_remaining_min, 0);
    }

    #[test]
    fn ten_minute_gain_yields_power_speed_and_minutes() {
        // 0.50 → 0.55 over 600 s with 12 Wh:
        // 0.30/h rate, 3.6 W, slow, 0.45 remaining → 90 min.
        let t0 = Instant::now();
        let est = charged_estimator(t0, &[(0, 0.50), (600, 0.55)]);

        let state = est.state();
        assert!((state.estimated_power_watt - 3.6).abs() < 1e-9);
        assert_eq!(state.charge_speed, ChargeSpeed::Slow);
        assert_eq!(state.time_remaining_min, 90);
    }

    #[test]
    fn short_span_holds_previous_outputs() {
        let t0 = Instant::now();
        let mut est = charged_estimator(t0, &[(0, 0.50), (600, 0.55)]);
        let before = est.state().clone();

        // Two fresh samples only 5 s apart (old ones pruned): no-op pass.
        est.handle(BatteryEvent::ChargingChanged(false), t0 + secs(601));
        est.handle(BatteryEvent::LevelChanged(0.55), t0 + secs(602));
        est.handle(BatteryEvent::ChargingChanged(true), t0 + secs(602));
        est.handle(BatteryEvent::LevelChanged(0.56), t0 + secs(607));
        let after_short = est.state().clone();

        // Held values are whatever the last full computation produced —
        // here the post-restart "normal" default, not fresh numbers.
        assert_eq!(after_short.estimated_power_watt, 0.0);
        assert_eq!(after_short.charge_speed, ChargeSpeed::Normal);
        assert_ne!(before, after_short); // restart really did reset

        // And a tick inside the 10 s span still changes nothing.
        est.handle(BatteryEvent::Tick, t0 + secs(610));
        assert_eq!(est.state().estimated_power_watt, after_short.estimated_power_watt);
        assert_eq!(est.state().charge_speed, after_short.charge_speed);
    }

    #[test]
    fn level_drop_while_charging_reads_as_slow() {
        let t0 = Instant::now();
        let est = charged_estimator(t0, &[(0, 0.80), (60, 0.79)]);

        let state = est.state();
        assert_eq!(state.estimated_power_watt, 0.0);
        assert_eq!(state.charge_speed, ChargeSpeed::Slow);
        assert_eq!(state.time_remaining_min, 0);
    }

    #[test]
    fn flat_level_reads_as_slow() {
        let t0 = Instant::now();
        let mut est = charged_estimator(t0, &[(0, 0.80)]);
        est.handle(BatteryEvent::Tick, t0 + secs(60));

        assert_eq!(est.state().charge_speed, ChargeSpeed::Slow);
        assert_eq!(est.state().estimated_power_watt, 0.0);
    }

    #[test]
    fn power_is_clamped_to_ceiling() {
        // 0.30 gain over 120 s: 9.0/h, 108 W raw → clamped to 40, fast.
        let t0 = Instant::now();
        let est = charged_estimator(t0, &[(0, 0.10), (120, 0.40)]);

        assert_eq!(est.state().estimated_power_watt, 40.0);
        assert_eq!(est.state().charge_speed, ChargeSpeed::Fast);
    }

    #[test]
    fn time_remaining_is_clamped_to_ceiling() {
        // 0.01 gain over 720 s: 0.05/h → 0.89 remaining ≈ 1068 min raw.
        let t0 = Instant::now();
        let est = charged_estimator(t0, &[(0, 0.10), (720, 0.11)]);

        assert_eq!(est.state().time_remaining_min, 360);
    }

    #[test]
    fn speed_tier_boundaries() {
        let est = Estimator::new(EstimatorConfig::default());
        assert_eq!(est.classify(0.0), ChargeSpeed::Slow);
        assert_eq!(est.classify(9.99), ChargeSpeed::Slow);
        assert_eq!(est.classify(10.0), ChargeSpeed::Normal);
        assert_eq!(est.classify(19.99), ChargeSpeed::Normal);
        assert_eq!(est.classify(20.0), ChargeSpeed::Fast);
        assert_eq!(est.classify(40.0), ChargeSpeed::Fast);
    }

    #[test]
    fn mid_tier_power_classifies_normal() {
        // 0.15 gain over 600 s: 0.9/h → 10.8 W, squarely in the normal band.
        let t0 = Instant::now();
        let est = charged_estimator(t0, &[(0, 0.10), (600, 0.25)]);

        assert!((est.state().estimated_power_watt - 10.8).abs() < 1e-6);
        assert_eq!(est.state().charge_speed, ChargeSpeed::Normal);
    }

    #[test]
    fn unplug_resets_everything() {
        let t0 = Instant::now();
        let mut est = charged_estimator(t0, &[(0, 0.10), (120, 0.40)]);
        assert_eq!(est.state().charge_speed, ChargeSpeed::Fast);

        est.handle(BatteryEvent::ChargingChanged(false), t0 + secs(121));

        let state = est.state();
        assert!(!state.is_charging);
        assert_eq!(state.estimated_power_watt, 0.0);
        assert_eq!(state.charge_speed, ChargeSpeed::Idle);
        assert_eq!(state.time_remaining_min, 0);
        assert!(est.window.is_empty());
    }

    #[test]
    fn recompute_is_idempotent() {
        let t0 = Instant::now();
        let mut est = charged_estimator(t0, &[(0, 0.50), (600, 0.55)]);
        let first = est.state().clone();

        est.recompute();
        est.recompute();
        assert_eq!(*est.state(), first);
    }

    #[test]
    fn negative_reading_is_clamped() {
        let t0 = Instant::now();
        let mut est = Estimator::new(EstimatorConfig::default());
        est.handle(BatteryEvent::LevelChanged(-0.25), t0);

        assert_eq!(est.state().battery_level, 0.0);
    }

    #[test]
    fn tick_while_discharging_is_a_no_op() {
        let t0 = Instant::now();
        let mut est = Estimator::new(EstimatorConfig::default());
        est.handle(BatteryEvent::LevelChanged(0.40), t0);
        est.handle(BatteryEvent::Tick, t0 + secs(30));
        est.handle(BatteryEvent::Tick, t0 + secs(60));

        assert!(est.window.is_empty());
        assert_eq!(est.state().charge_speed, ChargeSpeed::Idle);
    }

    #[test]
    fn level_events_while_discharging_stay_idle() {
        let t0 = Instant::now();
        let mut est = Estimator::new(EstimatorConfig::default());
        est.handle(BatteryEvent::LevelChanged(0.40), t0);
        est.handle(BatteryEvent::LevelChanged(0.39), t0 + secs(300));

        assert_eq!(est.state().battery_level, 0.39);
        assert_eq!(est.state().charge_speed, ChargeSpeed::Idle);
        assert_eq!(est.state().estimated_power_watt, 0.0);
    }

    #[test]
    fn stale_samples_fall_out_of_the_estimate() {
        // A fast early burst ages past the 15 min horizon; only the recent
        // slow trickle should drive the numbers.
        let t0 = Instant::now();
        let est = charged_estimator(
            t0,
            &[(0, 0.10), (60, 0.20), (1000, 0.205), (1600, 0.21)],
        );

        // Window retains the 1000 s and 1600 s samples only:
        // 0.005 over 600 s → 0.03/h → 0.36 W.
        assert_eq!(est.window.len(), 2);
        assert!((est.state().estimated_power_watt - 0.36).abs() < 1e-9);
        assert_eq!(est.state().charge_speed, ChargeSpeed::Slow);
    }

    #[test]
    fn config_reload_keeps_window_and_state() {
        let t0 = Instant::now();
        let mut est = charged_estimator(t0, &[(0, 0.50), (600, 0.55)]);
        let before = est.state().clone();

        let mut cfg = EstimatorConfig::default();
        cfg.capacity_wh = 24.0;
        est.set_config(cfg);
        assert_eq!(*est.state(), before);

        // Doubled capacity doubles the estimate on the next recompute.
        est.recompute();
        assert!((est.state().estimated_power_watt - 7.2).abs() < 1e-9);
    }
}
