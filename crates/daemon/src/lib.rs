//! Event loop for `chargemon`.
//!
//! Owns the estimator and wires together all background tasks:
//! - Battery feed (sysfs poller → level / charging-state events)
//! - Sampling ticker (fixed cadence, default 30 s)
//! - Config file watcher (live reload of estimator tunables)
//!
//! All three funnel into one `select!` loop, so the estimator is only ever
//! touched from a single serialized context. Published state goes out over a
//! `watch` channel: observers always see one atomic [`DerivedState`]
//! snapshot, never a half-updated one.

use std::path::PathBuf;
use std::time::Instant;

use charge_config::{ChargeConfig, ConfigWatcher};
use charge_core::{BatteryEvent, ChargingSession, DerivedState, Result};
use charge_engine::Estimator;
use charge_system::{spawn_monitor, BatterySource, SysfsBattery};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Read side of the published engine state. Cheap to clone; any number of
/// consumers may hold one.
pub type StateReceiver = watch::Receiver<DerivedState>;

/// Handle to a running monitor pipeline.
pub struct MonitorHandle {
    state: StateReceiver,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// A fresh receiver for the published state.
    pub fn state(&self) -> StateReceiver {
        self.state.clone()
    }

    /// Stop the pipeline. Running tasks are aborted, not drained.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

/// Start the monitor pipeline against an arbitrary battery source.
///
/// `config_path` is only used for the live-reload watcher; `config` has
/// already been loaded by the caller.
pub fn spawn<S>(config_path: PathBuf, config: ChargeConfig, source: S) -> MonitorHandle
where
    S: BatterySource + 'static,
{
    let (publisher, state) = watch::channel(DerivedState::default());
    let task = tokio::spawn(event_loop(config_path, config, source, publisher));
    MonitorHandle { state, task }
}

async fn event_loop<S>(
    config_path: PathBuf,
    config: ChargeConfig,
    source: S,
    publisher: watch::Sender<DerivedState>,
) where
    S: BatterySource + 'static,
{
    let mut estimator = Estimator::new(config.estimator.clone());
    let mut feed = spawn_monitor(source, config.poll.interval_ms);
    let (_watcher, mut reloads) = ConfigWatcher::spawn(&config_path);

    // The ticker runs whether or not the device is charging; the engine
    // gates its effect on the charging flag. Starting/stopping the timer on
    // state changes would race with event delivery — a few no-op ticks are
    // the price of keeping this loop free of that hazard.
    let mut ticker = time::interval(config.estimator.sample_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let event = tokio::select! {
            maybe = feed.recv() => match maybe {
                Some(event) => Some(event),
                None => {
                    warn!("battery feed closed; stopping");
                    break;
                }
            },
            _ = ticker.tick() => Some(BatteryEvent::Tick),
            Some(()) = reloads.recv() => {
                match charge_config::load(&config_path) {
                    Ok(cfg) => {
                        info!("Config reloaded");
                        ticker = time::interval(cfg.estimator.sample_interval());
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        estimator.set_config(cfg.estimator);
                    }
                    Err(e) => warn!("Config reload failed: {e}"),
                }
                None
            }
        };

        let Some(event) = event else { continue };
        estimator.handle(event, Instant::now());
        publisher.send_if_modified(|current| {
            if current == estimator.state() {
                false
            } else {
                *current = estimator.state().clone();
                true
            }
        });
    }
}

/// Run the daemon against the real sysfs battery until ctrl-c.
pub async fn run() -> Result<()> {
    let config_path = charge_config::default_path();
    let config = charge_config::load(&config_path).unwrap_or_default();
    let raw_percent = config.display.raw_percent;

    // No recording mechanism exists yet; the session history is static
    // example data for downstream consumers.
    for session in ChargingSession::example_history() {
        debug!(
            "session {}: {} min, avg {:.1} W, peak {:.1} W, charger {:?}",
            session.date.format("%Y-%m-%d %H:%M"),
            session.duration_min,
            session.average_power_watt,
            session.max_power_watt,
            session.charger,
        );
    }

    let handle = spawn(config_path, config, SysfsBattery);
    let mut state = handle.state();

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break; // pipeline stopped
                }
                let snapshot = state.borrow_and_update().clone();
                info!("{}", format_status(&snapshot, raw_percent));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                handle.shutdown();
                break;
            }
        }
    }

    Ok(())
}

/// One-line readout of a published snapshot.
///
/// `raw_percent` is the single external display preference: plain percentage
/// instead of the derived status / wattage readout.
fn format_status(state: &DerivedState, raw_percent: bool) -> String {
    if raw_percent {
        return format!("battery at {}%", state.percent());
    }

    let mut line = format!("{} ({}%)", state.status_label(), state.percent());
    if state.is_charging && state.estimated_power_watt > 0.0 {
        line.push_str(&format!(" — ~{:.1} W", state.estimated_power_watt));
    }
    if state.time_remaining_min > 0 {
        line.push_str(&format!(", {} to full", format_minutes(state.time_remaining_min)));
    }
    line
}

/// Format minutes into a compact human-readable string: "1h 23m" or "45m".
fn format_minutes(mins: u32) -> String {
    if mins >= 60 {
        format!("{}h {}m", mins / 60, mins % 60)
    } else {
        format!("{mins}m")
    }
}
