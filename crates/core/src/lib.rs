pub mod error;
pub mod event;
pub mod state;

pub use error::{ChargeError, Result};
pub use event::BatteryEvent;
pub use state::{ChargeSpeed, ChargerKind, ChargingSession, DerivedState};
