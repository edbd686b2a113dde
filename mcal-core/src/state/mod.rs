//! Hardware-unit lifecycle
//!
//! Every stateful driver owns one [`HwUnit`]: the current lifecycle state
//! and the configuration captured on `init`.

pub mod unit;

pub use unit::{DriverState, HwUnit, LifecycleError};
