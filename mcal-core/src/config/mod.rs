//! Configuration types
//!
//! Immutable, `const`-constructible tables supplied at integration time.
//! Each upper driver borrows its configuration on `init` and refers to
//! hardware resources by index, never by pointer.

pub mod dio;
pub mod fls;
pub mod gpt;
pub mod mcu;
pub mod port;
pub mod pwm;

pub use dio::*;
pub use fls::*;
pub use gpt::*;
pub use mcu::*;
pub use port::*;
pub use pwm::*;

/// Callback invoked from interrupt context
pub type Notification = fn();
