//! Board peripheral drivers.

pub mod gpio;
pub mod indicator_led;
