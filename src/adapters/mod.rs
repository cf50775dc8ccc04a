//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `lan_actuator` | PayloadSink        | LAN LEDs via IndicatorPort |
//! | `time`         | ClockPort          | ESP32 system timer       |
//! | `uart`         | Transport          | UART1 → BG770            |

pub mod lan_actuator;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;
