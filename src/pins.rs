//! GPIO / peripheral pin assignments for the CK-1540-01 carrier board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// LTE module (BG770) UART
// ---------------------------------------------------------------------------

/// UART peripheral wired to the LTE module.
pub const LTE_UART_PORT: i32 = 1;
pub const LTE_UART_BAUD: u32 = 115_200;
/// ESP32 RX ← module TX.
pub const LTE_UART_RX_GPIO: i32 = 34;
/// ESP32 TX → module RX.
pub const LTE_UART_TX_GPIO: i32 = 15;
/// Driver-side receive ring buffer (bytes).
pub const LTE_UART_RX_BUFFER: i32 = 2048;

// ---------------------------------------------------------------------------
// LTE module control
// ---------------------------------------------------------------------------

/// Module RESET_N through an inverting transistor stage: driving LOW holds
/// the module in reset.
pub const LTE_RESET_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// LAN status LEDs (active LOW)
// ---------------------------------------------------------------------------

pub const LAN_LED_GREEN_GPIO: i32 = 32;
pub const LAN_LED_RED_GPIO: i32 = 27;
