//! Port traits: the hexagonal boundary between the link logic and the board.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Modem / LinkService (domain)
//! ```
//!
//! The serial line itself is a [`Transport`](crate::link::Transport) and the
//! module reset line is an `embedded_hal::digital::OutputPin`; everything
//! else the domain needs from the outside world is declared here.

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain → timer / scheduler)
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus a blocking delay.
///
/// Every wait the driver performs (pre-delays, reset pulses, poll
/// intervals) goes through this port so host tests can run against a
/// virtual clock.
pub trait ClockPort {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;

    /// Block for `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → LEDs)
// ───────────────────────────────────────────────────────────────

/// The two LAN status LEDs on the carrier board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    LanRed,
    LanGreen,
}

pub trait IndicatorPort {
    fn set(&mut self, indicator: Indicator, on: bool);

    fn all_off(&mut self) {
        self.set(Indicator::LanRed, false);
        self.set(Indicator::LanGreen, false);
    }
}

// ───────────────────────────────────────────────────────────────
// Payload sink (driving side: domain → application)
// ───────────────────────────────────────────────────────────────

/// Receives every payload extracted from a subscription notification.
///
/// The sink is handed the indicator port so that a payload can drive
/// the same LEDs the link uses for its own status.
pub trait PayloadSink {
    fn on_payload<I: IndicatorPort>(&mut self, payload: &str, indicators: &mut I);
}
