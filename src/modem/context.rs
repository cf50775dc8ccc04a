//! Mutable driver context threaded through every validator and step.
//!
//! `ModemContext` holds everything the init sequence learns or decides
//! while it runs: the current modem state, the captured signal quality and
//! subscriber identity, the carrier selection with its one-shot fallback,
//! and the init-sequence cursor.  It is owned by the [`Modem`](super::Modem)
//! driver and replaced wholesale on every reset.

use core::fmt;

// ---------------------------------------------------------------------------
// Modem state
// ---------------------------------------------------------------------------

/// Lifecycle state of the modem as seen by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModemState {
    /// Not powered / not yet opened.
    NotOpen,
    /// Running the init command sequence.
    Initializing,
    /// Subscribed and listening for notifications.
    Subscribed,
    /// A publish is in flight.
    Publishing,
    /// A hard failure was observed; a reset is pending.
    Error,
    /// A received payload is being handled (unsubscribed window).
    AwaitingOperation,
}

// ---------------------------------------------------------------------------
// Signal quality
// ---------------------------------------------------------------------------

/// Received signal strength in dBm, or the "unknown" sentinel 99.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalQuality(i16);

impl SignalQuality {
    /// Sentinel used by `AT+CSQ` for "not known or not detectable".
    pub const UNKNOWN_CODE: u8 = 99;
    pub const UNKNOWN: Self = Self(Self::UNKNOWN_CODE as i16);

    /// Map a raw CSQ code: 0–30 → `2*code − 113` dBm, 99 → unknown.
    /// Any other code is rejected.
    pub fn from_csq(code: u8) -> Option<Self> {
        match code {
            0..=30 => Some(Self(2 * code as i16 - 113)),
            Self::UNKNOWN_CODE => Some(Self::UNKNOWN),
            _ => None,
        }
    }

    /// dBm value, or 99 when unknown.
    pub fn value(self) -> i16 {
        self.0
    }

    pub fn is_known(self) -> bool {
        self != Self::UNKNOWN
    }
}

impl Default for SignalQuality {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{} dBm", self.0)
        } else {
            write!(f, "unknown")
        }
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Length of an IMSI.
pub const IDENTITY_LEN: usize = 15;

/// Subscriber identity (IMSI): exactly 15 decimal digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(heapless::String<IDENTITY_LEN>);

impl Identity {
    /// Accept `text` only if it is exactly 15 ASCII digits.
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != IDENTITY_LEN || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut s = heapless::String::new();
        s.push_str(text).ok()?;
        Some(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Home network code (MCC + 2-digit MNC).
    pub fn home_network(&self) -> &str {
        &self.0[..5]
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Operator selection
// ---------------------------------------------------------------------------

/// Which of the two configured carriers `AT+COPS` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatorSelection {
    #[default]
    Primary,
    Fallback,
}

impl OperatorSelection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Primary => Self::Fallback,
            Self::Fallback => Self::Primary,
        }
    }
}

// ---------------------------------------------------------------------------
// ModemContext
// ---------------------------------------------------------------------------

/// Per-init-cycle driver state.
#[derive(Debug, Clone)]
pub struct ModemContext {
    pub state: ModemState,
    /// Index of the next init-sequence step.
    pub step_index: usize,
    pub rssi: SignalQuality,
    pub imsi: Option<Identity>,
    pub operator: OperatorSelection,
    /// Set once the operator fallback has been used in this init attempt.
    pub fallback_used: bool,
}

impl ModemContext {
    /// Fresh context in the given state.
    pub fn new(state: ModemState) -> Self {
        Self {
            state,
            step_index: 0,
            rssi: SignalQuality::UNKNOWN,
            imsi: None,
            operator: OperatorSelection::Primary,
            fallback_used: false,
        }
    }
}

impl Default for ModemContext {
    fn default() -> Self {
        Self::new(ModemState::NotOpen)
    }
}
