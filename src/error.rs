//! Unified error types for the LTE link firmware.
//!
//! Every failure the modem driver can observe funnels into [`ModemError`].
//! Callers of the driver only ever see a [`Verdict`](crate::modem::Verdict);
//! the error is recorded on the driver so the cause of the last reset can be
//! logged and inspected.  All variants are `Copy`.

use core::fmt;

// ---------------------------------------------------------------------------
// Modem errors
// ---------------------------------------------------------------------------

/// Why a command (or the whole init attempt) failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemError {
    /// No decisive response arrived within the command's time budget.
    Timeout,
    /// A response line never matched any expected pattern.
    ProtocolMismatch,
    /// Operator registration was rejected; tolerated once per init attempt.
    RecoverableRegistrationError,
    /// Anything else, including a second registration error in one attempt.
    HardFailure,
    /// The serial transport reported an I/O error.
    Transport,
    /// A rendered command did not fit the fixed command buffer.
    CommandTooLong,
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::ProtocolMismatch => write!(f, "protocol mismatch"),
            Self::RecoverableRegistrationError => write!(f, "operator registration rejected"),
            Self::HardFailure => write!(f, "hard failure"),
            Self::Transport => write!(f, "transport I/O error"),
            Self::CommandTooLong => write!(f, "command exceeds buffer"),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// The serialised message exceeds the configured maximum payload size.
    TooLarge { len: usize, max: usize },
    /// The message could not be serialised.
    Serialize,
    /// A notification line did not have the expected field layout.
    Malformed,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { len, max } => write!(f, "payload too large ({len} > {max} bytes)"),
            Self::Serialize => write!(f, "payload serialisation failed"),
            Self::Malformed => write!(f, "malformed notification"),
        }
    }
}

impl From<PayloadError> for ModemError {
    fn from(e: PayloadError) -> Self {
        match e {
            PayloadError::Malformed => Self::ProtocolMismatch,
            PayloadError::TooLarge { .. } | PayloadError::Serialize => Self::HardFailure,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from [`LinkConfig::validate`](crate::config::LinkConfig::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` names the field and the rule.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl core::error::Error for ModemError {}
impl core::error::Error for PayloadError {}
impl core::error::Error for ConfigError {}
