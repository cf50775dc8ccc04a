//! Payload pipeline: outbound JSON messages and inbound notifications.
//!
//! Outbound payloads are serialised once into a bounded buffer before the
//! publish command is sent, so an oversize message is rejected up front
//! instead of being truncated on the wire.  Inbound `+QMTRECV` lines are
//! split into their four fields and the quoted payload is returned.

use serde::Serialize;

use crate::config::PUBLISH_CAPACITY;
use crate::error::PayloadError;

/// Marks the end of raw payload bytes after the `> ` prompt (Ctrl-Z).
pub const END_OF_PAYLOAD: u8 = 0x1A;

/// Prefix of a subscription notification on MQTT client 0.
pub const NOTIFICATION_PREFIX: &str = "+QMTRECV: 0";

/// `<client>,<msg_id>,"<topic>","<payload>"`
const NOTIFICATION_FIELDS: usize = 4;

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// `{"message": "..."}`
#[derive(Debug, Serialize)]
pub struct OutboundMessage<'a> {
    pub message: &'a str,
}

/// A serialised message ready to follow the send prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPayload {
    bytes: heapless::Vec<u8, PUBLISH_CAPACITY>,
}

impl PublishPayload {
    /// Copy raw bytes, refusing anything longer than `max` (itself capped
    /// at [`PUBLISH_CAPACITY`]).
    pub fn from_bytes(data: &[u8], max: usize) -> Result<Self, PayloadError> {
        let max = max.min(PUBLISH_CAPACITY);
        if data.len() > max {
            return Err(PayloadError::TooLarge {
                len: data.len(),
                max,
            });
        }
        let bytes = heapless::Vec::from_slice(data).map_err(|_| PayloadError::TooLarge {
            len: data.len(),
            max,
        })?;
        Ok(Self { bytes })
    }

    /// Serialise `message` as JSON.
    pub fn from_message<T: Serialize>(message: &T, max: usize) -> Result<Self, PayloadError> {
        let json = serde_json::to_string(message).map_err(|_| PayloadError::Serialize)?;
        Self::from_bytes(json.as_bytes(), max)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

pub fn is_notification(line: &str) -> bool {
    line.starts_with(NOTIFICATION_PREFIX)
}

/// Extract the payload of a `+QMTRECV` line with its surrounding quotes
/// removed.  Commas inside the payload are kept since only the first three
/// separators split fields.
pub fn extract_subscribe_payload(line: &str) -> Result<&str, PayloadError> {
    if !is_notification(line) {
        return Err(PayloadError::Malformed);
    }
    let quoted = line
        .splitn(NOTIFICATION_FIELDS, ',')
        .nth(NOTIFICATION_FIELDS - 1)
        .ok_or(PayloadError::Malformed)?;
    quoted
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .ok_or(PayloadError::Malformed)
}
