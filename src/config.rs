//! Link configuration parameters
//!
//! Everything the modem driver needs from the outside world: APN
//! credentials, carrier codes, broker endpoint and MQTT topics.
//! Supplied once at boot and immutable for the process lifetime.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hard upper bound for an outbound publish payload (bytes).
pub const PUBLISH_CAPACITY: usize = 1500;

/// How the carrier code for `AT+COPS` is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorMode {
    /// Embedded SIM: the two configured codes are used, primary first.
    /// The IMSI home network differs from the serving carrier here.
    Esim,
    /// Physical SIM: the primary code is the IMSI's MCC+MNC prefix.
    Sim,
}

/// Core link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    // --- MQTT ---
    /// Topic subscribed to at the end of the init sequence
    pub subscribe_topic: String<64>,
    /// Topic used for outbound publishes
    pub publish_topic: String<64>,
    /// Maximum outbound payload size in bytes (<= PUBLISH_CAPACITY)
    pub max_publish_size: u16,
    /// MQTT broker host
    pub mqtt_broker: String<64>,
    pub mqtt_port: u16,
    pub mqtt_client_id: String<32>,
    /// Publish a reply message after every handled notification
    pub publish_reply: bool,

    // --- Packet data ---
    pub apn: String<32>,
    pub apn_user: String<32>,
    pub apn_password: String<32>,
    /// UDP endpoint opened with `AT+QIOPEN`
    pub socket_host: String<64>,
    pub socket_port: u16,

    // --- Carrier ---
    pub operator_mode: OperatorMode,
    /// Carrier code tried first (MCC+MNC)
    pub primary_operator: String<6>,
    /// Carrier code tried after one registration error
    pub fallback_operator: String<6>,

    // --- Time ---
    pub ntp_server: String<64>,

    // --- Timing ---
    /// Sleep between transport polls while a command is in flight (ms)
    pub poll_interval_ms: u32,
}

fn fixed<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    let _ = out.push_str(s);
    out
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            // MQTT
            subscribe_topic: fixed("pico/sample/sub"),
            publish_topic: fixed("pico/sample/pub"),
            max_publish_size: PUBLISH_CAPACITY as u16,
            mqtt_broker: fixed("beam.soracom.io"),
            mqtt_port: 1883,
            mqtt_client_id: fixed("SampleClient"),
            publish_reply: false,

            // Packet data
            apn: fixed("soracom.io"),
            apn_user: fixed("sora"),
            apn_password: fixed("sora"),
            socket_host: fixed("uni.soracom.io"),
            socket_port: 23080,

            // Carrier
            operator_mode: OperatorMode::Esim,
            primary_operator: fixed("44020"),  // SoftBank
            fallback_operator: fixed("44010"), // NTT docomo

            // Time
            ntp_server: fixed("ntp.nict.jp"),

            // Timing
            poll_interval_ms: 1,
        }
    }
}

fn is_operator_code(code: &str) -> bool {
    (5..=6).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_digit())
}

/// Quotes and CR would break the AT command framing.
fn is_command_safe(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b) && b != b'"')
}

impl LinkConfig {
    /// Reject values that would produce malformed commands or unbounded
    /// buffers.  Invalid ranges are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subscribe_topic.is_empty() || self.publish_topic.is_empty() {
            return Err(ConfigError::ValidationFailed("topics must not be empty"));
        }
        if self.max_publish_size == 0 || self.max_publish_size as usize > PUBLISH_CAPACITY {
            return Err(ConfigError::ValidationFailed(
                "max_publish_size must be 1..=1500",
            ));
        }
        if self.apn.is_empty() {
            return Err(ConfigError::ValidationFailed("apn must not be empty"));
        }
        if self.mqtt_client_id.is_empty() || self.mqtt_broker.is_empty() {
            return Err(ConfigError::ValidationFailed("mqtt endpoint incomplete"));
        }
        if self.mqtt_port == 0 || self.socket_port == 0 {
            return Err(ConfigError::ValidationFailed("ports must be non-zero"));
        }
        if !is_operator_code(&self.primary_operator) || !is_operator_code(&self.fallback_operator)
        {
            return Err(ConfigError::ValidationFailed(
                "operator codes must be 5-6 digits",
            ));
        }
        let fields = [
            self.subscribe_topic.as_str(),
            self.publish_topic.as_str(),
            self.mqtt_broker.as_str(),
            self.mqtt_client_id.as_str(),
            self.apn.as_str(),
            self.apn_user.as_str(),
            self.apn_password.as_str(),
            self.socket_host.as_str(),
            self.ntp_server.as_str(),
        ];
        if !fields.iter().all(|f| is_command_safe(f)) {
            return Err(ConfigError::ValidationFailed(
                "strings must be printable ASCII without quotes",
            ));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms > 100 {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms must be 1..=100",
            ));
        }
        Ok(())
    }
}
