//! Command catalogue and the init sequence table.
//!
//! A [`CommandStep`] is a `(command, timeout, pre-delay)` triple; the
//! command text itself is rendered on demand from the link configuration
//! and the current context, since `AT+COPS` depends on the carrier
//! selection and the IMSI learned earlier in the same init cycle.

use core::fmt::Write;
use core::time::Duration;

use super::Verdict;
use super::context::{ModemContext, OperatorSelection};
use super::validators;
use crate::config::{LinkConfig, OperatorMode};
use crate::error::ModemError;

/// Longest rendered command line (without the trailing CR).
pub const COMMAND_CAPACITY: usize = 160;

/// A rendered command line.
pub type CommandLine = heapless::String<COMMAND_CAPACITY>;

/// Every command the driver knows how to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Nothing is sent; wait for the boot banner.
    AwaitBoot,
    /// `ATE0;V0;+CMEE=0`: echo off, numeric result codes.
    Setup,
    SimStatus,
    Identity,
    DefinePdp,
    Register,
    SignalQuality,
    ConfigureApn,
    ActivatePdp,
    DeactivatePdp,
    OpenSocket,
    MqttOpen,
    MqttConnect,
    Subscribe,
    Unsubscribe,
    Publish,
    TimeSync,
    PowerDown,
}

impl CommandKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::AwaitBoot => "boot",
            Self::Setup => "setup",
            Self::SimStatus => "sim-status",
            Self::Identity => "imsi",
            Self::DefinePdp => "define-pdp",
            Self::Register => "register",
            Self::SignalQuality => "csq",
            Self::ConfigureApn => "configure-apn",
            Self::ActivatePdp => "activate-pdp",
            Self::DeactivatePdp => "deactivate-pdp",
            Self::OpenSocket => "socket-open",
            Self::MqttOpen => "mqtt-open",
            Self::MqttConnect => "mqtt-connect",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Publish => "publish",
            Self::TimeSync => "ntp",
            Self::PowerDown => "power-down",
        }
    }

    /// Render the command text, or `None` for a wait-only step.
    pub fn render(
        self,
        cfg: &LinkConfig,
        ctx: &ModemContext,
    ) -> Result<Option<CommandLine>, ModemError> {
        let mut cmd = CommandLine::new();
        let written = match self {
            Self::AwaitBoot => return Ok(None),
            Self::Setup => cmd.write_str("ATE0;V0;+CMEE=0"),
            Self::SimStatus => cmd.write_str("AT+CPIN?"),
            Self::Identity => cmd.write_str("AT+CIMI"),
            Self::DefinePdp => write!(cmd, "AT+CGDCONT=1,\"IP\",\"{}\"", cfg.apn),
            Self::Register => write!(cmd, "AT+COPS=1,2,\"{}\",8", operator_code(cfg, ctx)),
            Self::SignalQuality => cmd.write_str("AT+CSQ"),
            Self::ConfigureApn => write!(
                cmd,
                "AT+QICSGP=1,1,\"{}\",\"{}\",\"{}\",2",
                cfg.apn, cfg.apn_user, cfg.apn_password
            ),
            Self::ActivatePdp => cmd.write_str("AT+QIACT=1"),
            Self::DeactivatePdp => cmd.write_str("AT+QIDEACT=1"),
            Self::OpenSocket => write!(
                cmd,
                "AT+QIOPEN=1,0,\"UDP\",\"{}\",{}",
                cfg.socket_host, cfg.socket_port
            ),
            Self::MqttOpen => write!(
                cmd,
                "AT+QMTOPEN=0,\"{}\",{}",
                cfg.mqtt_broker, cfg.mqtt_port
            ),
            Self::MqttConnect => write!(cmd, "AT+QMTCONN=0,\"{}\"", cfg.mqtt_client_id),
            Self::Subscribe => write!(cmd, "AT+QMTSUB=0,1,\"{}\",1", cfg.subscribe_topic),
            Self::Unsubscribe => write!(cmd, "AT+QMTUNS=0,1,\"{}\"", cfg.subscribe_topic),
            Self::Publish => write!(cmd, "AT+QMTPUB=0,1,1,0,\"{}\"", cfg.publish_topic),
            Self::TimeSync => write!(cmd, "AT+QNTP=1,\"{}\",123", cfg.ntp_server),
            Self::PowerDown => cmd.write_str("AT+QPOWD=0"),
        };
        written.map_err(|_| ModemError::CommandTooLong)?;
        Ok(Some(cmd))
    }

    /// Judge one response line for this command.
    pub fn validate(self, line: &str, occurrence: u16, ctx: &mut ModemContext) -> Verdict {
        use validators::*;
        match self {
            Self::AwaitBoot => ready(line, occurrence, ctx),
            Self::Setup => setup(line, occurrence, ctx),
            Self::SimStatus => sim_status(line, occurrence, ctx),
            Self::Identity => identity(line, occurrence, ctx),
            Self::Register => registration(line, occurrence, ctx),
            Self::SignalQuality => signal_quality(line, occurrence, ctx),
            Self::DefinePdp
            | Self::ConfigureApn
            | Self::ActivatePdp
            | Self::DeactivatePdp => generic_ok(line, occurrence, ctx),
            Self::OpenSocket => acknowledged(line, occurrence, ACK_SOCKET_OPEN),
            Self::MqttOpen => acknowledged(line, occurrence, ACK_MQTT_OPEN),
            Self::MqttConnect => acknowledged(line, occurrence, ACK_MQTT_CONNECT),
            Self::Subscribe => acknowledged(line, occurrence, ACK_SUBSCRIBE),
            Self::Unsubscribe => unsubscribe(line, occurrence, ctx),
            Self::Publish => publish(line, occurrence, ctx),
            Self::TimeSync => time_sync(line, occurrence, ctx),
            Self::PowerDown => power_down(line, occurrence, ctx),
        }
    }
}

/// Carrier code for `AT+COPS`.
///
/// In SIM mode the primary carrier is the IMSI home network; before the
/// IMSI is known the configured primary code stands in.
fn operator_code<'a>(cfg: &'a LinkConfig, ctx: &'a ModemContext) -> &'a str {
    match (ctx.operator, cfg.operator_mode) {
        (OperatorSelection::Fallback, _) => cfg.fallback_operator.as_str(),
        (OperatorSelection::Primary, OperatorMode::Esim) => cfg.primary_operator.as_str(),
        (OperatorSelection::Primary, OperatorMode::Sim) => ctx
            .imsi
            .as_ref()
            .map_or(cfg.primary_operator.as_str(), |id| id.home_network()),
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStep {
    pub kind: CommandKind,
    pub timeout: Duration,
    /// Quiet time before the command is written.
    pub pre_delay: Duration,
}

impl CommandStep {
    pub const fn new(kind: CommandKind, timeout_ms: u64) -> Self {
        Self {
            kind,
            timeout: Duration::from_millis(timeout_ms),
            pre_delay: Duration::ZERO,
        }
    }

    pub const fn with_pre_delay(self, ms: u64) -> Self {
        Self {
            pre_delay: Duration::from_millis(ms),
            ..self
        }
    }
}

const NETWORK_TIMEOUT_MS: u64 = 180_000;

/// Ordered init sequence.  The end of the slice is the terminator: once
/// the cursor runs past the last entry the modem is subscribed.
pub const INIT_SEQUENCE: &[CommandStep] = &[
    CommandStep::new(CommandKind::AwaitBoot, 10_000),
    CommandStep::new(CommandKind::Setup, 300),
    CommandStep::new(CommandKind::SimStatus, 300),
    CommandStep::new(CommandKind::Identity, 300),
    CommandStep::new(CommandKind::DefinePdp, 300),
    CommandStep::new(CommandKind::Register, NETWORK_TIMEOUT_MS),
    CommandStep::new(CommandKind::SignalQuality, 1_000).with_pre_delay(5_000),
    CommandStep::new(CommandKind::ConfigureApn, 300),
    CommandStep::new(CommandKind::ActivatePdp, 150_000),
    CommandStep::new(CommandKind::OpenSocket, NETWORK_TIMEOUT_MS),
    CommandStep::new(CommandKind::MqttOpen, NETWORK_TIMEOUT_MS),
    CommandStep::new(CommandKind::MqttConnect, NETWORK_TIMEOUT_MS),
    CommandStep::new(CommandKind::Subscribe, NETWORK_TIMEOUT_MS),
];

pub const SUBSCRIBE: CommandStep = CommandStep::new(CommandKind::Subscribe, NETWORK_TIMEOUT_MS);
pub const UNSUBSCRIBE: CommandStep = CommandStep::new(CommandKind::Unsubscribe, NETWORK_TIMEOUT_MS);
pub const PUBLISH: CommandStep = CommandStep::new(CommandKind::Publish, NETWORK_TIMEOUT_MS);
pub const TIME_SYNC: CommandStep = CommandStep::new(CommandKind::TimeSync, NETWORK_TIMEOUT_MS);
pub const DEACTIVATE_PDP: CommandStep = CommandStep::new(CommandKind::DeactivatePdp, 40_000);
pub const POWER_DOWN: CommandStep = CommandStep::new(CommandKind::PowerDown, NETWORK_TIMEOUT_MS);
