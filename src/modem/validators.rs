//! Response validators: one rule per command family.
//!
//! Every validator sees one response line at a time together with its
//! 1-based occurrence number and returns a [`Verdict`].  Validators that
//! extract data (identity, signal quality) write it into the
//! [`ModemContext`].  Anything not explicitly accepted is `Fail`.
//!
//! Shapes with `ATV0` numeric result codes:
//!
//! | Command        | Response                                   |
//! |----------------|--------------------------------------------|
//! | `AT+CPIN?`     | `+CPIN: READY` · `0`                       |
//! | `AT+CIMI`      | `<15-digit IMSI>` · `0`                    |
//! | `AT+CSQ`       | `+CSQ: <rssi>,<ber>` · `0`                 |
//! | `AT+QMTOPEN`   | `0` · `+QMTOPEN: 0,0`                      |
//! | `AT+QMTUNS`    | `0` · `+QMTUNS: 0,1,0` (notifications skipped) |
//! | `AT+QMTPUB`    | `> ` · `0` · `+QMTPUB: 0,1,0`              |
//! | `AT+QPOWD`     | `OK` · `POWERED DOWN`                      |

use log::{info, warn};

use super::Verdict;
use super::context::{Identity, ModemContext, SignalQuality};
use super::payload::is_notification;

/// Numeric result code for `OK`.
pub const ZERO_STATUS: &str = "0";
pub const BOOT_BANNER: &str = "APP RDY";
pub const POWER_DOWN_BANNER: &str = "NORMAL POWER DOWN";
pub const POWERED_DOWN: &str = "POWERED DOWN";
pub const SIM_READY: &str = "+CPIN: READY";
pub const SEND_PROMPT: &str = crate::link::lines::SEND_PROMPT;

pub const ACK_SOCKET_OPEN: &str = "+QIOPEN: 0,0";
pub const ACK_MQTT_OPEN: &str = "+QMTOPEN: 0,0";
pub const ACK_MQTT_CONNECT: &str = "+QMTCONN: 0,0,0";
pub const ACK_SUBSCRIBE: &str = "+QMTSUB: 0,1,0,1";
pub const ACK_UNSUBSCRIBE: &str = "+QMTUNS: 0,1,0";
pub const ACK_PUBLISH: &str = "+QMTPUB: 0,1,0";
pub const ACK_TIME_SYNC_PREFIX: &str = "+QNTP: 0,";

/// Single `0`.
pub fn generic_ok(line: &str, occurrence: u16, _ctx: &mut ModemContext) -> Verdict {
    if occurrence == 1 && line == ZERO_STATUS {
        Verdict::Success
    } else {
        Verdict::Fail
    }
}

/// Boot banner wait.  No occurrence bound: the modem prints assorted
/// start-up lines before `APP RDY`.
pub fn ready(line: &str, _occurrence: u16, _ctx: &mut ModemContext) -> Verdict {
    match line {
        BOOT_BANNER => Verdict::Success,
        POWER_DOWN_BANNER => Verdict::Fail,
        _ => Verdict::InProgress,
    }
}

/// `ATE0;V0;+CMEE=0`: echo is still on for the first line, so an echoed
/// command is tolerated once before the `0`.
pub fn setup(line: &str, occurrence: u16, _ctx: &mut ModemContext) -> Verdict {
    match (occurrence, line) {
        (1..=2, ZERO_STATUS) => Verdict::Success,
        (1..=2, _) => Verdict::InProgress,
        _ => Verdict::Fail,
    }
}

pub fn sim_status(line: &str, occurrence: u16, _ctx: &mut ModemContext) -> Verdict {
    match (occurrence, line) {
        (1, SIM_READY) => Verdict::InProgress,
        (2, ZERO_STATUS) => Verdict::Success,
        _ => Verdict::Fail,
    }
}

pub fn identity(line: &str, occurrence: u16, ctx: &mut ModemContext) -> Verdict {
    match occurrence {
        1 => match Identity::parse(line) {
            Some(id) => {
                info!("MODEM: IMSI [{}]", id);
                ctx.imsi = Some(id);
                Verdict::InProgress
            }
            None => Verdict::Fail,
        },
        2 if line == ZERO_STATUS => Verdict::Success,
        _ => Verdict::Fail,
    }
}

/// Parse the `<rssi>` code of `+CSQ: <rssi>,<ber>`.
/// `None` unless the code is followed by a comma and is 0–30 or 99.
fn parse_csq(line: &str) -> Option<SignalQuality> {
    let rest = line.strip_prefix("+CSQ:")?.trim_start();
    let (code, _ber) = rest.split_once(',')?;
    SignalQuality::from_csq(code.parse().ok()?)
}

pub fn signal_quality(line: &str, occurrence: u16, ctx: &mut ModemContext) -> Verdict {
    match occurrence {
        1 if line.starts_with("+CSQ:") => {
            // A malformed reading keeps waiting; the step then resolves on
            // its timeout rather than failing here.
            if let Some(q) = parse_csq(line) {
                info!("MODEM: RSSI {}", q);
                ctx.rssi = q;
            }
            Verdict::InProgress
        }
        2 if line == ZERO_STATUS => Verdict::Success,
        _ => Verdict::Fail,
    }
}

/// `AT+COPS`: any rejection is reported as a registration error so the
/// sequence driver can switch carrier.
pub fn registration(line: &str, occurrence: u16, _ctx: &mut ModemContext) -> Verdict {
    if occurrence == 1 && line == ZERO_STATUS {
        Verdict::Success
    } else {
        Verdict::RegistrationError
    }
}

/// `0` then a structured acknowledgement line.
pub fn acknowledged(line: &str, occurrence: u16, ack: &str) -> Verdict {
    match occurrence {
        1 if line == ZERO_STATUS => Verdict::InProgress,
        2 if line == ack => Verdict::Success,
        _ => Verdict::Fail,
    }
}

/// `AT+QMTUNS`: a notification already in flight may land between the
/// `0` and the ack.  It is dropped; the subscription is renewed right
/// after.
pub fn unsubscribe(line: &str, occurrence: u16, _ctx: &mut ModemContext) -> Verdict {
    if is_notification(line) {
        warn!("MODEM: notification dropped during unsubscribe: [{}]", line);
        return Verdict::InProgress;
    }
    match line {
        ZERO_STATUS if occurrence == 1 => Verdict::InProgress,
        ACK_UNSUBSCRIBE => Verdict::Success,
        _ => Verdict::Fail,
    }
}

pub fn publish(line: &str, occurrence: u16, _ctx: &mut ModemContext) -> Verdict {
    match (occurrence, line) {
        (1, SEND_PROMPT) => Verdict::RequestPayloadSend,
        (2, ZERO_STATUS) => Verdict::InProgress,
        (3, ACK_PUBLISH) => Verdict::Success,
        _ => Verdict::Fail,
    }
}

pub fn power_down(line: &str, occurrence: u16, _ctx: &mut ModemContext) -> Verdict {
    match (occurrence, line) {
        (1, "OK") => Verdict::InProgress,
        (2, POWERED_DOWN) => Verdict::Success,
        _ => Verdict::Fail,
    }
}

pub fn time_sync(line: &str, occurrence: u16, _ctx: &mut ModemContext) -> Verdict {
    match occurrence {
        1 if line == ZERO_STATUS => Verdict::InProgress,
        2 if line.starts_with(ACK_TIME_SYNC_PREFIX) => Verdict::Success,
        _ => Verdict::Fail,
    }
}
