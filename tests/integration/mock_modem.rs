//! Scripted BG770 simulator and mock board adapters for integration tests.
//!
//! [`ModemSim`] plays the module side of the UART: every command line the
//! driver writes is matched against a reply script and the scripted lines
//! are queued for reading.  [`SimResetPin`] is wired to the same simulator
//! so releasing the reset line reboots it and queues the boot banner.
//! Time is virtual: [`VirtualClock`] only advances when the driver sleeps.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};
use ltebridge::app::ports::{ClockPort, Indicator, IndicatorPort, PayloadSink};
use ltebridge::app::service::LinkService;
use ltebridge::config::LinkConfig;
use ltebridge::link::Transport;
use ltebridge::modem::Modem;

/// Script key for the bytes written after the send prompt.
pub const PAYLOAD: &str = "<payload>";

pub const IMSI: &str = "440103123456789";

// ── Modem simulator ───────────────────────────────────────────

struct Reply {
    lines: Vec<String>,
    sticky: bool,
}

struct Rule {
    prefix: String,
    replies: VecDeque<Reply>,
}

#[derive(Default)]
struct SimState {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    in_payload: bool,
    rules: Vec<Rule>,
    commands: Vec<String>,
    payloads: Vec<Vec<u8>>,
    boots: u32,
    auto_boot: bool,
    fail_io: bool,
}

impl SimState {
    fn queue_line(&mut self, line: &str) {
        self.rx.extend(b"\r\n");
        self.rx.extend(line.as_bytes());
        // The send prompt is never terminated.
        if line != "> " {
            self.rx.extend(b"\r\n");
        }
    }

    fn reply_to(&mut self, key: &str) {
        let Some(rule) = self.rules.iter_mut().find(|r| key.starts_with(&r.prefix)) else {
            self.queue_line("4");
            return;
        };
        let lines = match rule.replies.front() {
            Some(reply) if reply.sticky => reply.lines.clone(),
            Some(_) => rule.replies.pop_front().map(|r| r.lines).unwrap_or_default(),
            None => return,
        };
        for line in &lines {
            self.queue_line(line);
        }
        if lines.last().map(String::as_str) == Some("> ") {
            self.in_payload = true;
        }
    }

    fn receive(&mut self, byte: u8) {
        if self.in_payload {
            if byte == 0x1A {
                let payload = std::mem::take(&mut self.tx);
                self.payloads.push(payload);
                self.in_payload = false;
                self.reply_to(PAYLOAD);
            } else {
                self.tx.push(byte);
            }
            return;
        }
        if byte == b'\r' {
            let cmd = String::from_utf8_lossy(&self.tx).into_owned();
            self.tx.clear();
            self.commands.push(cmd.clone());
            self.reply_to(&cmd);
        } else {
            self.tx.push(byte);
        }
    }
}

/// Shared handle to the simulated module.
#[derive(Clone, Default)]
pub struct ModemSim(Rc<RefCell<SimState>>);

#[allow(dead_code)]
impl ModemSim {
    /// A module that answers the whole init sequence and every
    /// steady-state command successfully.
    pub fn healthy() -> Self {
        let sim = Self::default();
        sim.0.borrow_mut().auto_boot = true;
        sim.respond("ATE0", &["ATE0;V0;+CMEE=0", "0"]);
        sim.respond("AT+CPIN?", &["+CPIN: READY", "0"]);
        sim.respond("AT+CIMI", &[IMSI, "0"]);
        sim.respond("AT+CGDCONT", &["0"]);
        sim.respond("AT+COPS", &["0"]);
        sim.respond("AT+CSQ", &["+CSQ: 15,99", "0"]);
        sim.respond("AT+QICSGP", &["0"]);
        sim.respond("AT+QIACT", &["0"]);
        sim.respond("AT+QIDEACT", &["0"]);
        sim.respond("AT+QIOPEN", &["0", "+QIOPEN: 0,0"]);
        sim.respond("AT+QMTOPEN", &["0", "+QMTOPEN: 0,0"]);
        sim.respond("AT+QMTCONN", &["0", "+QMTCONN: 0,0,0"]);
        sim.respond("AT+QMTSUB", &["0", "+QMTSUB: 0,1,0,1"]);
        sim.respond("AT+QMTUNS", &["0", "+QMTUNS: 0,1,0"]);
        sim.respond("AT+QMTPUB", &["> "]);
        sim.respond(PAYLOAD, &["0", "+QMTPUB: 0,1,0"]);
        sim.respond("AT+QNTP", &["0", "+QNTP: 0,\"2026/10/18,09:00:00+36\""]);
        sim.respond("AT+QPOWD", &["OK", "POWERED DOWN"]);
        sim
    }

    /// Answer every command starting with `prefix` with `lines`.
    /// Replaces any previous script for that prefix.
    pub fn respond(&self, prefix: &str, lines: &[&str]) {
        let reply = Reply {
            lines: lines.iter().map(|l| (*l).to_owned()).collect(),
            sticky: true,
        };
        let mut s = self.0.borrow_mut();
        match s.rules.iter_mut().find(|r| r.prefix == prefix) {
            Some(rule) => {
                rule.replies.clear();
                rule.replies.push_back(reply);
            }
            None => s.rules.push(Rule {
                prefix: prefix.to_owned(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    /// Answer the next command starting with `prefix` with `lines`, then
    /// fall back to the existing script.
    pub fn respond_once(&self, prefix: &str, lines: &[&str]) {
        let reply = Reply {
            lines: lines.iter().map(|l| (*l).to_owned()).collect(),
            sticky: false,
        };
        let mut s = self.0.borrow_mut();
        match s.rules.iter_mut().find(|r| r.prefix == prefix) {
            Some(rule) => rule.replies.push_front(reply),
            None => s.rules.push(Rule {
                prefix: prefix.to_owned(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    /// Stop answering commands starting with `prefix`.
    pub fn silence(&self, prefix: &str) {
        self.respond(prefix, &[]);
    }

    /// Queue an unsolicited line (e.g. a `+QMTRECV` notification).
    pub fn push_line(&self, line: &str) {
        self.0.borrow_mut().queue_line(line);
    }

    pub fn push_notification(&self, topic: &str, payload: &str) {
        self.push_line(&format!("+QMTRECV: 0,1,\"{topic}\",\"{payload}\""));
    }

    /// Module reboot: drop pending output and print the boot banner.
    pub fn boot(&self) {
        let mut s = self.0.borrow_mut();
        s.boots += 1;
        s.rx.clear();
        s.tx.clear();
        s.in_payload = false;
        s.queue_line("RDY");
        s.queue_line("APP RDY");
    }

    pub fn set_auto_boot(&self, on: bool) {
        self.0.borrow_mut().auto_boot = on;
    }

    pub fn set_fail_io(&self, on: bool) {
        self.0.borrow_mut().fail_io = on;
    }

    pub fn commands(&self) -> Vec<String> {
        self.0.borrow().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.0.borrow_mut().commands.clear();
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.0.borrow().payloads.clone()
    }

    pub fn boots(&self) -> u32 {
        self.0.borrow().boots
    }

    pub fn sent(&self, prefix: &str) -> usize {
        self.0
            .borrow()
            .commands
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[derive(Debug)]
pub struct SimIoError;

impl Transport for ModemSim {
    type Error = SimIoError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut s = self.0.borrow_mut();
        if s.fail_io {
            return Err(SimIoError);
        }
        let n = buf.len().min(s.rx.len());
        for slot in buf.iter_mut().take(n) {
            *slot = s.rx.pop_front().unwrap_or_default();
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let mut s = self.0.borrow_mut();
        if s.fail_io {
            return Err(SimIoError);
        }
        for &b in data {
            s.receive(b);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

// ── Virtual clock ─────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct VirtualClock(Rc<Cell<u64>>);

impl VirtualClock {
    pub fn now(&self) -> u64 {
        self.0.get()
    }
}

impl ClockPort for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.0.set(self.0.get() + u64::from(ms));
    }
}

// ── Reset line ────────────────────────────────────────────────

/// Reset line wired to the simulator.  Each edge is recorded with the
/// virtual time it happened at.
#[derive(Clone)]
pub struct SimResetPin {
    sim: ModemSim,
    clock: VirtualClock,
    pub edges: Rc<RefCell<Vec<(bool, u64)>>>,
}

impl SimResetPin {
    pub fn new(sim: ModemSim, clock: VirtualClock) -> Self {
        Self {
            sim,
            clock,
            edges: Rc::default(),
        }
    }

    /// `(low_at, high_at)` for every completed pulse.
    pub fn pulses(&self) -> Vec<(u64, u64)> {
        let edges = self.edges.borrow();
        edges
            .windows(2)
            .filter(|w| !w[0].0 && w[1].0)
            .map(|w| (w[0].1, w[1].1))
            .collect()
    }
}

impl ErrorType for SimResetPin {
    type Error = Infallible;
}

impl OutputPin for SimResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.edges.borrow_mut().push((false, self.clock.now()));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let released = self.edges.borrow().last().is_some_and(|e| !e.0);
        self.edges.borrow_mut().push((true, self.clock.now()));
        if released && self.sim.0.borrow().auto_boot {
            self.sim.boot();
        }
        Ok(())
    }
}

// ── Indicators ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingLeds {
    pub red: bool,
    pub green: bool,
    pub history: Vec<(Indicator, bool)>,
}

#[allow(dead_code)]
impl RecordingLeds {
    /// Number of times the red LED was switched on.
    pub fn red_flashes(&self) -> usize {
        self.history
            .iter()
            .filter(|(i, on)| *i == Indicator::LanRed && *on)
            .count()
    }
}

impl IndicatorPort for RecordingLeds {
    fn set(&mut self, indicator: Indicator, on: bool) {
        match indicator {
            Indicator::LanRed => self.red = on,
            Indicator::LanGreen => self.green = on,
        }
        self.history.push((indicator, on));
    }
}

// ── Payload sink ──────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub payloads: Vec<String>,
}

impl PayloadSink for RecordingSink {
    fn on_payload<I: IndicatorPort>(&mut self, payload: &str, _indicators: &mut I) {
        self.payloads.push(payload.to_owned());
    }
}

// ── Fixture ───────────────────────────────────────────────────

pub type SimModem = Modem<ModemSim, SimResetPin, VirtualClock, RecordingLeds>;
pub type SimService = LinkService<ModemSim, SimResetPin, VirtualClock, RecordingLeds>;

pub struct Rig {
    pub sim: ModemSim,
    pub clock: VirtualClock,
    pub pin: SimResetPin,
}

/// Host-friendly config: coarser polling keeps long timeouts cheap.
pub fn test_config() -> LinkConfig {
    LinkConfig {
        poll_interval_ms: 10,
        ..LinkConfig::default()
    }
}

pub fn rig(sim: ModemSim) -> (SimModem, Rig) {
    rig_with(sim, test_config())
}

pub fn rig_with(sim: ModemSim, config: LinkConfig) -> (SimModem, Rig) {
    let clock = VirtualClock::default();
    let pin = SimResetPin::new(sim.clone(), clock.clone());
    let modem = Modem::new(
        sim.clone(),
        pin.clone(),
        clock.clone(),
        RecordingLeds::default(),
        config,
    );
    (modem, Rig { sim, clock, pin })
}

/// Power on and run the init sequence; returns the last verdict and the
/// number of steps taken.
#[allow(dead_code)]
pub fn bring_up(modem: &mut SimModem) -> (ltebridge::modem::Verdict, usize) {
    use ltebridge::modem::Verdict;
    modem.power_on();
    let mut steps = 0;
    loop {
        steps += 1;
        match modem.task_step() {
            Verdict::InProgress if steps < 64 => {}
            verdict => return (verdict, steps),
        }
    }
}
