//! BG770-class modem driver.
//!
//! ```text
//!            ┌──────────────── Modem ─────────────────┐
//!  Transport │ LineDecoder ─▶ CommandKind::validate ─▶ │ ─▶ Verdict
//!  ◀──────── │ CommandKind::render ◀─ INIT_SEQUENCE    │
//!  OutputPin │ reset pulse        ModemContext         │
//!            └─────────────────────────────────────────┘
//! ```
//!
//! [`Modem::execute`] is the only place that talks to the serial line: it
//! writes one command, then polls the transport until the command's
//! validator reaches a verdict or the step times out.
//! [`Modem::task_step`] walks [`INIT_SEQUENCE`] one step per call, and
//! [`Modem::reset`] pulses the module reset line and starts a fresh
//! [`ModemContext`].  Every wait goes through the [`ClockPort`].

pub mod commands;
pub mod context;
pub mod payload;
pub mod validators;

use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};

use crate::app::ports::{ClockPort, Indicator, IndicatorPort, PayloadSink};
use crate::config::LinkConfig;
use crate::error::ModemError;
use crate::link::{Line, LineDecoder, Transport};

use commands::{CommandStep, INIT_SEQUENCE};
use context::{Identity, ModemContext, ModemState, OperatorSelection, SignalQuality};
use payload::{END_OF_PAYLOAD, PublishPayload};

/// Outcome of one validator call, one command or one init step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Fail,
    /// Internal to the executor; callers see `Fail`.
    Timeout,
    InProgress,
    /// The send prompt arrived; the executor writes the pending payload.
    RequestPayloadSend,
    /// `AT+COPS` was rejected.
    RegistrationError,
    /// The init sequence has completed.
    Subscribed,
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Reset pulse at power-on.
pub const POWER_ON_PULSE_MS: u32 = 750;
/// Quiet time before a recovery pulse.
pub const RESET_SETTLE_MS: u32 = 1_000;
/// Recovery pulse width.
pub const RESET_PULSE_MS: u32 = 1_000;
const RESET_FLASHES: u8 = 5;
const RESET_FLASH_MS: u32 = 100;

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct Modem<T, R, C, I>
where
    T: Transport,
    R: OutputPin,
    C: ClockPort,
    I: IndicatorPort,
{
    transport: T,
    reset_pin: R,
    clock: C,
    indicators: I,
    config: LinkConfig,
    ctx: ModemContext,
    decoder: LineDecoder,
    /// Written when the publish validator asks for it.
    outbound: Option<PublishPayload>,
    last_error: Option<ModemError>,
}

impl<T, R, C, I> Modem<T, R, C, I>
where
    T: Transport,
    R: OutputPin,
    C: ClockPort,
    I: IndicatorPort,
{
    /// Build a driver in `NotOpen`.  `config` is expected to be validated.
    pub fn new(transport: T, reset_pin: R, clock: C, indicators: I, config: LinkConfig) -> Self {
        Self {
            transport,
            reset_pin,
            clock,
            indicators,
            config,
            ctx: ModemContext::default(),
            decoder: LineDecoder::new(),
            outbound: None,
            last_error: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn state(&self) -> ModemState {
        self.ctx.state
    }

    pub fn rssi(&self) -> SignalQuality {
        self.ctx.rssi
    }

    pub fn imsi(&self) -> Option<&Identity> {
        self.ctx.imsi.as_ref()
    }

    pub fn operator(&self) -> OperatorSelection {
        self.ctx.operator
    }

    /// Index of the next init step.
    pub fn step_index(&self) -> usize {
        self.ctx.step_index
    }

    /// Cause of the most recent failed command.
    pub fn last_error(&self) -> Option<ModemError> {
        self.last_error
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn indicators_mut(&mut self) -> &mut I {
        &mut self.indicators
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ── Power / recovery ──────────────────────────────────────

    /// Take the module out of reset and start a fresh init cycle.
    pub fn power_on(&mut self) {
        info!("MODEM: power on");
        self.indicators.set(Indicator::LanRed, true);
        self.pulse_reset(POWER_ON_PULSE_MS);
        self.restart_context();
    }

    /// Hardware reset.  Always returns `InProgress`: the init sequence
    /// starts over from the boot banner wait.
    pub fn reset(&mut self) -> Verdict {
        warn!(
            "MODEM: reset (state {:?}, step {}, last error: {:?})",
            self.ctx.state, self.ctx.step_index, self.last_error
        );
        for _ in 0..RESET_FLASHES {
            self.indicators.set(Indicator::LanRed, true);
            self.clock.sleep_ms(RESET_FLASH_MS);
            self.indicators.set(Indicator::LanRed, false);
            self.clock.sleep_ms(RESET_FLASH_MS);
        }
        self.indicators.set(Indicator::LanRed, true);

        self.clock.sleep_ms(RESET_SETTLE_MS);
        self.pulse_reset(RESET_PULSE_MS);
        self.restart_context();
        Verdict::InProgress
    }

    fn pulse_reset(&mut self, hold_ms: u32) {
        if let Err(e) = self.reset_pin.set_low() {
            error!("MODEM: reset line assert failed: {:?}", e);
        }
        self.clock.sleep_ms(hold_ms);
        if let Err(e) = self.reset_pin.set_high() {
            error!("MODEM: reset line release failed: {:?}", e);
        }
    }

    fn restart_context(&mut self) {
        self.ctx = ModemContext::new(ModemState::Initializing);
        self.decoder.reset();
        self.outbound = None;
    }

    // ── Init sequence ─────────────────────────────────────────

    /// Run the next init step.
    ///
    /// Returns `InProgress` while steps remain, `Subscribed` once the
    /// sequence has completed and `Fail` on any failure.  After a `Fail`
    /// the driver stays in `Error` until [`reset`](Self::reset).
    pub fn task_step(&mut self) -> Verdict {
        match self.ctx.state {
            ModemState::Initializing => {}
            ModemState::Subscribed => return Verdict::Subscribed,
            other => {
                warn!("MODEM: init step requested in {:?}", other);
                return Verdict::Fail;
            }
        }

        let Some(step) = INIT_SEQUENCE.get(self.ctx.step_index) else {
            return self.enter_subscribed();
        };

        match self.execute(step) {
            Verdict::Success => {
                self.ctx.step_index += 1;
                if self.ctx.step_index < INIT_SEQUENCE.len() {
                    Verdict::InProgress
                } else {
                    self.enter_subscribed()
                }
            }
            Verdict::RegistrationError if !self.ctx.fallback_used => {
                self.ctx.fallback_used = true;
                self.ctx.operator = self.ctx.operator.toggled();
                warn!("MODEM: registration rejected, retrying with {:?} operator", self.ctx.operator);
                Verdict::InProgress
            }
            Verdict::RegistrationError => {
                error!("MODEM: registration rejected on both operators");
                self.last_error = Some(ModemError::HardFailure);
                self.ctx.state = ModemState::Error;
                Verdict::Fail
            }
            _ => {
                self.ctx.state = ModemState::Error;
                Verdict::Fail
            }
        }
    }

    fn enter_subscribed(&mut self) -> Verdict {
        self.ctx.step_index = 0;
        self.ctx.state = ModemState::Subscribed;
        self.indicators.all_off();
        info!(
            "MODEM: subscribed to {} (rssi {})",
            self.config.subscribe_topic, self.ctx.rssi
        );
        Verdict::Subscribed
    }

    // ── Command executor ──────────────────────────────────────

    /// Send one command and block until its validator reaches a verdict.
    ///
    /// A timeout, transport error or rendering error yields `Fail`; the
    /// cause is kept in [`last_error`](Self::last_error).
    pub fn execute(&mut self, step: &CommandStep) -> Verdict {
        if !step.pre_delay.is_zero() {
            self.clock.sleep_ms(duration_ms(step.pre_delay));
        }

        match step.kind.render(&self.config, &self.ctx) {
            Ok(Some(cmd)) => {
                info!("MODEM: >> {}", cmd);
                if let Err(e) = self.write_command(cmd.as_bytes()) {
                    return self.fail(step, e);
                }
            }
            Ok(None) => debug!("MODEM: waiting for {}", step.kind.name()),
            Err(e) => return self.fail(step, e),
        }

        match self.await_verdict(step) {
            Ok(Verdict::Timeout) => self.fail(step, ModemError::Timeout),
            Ok(Verdict::Fail) => self.fail(step, ModemError::ProtocolMismatch),
            Ok(Verdict::RegistrationError) => {
                self.last_error = Some(ModemError::RecoverableRegistrationError);
                Verdict::RegistrationError
            }
            Ok(verdict) => verdict,
            Err(e) => self.fail(step, e),
        }
    }

    fn fail(&mut self, step: &CommandStep, cause: ModemError) -> Verdict {
        warn!("MODEM: {} failed: {}", step.kind.name(), cause);
        self.last_error = Some(cause);
        Verdict::Fail
    }

    fn await_verdict(&mut self, step: &CommandStep) -> Result<Verdict, ModemError> {
        let deadline = self
            .clock
            .now_ms()
            .saturating_add(step.timeout.as_millis() as u64);
        let mut occurrence: u16 = 0;

        loop {
            while let Some(line) = self.read_line()? {
                occurrence = occurrence.saturating_add(1);
                debug!("MODEM: << [{}] #{}", line, occurrence);
                match step.kind.validate(&line, occurrence, &mut self.ctx) {
                    Verdict::InProgress => {}
                    Verdict::RequestPayloadSend => self.write_payload()?,
                    verdict => return Ok(verdict),
                }
            }
            if self.clock.now_ms() > deadline {
                return Ok(Verdict::Timeout);
            }
            self.clock.sleep_ms(self.config.poll_interval_ms);
        }
    }

    /// Next complete line, or `None` once the transport has no more bytes.
    fn read_line(&mut self) -> Result<Option<Line>, ModemError> {
        let mut byte = [0u8; 1];
        loop {
            let n = self.transport.read(&mut byte).map_err(|e| {
                error!("MODEM: transport read failed: {:?}", e);
                ModemError::Transport
            })?;
            if n == 0 {
                return Ok(None);
            }
            if let Some(line) = self.decoder.push(byte[0]) {
                return Ok(Some(line));
            }
        }
    }

    fn write_command(&mut self, cmd: &[u8]) -> Result<(), ModemError> {
        self.write_raw(cmd)?;
        self.write_raw(b"\r")?;
        self.flush()
    }

    fn write_payload(&mut self) -> Result<(), ModemError> {
        let Some(payload) = self.outbound.take() else {
            error!("MODEM: send prompt without a pending payload");
            return Err(ModemError::ProtocolMismatch);
        };
        debug!("MODEM: >> {} payload bytes", payload.len());
        self.write_raw(payload.as_bytes())?;
        self.write_raw(&[END_OF_PAYLOAD])?;
        self.flush()
    }

    fn flush(&mut self) -> Result<(), ModemError> {
        self.transport.flush().map_err(|e| {
            error!("MODEM: transport flush failed: {:?}", e);
            ModemError::Transport
        })
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), ModemError> {
        self.transport.write_all(data).map_err(|e| {
            error!("MODEM: transport write failed: {:?}", e);
            ModemError::Transport
        })
    }

    // ── Steady-state operations ───────────────────────────────

    /// Publish `payload` on the configured publish topic.
    /// Only valid while subscribed.
    pub fn publish(&mut self, payload: PublishPayload) -> Verdict {
        if self.ctx.state != ModemState::Subscribed {
            warn!("MODEM: publish refused in {:?}", self.ctx.state);
            return Verdict::Fail;
        }
        self.ctx.state = ModemState::Publishing;
        self.outbound = Some(payload);
        let verdict = self.execute(&commands::PUBLISH);
        self.outbound = None;
        self.settle(verdict, ModemState::Subscribed)
    }

    pub fn unsubscribe(&mut self) -> Verdict {
        let verdict = self.execute(&commands::UNSUBSCRIBE);
        self.settle(verdict, self.ctx.state)
    }

    pub fn subscribe(&mut self) -> Verdict {
        let verdict = self.execute(&commands::SUBSCRIBE);
        self.settle(verdict, ModemState::Subscribed)
    }

    /// Network time sync; the modem updates its RTC.
    pub fn sync_time(&mut self) -> Verdict {
        let verdict = self.execute(&commands::TIME_SYNC);
        self.settle(verdict, self.ctx.state)
    }

    pub fn deactivate_pdp(&mut self) -> Verdict {
        let verdict = self.execute(&commands::DEACTIVATE_PDP);
        self.settle(verdict, self.ctx.state)
    }

    /// Orderly power down.  On success the modem is `NotOpen` and needs
    /// [`power_on`](Self::power_on) before it can be used again.
    pub fn power_down(&mut self) -> Verdict {
        let verdict = self.execute(&commands::POWER_DOWN);
        let verdict = self.settle(verdict, ModemState::NotOpen);
        if verdict == Verdict::Success {
            info!("MODEM: powered down");
        }
        verdict
    }

    fn settle(&mut self, verdict: Verdict, on_success: ModemState) -> Verdict {
        match verdict {
            Verdict::Success => {
                self.ctx.state = on_success;
                Verdict::Success
            }
            _ => {
                self.ctx.state = ModemState::Error;
                Verdict::Fail
            }
        }
    }

    // ── Notifications ─────────────────────────────────────────

    /// Poll for one line while subscribed.
    ///
    /// `Ok(None)` when no complete line is buffered; a line that is not a
    /// subscription notification is a protocol error.
    pub fn poll_notification(&mut self) -> Result<Option<Line>, ModemError> {
        let Some(line) = self.read_line()? else {
            return Ok(None);
        };
        debug!("MODEM: << [{}]", line);
        let payload = payload::extract_subscribe_payload(&line).map_err(|e| {
            warn!("MODEM: unexpected line while subscribed: [{}]", line);
            ModemError::from(e)
        })?;
        let mut out = Line::new();
        // Payload is a slice of a line of the same capacity.
        let _ = out.push_str(payload);
        Ok(Some(out))
    }

    /// Hand `payload` to `sink`, then cycle the subscription.
    ///
    /// Notifications arriving between unsubscribe and resubscribe are not
    /// queued.
    pub fn handle_notification<S: PayloadSink>(&mut self, payload: &str, sink: &mut S) -> Verdict {
        info!("MODEM: payload [{}]", payload);
        self.ctx.state = ModemState::AwaitingOperation;
        sink.on_payload(payload, &mut self.indicators);

        if self.unsubscribe() != Verdict::Success {
            return Verdict::Fail;
        }
        self.subscribe()
    }

    /// Plain delay through the driver's clock.
    pub fn delay_ms(&mut self, ms: u32) {
        self.clock.sleep_ms(ms);
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

fn duration_ms(d: core::time::Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}
