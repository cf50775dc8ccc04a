//! Link service: the poll loop around the modem driver.
//!
//! [`LinkService`] owns the [`Modem`] and decides what to do with it on
//! each tick: power it on, advance the init sequence, recover from a
//! failure, or service one subscription notification.
//!
//! ```text
//!  NotOpen ──power_on──▶ Initializing ──task_step…──▶ Subscribed
//!     ▲                      ▲   │ Fail                  │ notification
//!     │                      └─reset◀──── Error ◀────────┘ / Fail
//! ```

use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use crate::error::PayloadError;
use crate::link::Transport;
use crate::modem::context::ModemState;
use crate::modem::payload::{OutboundMessage, PublishPayload};
use crate::modem::{Modem, Verdict};

use super::ports::{ClockPort, IndicatorPort, PayloadSink};

/// Body of the optional reply published after each handled notification.
pub const REPLY_MESSAGE: &str = "hello from CK-1540-01";

pub struct LinkService<T, R, C, I>
where
    T: Transport,
    R: OutputPin,
    C: ClockPort,
    I: IndicatorPort,
{
    modem: Modem<T, R, C, I>,
    resets: u32,
    notifications: u32,
}

impl<T, R, C, I> LinkService<T, R, C, I>
where
    T: Transport,
    R: OutputPin,
    C: ClockPort,
    I: IndicatorPort,
{
    pub fn new(modem: Modem<T, R, C, I>) -> Self {
        Self {
            modem,
            resets: 0,
            notifications: 0,
        }
    }

    pub fn modem(&self) -> &Modem<T, R, C, I> {
        &self.modem
    }

    pub fn modem_mut(&mut self) -> &mut Modem<T, R, C, I> {
        &mut self.modem
    }

    /// Hardware resets performed since construction.
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Notifications delivered to the sink.
    pub fn notifications(&self) -> u32 {
        self.notifications
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one unit of work and return the resulting modem state.
    ///
    /// During init that is one command step; while subscribed it is at
    /// most one notification.  Every failure ends in a hardware reset.
    pub fn tick<S: PayloadSink>(&mut self, sink: &mut S) -> ModemState {
        match self.modem.state() {
            ModemState::NotOpen => self.modem.power_on(),
            ModemState::Initializing => match self.modem.task_step() {
                Verdict::Subscribed => info!("LINK: subscribe start"),
                Verdict::Fail => self.recover(),
                _ => {}
            },
            ModemState::Subscribed => self.service_notification(sink),
            ModemState::Error => self.recover(),
            // Both only exist inside a blocking driver call.
            ModemState::Publishing | ModemState::AwaitingOperation => {
                warn!("LINK: tick in transient state {:?}", self.modem.state());
                self.recover();
            }
        }
        self.modem.state()
    }

    fn service_notification<S: PayloadSink>(&mut self, sink: &mut S) {
        let payload = match self.modem.poll_notification() {
            Ok(Some(payload)) => payload,
            Ok(None) => return,
            Err(e) => {
                error!("LINK: {} while subscribed", e);
                self.recover();
                return;
            }
        };

        self.notifications = self.notifications.wrapping_add(1);
        if self.modem.handle_notification(&payload, sink) != Verdict::Success {
            self.recover();
            return;
        }

        if !self.modem.config().publish_reply {
            return;
        }
        match self.publish_message(REPLY_MESSAGE) {
            Ok(Verdict::Success) => {}
            Ok(_) => self.recover(),
            // Nothing was sent; the link itself is still healthy.
            Err(e) => warn!("LINK: reply not published: {}", e),
        }
    }

    /// Serialise `{"message": text}` and publish it.
    ///
    /// A message that does not fit the configured maximum is rejected
    /// with `Err` before anything reaches the modem; `Ok` carries the
    /// verdict of the publish itself.
    pub fn publish_message(&mut self, text: &str) -> Result<Verdict, PayloadError> {
        let max = self.modem.config().max_publish_size as usize;
        let payload = PublishPayload::from_message(&OutboundMessage { message: text }, max)?;
        Ok(self.modem.publish(payload))
    }

    fn recover(&mut self) {
        self.resets = self.resets.wrapping_add(1);
        self.modem.reset();
    }
}
