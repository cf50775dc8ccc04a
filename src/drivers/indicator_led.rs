//! LAN status LED pair.
//!
//! Two discrete LEDs (red, green) wired active-low: driving the pin LOW
//! lights the LED.  Pin errors are logged and otherwise ignored since a
//! stuck LED never blocks the link.

use embedded_hal::digital::OutputPin;

use crate::app::ports::{Indicator, IndicatorPort};

pub struct LanLeds<R: OutputPin, G: OutputPin> {
    red: R,
    green: G,
    lit: (bool, bool),
}

impl<R: OutputPin, G: OutputPin> LanLeds<R, G> {
    /// Take both pins and switch the LEDs off.
    pub fn new(red: R, green: G) -> Self {
        let mut leds = Self {
            red,
            green,
            lit: (true, true),
        };
        leds.all_off();
        leds
    }

    /// `(red, green)` as last commanded.
    pub fn lit(&self) -> (bool, bool) {
        self.lit
    }

    pub fn release(self) -> (R, G) {
        (self.red, self.green)
    }
}

fn drive<P: OutputPin>(pin: &mut P, on: bool) {
    let res = if on { pin.set_low() } else { pin.set_high() };
    if let Err(e) = res {
        log::warn!("LED: pin write failed: {:?}", e);
    }
}

impl<R: OutputPin, G: OutputPin> IndicatorPort for LanLeds<R, G> {
    fn set(&mut self, indicator: Indicator, on: bool) {
        match indicator {
            Indicator::LanRed => {
                drive(&mut self.red, on);
                self.lit.0 = on;
            }
            Indicator::LanGreen => {
                drive(&mut self.green, on);
                self.lit.1 = on;
            }
        }
    }
}
