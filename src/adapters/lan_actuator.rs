//! Payload actuator: maps a received payload onto the LAN LEDs.
//!
//! | Payload  | Red | Green |
//! |----------|-----|-------|
//! | `RED`    | on  | off   |
//! | `GREEN`  | off | on    |
//! | other    | off | off   |

use log::info;

use crate::app::ports::{Indicator, IndicatorPort, PayloadSink};

/// Colour last requested by a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanColour {
    Red,
    Green,
    Off,
}

impl LanColour {
    pub fn from_payload(payload: &str) -> Self {
        match payload {
            "RED" => Self::Red,
            "GREEN" => Self::Green,
            _ => Self::Off,
        }
    }
}

#[derive(Debug)]
pub struct LanActuator {
    colour: LanColour,
}

impl Default for LanActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl LanActuator {
    pub fn new() -> Self {
        Self {
            colour: LanColour::Off,
        }
    }

    pub fn colour(&self) -> LanColour {
        self.colour
    }
}

impl PayloadSink for LanActuator {
    fn on_payload<I: IndicatorPort>(&mut self, payload: &str, indicators: &mut I) {
        let colour = LanColour::from_payload(payload);
        indicators.set(Indicator::LanRed, colour == LanColour::Red);
        indicators.set(Indicator::LanGreen, colour == LanColour::Green);
        if colour != self.colour {
            info!("LAN: {:?} -> {:?}", self.colour, colour);
        }
        self.colour = colour;
    }
}
