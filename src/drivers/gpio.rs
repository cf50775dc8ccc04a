//! Push-pull GPIO outputs.
//!
//! Configures the pin direction with raw ESP-IDF sys calls and exposes
//! the pin as an `embedded_hal::digital::OutputPin`, so the modem driver
//! and LED drivers stay generic.
//!
//! On host/test the level is tracked in memory only.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    ConfigFailed { pin: i32, rc: i32 },
}

impl core::fmt::Display for GpioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ConfigFailed { pin, rc } => write!(f, "GPIO{} config failed (rc={})", pin, rc),
        }
    }
}

impl core::error::Error for GpioError {}

// ── Output pin ────────────────────────────────────────────────

pub struct GpioOutput {
    pin: i32,
    high: bool,
}

impl GpioOutput {
    /// Configure `pin` as an output and drive it to `initial_high`.
    #[cfg(target_os = "espidf")]
    pub fn new(pin: i32, initial_high: bool) -> Result<Self, GpioError> {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: called from the single-threaded init path.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(GpioError::ConfigFailed { pin, rc: ret });
        }
        let mut out = Self { pin, high: initial_high };
        out.write(initial_high);
        log::debug!("gpio: GPIO{} output, initial {}", pin, if initial_high { "HIGH" } else { "LOW" });
        Ok(out)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(pin: i32, initial_high: bool) -> Result<Self, GpioError> {
        Ok(Self { pin, high: initial_high })
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }

    /// Last level written.
    pub fn is_high(&self) -> bool {
        self.high
    }

    fn write(&mut self, high: bool) {
        #[cfg(target_os = "espidf")]
        // SAFETY: the pin was configured as an output in `new`.
        unsafe {
            gpio_set_level(self.pin, u32::from(high));
        }
        self.high = high;
    }
}

impl ErrorType for GpioOutput {
    type Error = Infallible;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}
