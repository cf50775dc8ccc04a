//! UART transport to the LTE module.
//!
//! Wraps an `esp_idf_hal` [`UartDriver`] on UART1 (115200 8N1) as a
//! [`Transport`].  Reads never block: the driver's ring buffer absorbs
//! bytes between polls and the modem executor sleeps between reads.

use esp_idf_hal::delay::{BLOCK, NON_BLOCK};
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::uart::{UartDriver, config::Config};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::sys::EspError;
use log::info;

use crate::link::Transport;
use crate::pins;

pub struct UartTransport<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartTransport<'d> {
    /// Install the driver on the LTE UART pins.
    pub fn new(
        uart: impl esp_idf_hal::peripheral::Peripheral<P = impl esp_idf_hal::uart::Uart> + 'd,
        tx: impl esp_idf_hal::peripheral::Peripheral<P = impl esp_idf_hal::gpio::OutputPin> + 'd,
        rx: impl esp_idf_hal::peripheral::Peripheral<P = impl esp_idf_hal::gpio::InputPin> + 'd,
    ) -> Result<Self, EspError> {
        let config = Config::default()
            .baudrate(Hertz(pins::LTE_UART_BAUD))
            .rx_fifo_size(pins::LTE_UART_RX_BUFFER as usize);
        let uart = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &config,
        )?;
        info!(
            "uart: LTE link on UART{} (tx GPIO{}, rx GPIO{}, {} baud)",
            pins::LTE_UART_PORT,
            pins::LTE_UART_TX_GPIO,
            pins::LTE_UART_RX_GPIO,
            pins::LTE_UART_BAUD
        );
        Ok(Self { uart })
    }
}

impl Transport for UartTransport<'_> {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.uart.read(buf, NON_BLOCK)
    }

    fn write_all(&mut self, mut data: &[u8]) -> Result<(), Self::Error> {
        while !data.is_empty() {
            let n = self.uart.write(data)?;
            data = &data[n..];
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.uart.wait_tx_done(BLOCK)
    }
}
