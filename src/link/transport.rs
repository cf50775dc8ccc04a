//! Transport abstraction: the serial byte channel to the modem.
//!
//! Concrete implementations:
//! - UART1 on the target board (`adapters::uart::UartTransport`, ESP-IDF only)
//! - Scripted in-memory modems in the host tests
//!
//! The modem driver is generic over `Transport`, so it never touches the
//! UART peripheral directly.

/// Byte-oriented duplex channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write all of `data` to the transport.
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;
}
