//! UART serial communication abstractions
//!
//! The sensor can also be wired over a UART. The driver never blocks
//! waiting on the receiver; it polls [`UartRx::read_available`] and keeps
//! its own deadline.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Copy whatever bytes are already buffered into `buf`
    ///
    /// Returns immediately with the number of bytes copied, which may be 0.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}
