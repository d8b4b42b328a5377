//! Byte transports to the sensor
//!
//! A [`Transport`] moves raw bytes; framing and retries live above it.
//! Reads never block: they return whatever the bus has right now.

use lensbus_hal::{I2cBus, UartRx, UartTx};
use lensbus_protocol::SENSOR_ADDRESS;

/// Raw byte link to the sensor
pub trait Transport {
    type Error;

    /// Write a complete packet
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Read up to `buf.len()` bytes, returning how many arrived
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(bytes)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read_available(buf)
    }
}

/// Sensor on an I2C bus
///
/// I2C has no "bytes available" notion: every read clocks in a full
/// buffer. The sensor pads with non-header bytes when it has nothing to
/// say, which the frame assembler skips.
pub struct I2cTransport<B> {
    bus: B,
    address: u8,
}

impl<B: I2cBus> I2cTransport<B> {
    /// Sensor at the default address
    pub fn new(bus: B) -> Self {
        Self::with_address(bus, SENSOR_ADDRESS)
    }

    pub fn with_address(bus: B, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }
}

impl<B: I2cBus> Transport for I2cTransport<B> {
    type Error = B::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.bus.write(self.address, bytes)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.bus.read(self.address, buf)?;
        Ok(buf.len())
    }
}

/// Sensor on a UART
pub struct UartTransport<U> {
    uart: U,
}

impl<U> UartTransport<U> {
    pub fn new(uart: U) -> Self {
        Self { uart }
    }

    pub fn release(self) -> U {
        self.uart
    }
}

impl<U, E> Transport for UartTransport<U>
where
    U: UartTx<Error = E> + UartRx<Error = E>,
{
    type Error = E;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.uart.write_blocking(bytes)?;
        self.uart.flush()
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.uart.read_available(buf)
    }
}
