//! I2C peripheral mapping and bus adapter
//!
//! RP2040 has two I2C controllers. Every GPIO can carry one of their
//! signals; the function repeats every four pins.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use lensbus_hal::{I2cBus, I2cBusError};

/// Highest GPIO number on the RP2040
const MAX_GPIO: u8 = 29;

/// I2C controller identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cId {
    I2c0,
    I2c1,
}

/// Signal a GPIO carries for its controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cPinRole {
    Sda,
    Scl,
}

/// Determine which I2C controller and signal a GPIO pin maps to
pub fn gpio_to_i2c(gpio: u8) -> Option<(I2cId, I2cPinRole)> {
    if gpio > MAX_GPIO {
        return None;
    }
    // I2C0: SDA 0/4/8.., SCL 1/5/9..
    // I2C1: SDA 2/6/10.., SCL 3/7/11..
    let mapping = match gpio % 4 {
        0 => (I2cId::I2c0, I2cPinRole::Sda),
        1 => (I2cId::I2c0, I2cPinRole::Scl),
        2 => (I2cId::I2c1, I2cPinRole::Sda),
        _ => (I2cId::I2c1, I2cPinRole::Scl),
    };
    Some(mapping)
}

/// Adapts any blocking `embedded_hal` I2C master to [`I2cBus`]
pub struct BlockingI2c<I> {
    inner: I,
}

impl<I: I2c> BlockingI2c<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }

    pub fn release(self) -> I {
        self.inner
    }
}

impl<I: I2c> I2cBus for BlockingI2c<I> {
    type Error = I2cBusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write(address, data).map_err(|e| map_kind(e.kind()))
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.inner.read(address, buf).map_err(|e| map_kind(e.kind()))
    }
}

fn map_kind(kind: ErrorKind) -> I2cBusError {
    match kind {
        ErrorKind::Bus => I2cBusError::Bus,
        ErrorKind::ArbitrationLoss => I2cBusError::ArbitrationLost,
        ErrorKind::NoAcknowledge(_) => I2cBusError::Nack,
        ErrorKind::Overrun => I2cBusError::Overrun,
        _ => I2cBusError::Other,
    }
}
