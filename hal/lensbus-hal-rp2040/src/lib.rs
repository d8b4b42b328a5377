//! RP2040 adapters for the vision sensor driver
//!
//! Implements the `lensbus-hal` traits on top of embassy-rp:
//!
//! - I2C pin mapping and a blocking bus wrapper
//! - Millisecond clock backed by the embassy time driver

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod i2c;

pub use clock::EmbassyClock;
pub use i2c::{gpio_to_i2c, BlockingI2c, I2cId, I2cPinRole};
