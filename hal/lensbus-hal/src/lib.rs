//! lensbus Hardware Abstraction Layer
//!
//! This crate defines the small set of hardware traits the vision sensor
//! driver needs. Chip-specific crates (RP2040, host mocks, etc.) implement
//! them so the same driver code runs everywhere.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  lensbus-driver (Session, Link)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  lensbus-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ lensbus-hal-  │       │  test mocks   │
//! │    rp2040     │       │  (host)       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cBus`] - I2C bus operations
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication
//! - [`clock::Clock`] - Monotonic millisecond clock for deadlines

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod i2c;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use i2c::{I2cBus, I2cBusError, I2cConfig};
pub use uart::{UartRx, UartTx};
