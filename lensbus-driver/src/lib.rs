//! Blocking driver for I2C/UART vision sensors
//!
//! Layers, bottom up:
//!
//! - [`transport`]: raw bytes over I2C or UART
//! - [`transaction`]: request/reply with timeouts and retries
//! - [`session`]: the command facade and result cache
//!
//! ```ignore
//! let transport = I2cTransport::new(bus);
//! let mut sensor = Session::new(transport, clock, delay, SessionConfig::default());
//! if sensor.knock() && sensor.switch_algorithm(Algorithm::FaceRecognition) {
//!     let count = sensor.get_result(Algorithm::FaceRecognition);
//!     if let Some(face) = sensor.nearest_to_center() {
//!         // ...
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod session;
pub mod transaction;
pub mod transport;

pub use session::Session;
pub use transaction::{expect_return, Link, TransactionError};
pub use transport::{I2cTransport, Transport, UartTransport};

pub use lensbus_core::{LineTrack, ResultCache, RetryPolicy, ScreenGeometry, SessionConfig};
pub use lensbus_protocol::{Algorithm, Color, Detection, LinkStats, Rect};
