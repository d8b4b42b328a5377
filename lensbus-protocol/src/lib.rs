//! Vision Sensor Wire Protocol
//!
//! This crate defines the binary protocol spoken between a host
//! controller and the vision sensor over I2C (address `0x50`) or UART.
//! Every exchange is a request frame from the host answered by one or
//! more reply frames from the sensor.
//!
//! # Protocol Overview
//!
//! All messages use the same checksummed frame format:
//! ```text
//! ┌──────┬──────┬─────────┬──────┬────────┬──────────────┬──────────┐
//! │ 0x55 │ 0xAA │ COMMAND │ ALGO │ LENGTH │ CONTENT      │ CHECKSUM │
//! │ 1B   │ 1B   │ 1B      │ 1B   │ 1B     │ 0–122B       │ 1B       │
//! └──────┴──────┴─────────┴──────┴────────┴──────────────┴──────────┘
//! ```
//!
//! The checksum is the 8-bit sum of every preceding byte, headers
//! included. Reply content starts with a 10-byte numeric region whose
//! meaning depends on the command; [`payload`] exposes it as named views.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod algorithm;
pub mod checksum;
pub mod command;
pub mod detection;
pub mod frame;
pub mod payload;
pub mod request;

pub use algorithm::{Algorithm, CUSTOM_BEGIN};
pub use checksum::checksum;
pub use command::Command;
pub use detection::{Detection, MAX_CONTENT_LEN, MAX_NAME_LEN};
pub use frame::{
    encode_packet, Frame, FrameAssembler, FrameError, LinkStats, FRAME_BUFFER_SIZE,
    MAX_CONTENT_SIZE,
};
pub use payload::{
    ArgsView, ArrowView, BlockView, InfoView, OrientationView, RegionWriter, MAX_RESULTS, RETURN_OK,
};
pub use request::{Color, Rect, Request};

/// Default 7-bit I2C address of the sensor
pub const SENSOR_ADDRESS: u8 = 0x50;
