//! Board-agnostic core logic for the vision sensor driver
//!
//! This crate contains everything that sits between decoded frames and
//! the application, without touching a bus:
//!
//! - Result cache for the most recent get-result exchange
//! - Line-tracking view over the cache
//! - Session configuration (retry policies, screen geometry)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod cache;
pub mod config;
pub mod line;

pub use cache::{CacheError, ResultCache, CACHE_CAPACITY};
pub use config::{ConfigError, RetryPolicy, ScreenGeometry, SessionConfig};
pub use line::LineTrack;
