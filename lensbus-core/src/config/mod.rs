//! Session configuration
//!
//! Retry policies and session settings, storable as postcard binary data.

pub mod policy;
pub mod session;

pub use policy::*;
pub use session::*;
