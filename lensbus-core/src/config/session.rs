//! Session settings

use lensbus_protocol::SENSOR_ADDRESS;
use serde::{Deserialize, Serialize};

use super::policy::RetryPolicy;

/// Current config layout version
pub const CONFIG_VERSION: u8 = 1;

/// Largest transport read per poll
pub const MAX_READ_CHUNK: u8 = 32;

/// Serialized size bound for [`SessionConfig`]
pub const MAX_CONFIG_SIZE: usize = 64;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Address does not fit in 7 bits
    InvalidAddress,
    /// A policy allows no attempts
    NoRetries,
    /// Polling interval is zero
    ZeroPollInterval,
    /// Read chunk is 0 or above [`MAX_READ_CHUNK`]
    InvalidReadChunk,
    /// Screen has a zero dimension
    InvalidScreen,
    /// Stored layout version does not match
    VersionMismatch,
    Serialize,
    Deserialize,
}

/// Screen size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScreenGeometry {
    pub width: u16,
    pub height: u16,
}

impl ScreenGeometry {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Center pixel, rounded down
    pub const fn center(&self) -> (i32, i32) {
        (self.width as i32 / 2, self.height as i32 / 2)
    }
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

/// Everything a session needs besides the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionConfig {
    pub version: u8,
    /// 7-bit I2C address of the sensor
    pub address: u8,
    /// Handshake policy
    pub knock: RetryPolicy,
    /// Policy for ordinary commands
    pub command: RetryPolicy,
    /// Policy for algorithm switches
    pub switch_algorithm: RetryPolicy,
    /// Sleep between empty polls
    pub poll_interval_ms: u32,
    /// Bytes requested per transport read
    pub read_chunk: u8,
    pub screen: ScreenGeometry,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            address: SENSOR_ADDRESS,
            knock: RetryPolicy::KNOCK,
            command: RetryPolicy::COMMAND,
            switch_algorithm: RetryPolicy::SWITCH_ALGORITHM,
            poll_interval_ms: 1,
            read_chunk: 16,
            screen: ScreenGeometry::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_knock(mut self, policy: RetryPolicy) -> Self {
        self.knock = policy;
        self
    }

    pub fn with_command(mut self, policy: RetryPolicy) -> Self {
        self.command = policy;
        self
    }

    pub fn with_switch_algorithm(mut self, policy: RetryPolicy) -> Self {
        self.switch_algorithm = policy;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn with_read_chunk(mut self, read_chunk: u8) -> Self {
        self.read_chunk = read_chunk;
        self
    }

    pub fn with_screen(mut self, screen: ScreenGeometry) -> Self {
        self.screen = screen;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address > 0x7F {
            return Err(ConfigError::InvalidAddress);
        }
        if [self.knock, self.command, self.switch_algorithm]
            .iter()
            .any(|p| p.retries == 0)
        {
            return Err(ConfigError::NoRetries);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.read_chunk == 0 || self.read_chunk > MAX_READ_CHUNK {
            return Err(ConfigError::InvalidReadChunk);
        }
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(ConfigError::InvalidScreen);
        }
        Ok(())
    }

    /// Serialize with postcard into `buf`
    pub fn to_slice<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Serialize)
    }

    /// Deserialize and validate a stored config
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        if config.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch);
        }
        config.validate()?;
        Ok(config)
    }
}
