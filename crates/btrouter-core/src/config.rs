//! Deploy-time router configuration.
//!
//! The configuration is built once at process start (defaults plus
//! command-line overrides) and handed to the service by value. Nothing
//! mutates it afterwards.

use std::fmt;
use std::time::Duration;

use crate::command::DEFAULT_COMMAND_TIMEOUT;
use crate::error::{CoreError, Result};

/// Alias the adapter advertises when none is configured.
pub const DEFAULT_ALIAS: &str = "raspberrypi";

/// Selector string meaning "leave the system default sink alone".
pub const SYSTEM_DEFAULT_SENTINEL: &str = "default";

/// Which output device should become the audio server's default sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioTarget {
    /// Keep whatever the audio server already uses.
    SystemDefault,
    /// Switch the default sink to the named device.
    Device(String),
}

impl AudioTarget {
    /// Parse a selector string. Only the exact string `default` is the
    /// sentinel; anything else names a device.
    pub fn parse(selector: &str) -> Self {
        if selector == SYSTEM_DEFAULT_SENTINEL {
            AudioTarget::SystemDefault
        } else {
            AudioTarget::Device(selector.to_string())
        }
    }

    /// Device name, or `None` for the system default.
    pub fn device(&self) -> Option<&str> {
        match self {
            AudioTarget::SystemDefault => None,
            AudioTarget::Device(name) => Some(name),
        }
    }
}

impl Default for AudioTarget {
    fn default() -> Self {
        AudioTarget::SystemDefault
    }
}

impl fmt::Display for AudioTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioTarget::SystemDefault => write!(f, "system default"),
            AudioTarget::Device(name) => write!(f, "'{}'", name),
        }
    }
}

/// Settle delays around the audio server restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartTiming {
    /// Pause after killing the audio server.
    pub after_kill: Duration,
    /// Pause after starting it again.
    pub after_start: Duration,
}

impl RestartTiming {
    /// No pauses at all; used by tests.
    pub const fn immediate() -> Self {
        Self {
            after_kill: Duration::ZERO,
            after_start: Duration::ZERO,
        }
    }
}

impl Default for RestartTiming {
    fn default() -> Self {
        Self {
            after_kill: Duration::from_secs(1),
            after_start: Duration::from_secs(2),
        }
    }
}

/// Audio backend settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConfig {
    /// Settle delays for the server restart.
    pub timing: RestartTiming,
    /// Upper bound on each external command.
    pub command_timeout: Duration,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            timing: RestartTiming::default(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// Target values for the four adapter properties.
///
/// Applying the same values twice leaves the adapter unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterProperties {
    pub powered: bool,
    pub alias: String,
    pub discoverable: bool,
    pub pairable: bool,
}

/// Complete router configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Name the adapter advertises to phones.
    pub alias: String,
    /// Preferred output device.
    pub audio_target: AudioTarget,
    /// Whether the adapter is discoverable.
    pub discoverable: bool,
    /// Whether the adapter accepts pairing.
    pub pairable: bool,
    /// Audio backend settings.
    pub audio: AudioConfig,
}

impl RouterConfig {
    /// Check the configuration before the service uses it.
    pub fn validate(&self) -> Result<()> {
        if self.alias.trim().is_empty() {
            return Err(CoreError::EmptyAlias);
        }
        if let AudioTarget::Device(name) = &self.audio_target {
            if name.trim().is_empty() {
                return Err(CoreError::EmptyAudioTarget);
            }
        }
        if self.audio.command_timeout.is_zero() {
            return Err(CoreError::ZeroCommandTimeout);
        }
        Ok(())
    }

    /// Adapter property values derived from this configuration.
    ///
    /// The adapter is always powered; the other values come from config.
    pub fn adapter_properties(&self) -> AdapterProperties {
        AdapterProperties {
            powered: true,
            alias: self.alias.clone(),
            discoverable: self.discoverable,
            pairable: self.pairable,
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            alias: DEFAULT_ALIAS.to_string(),
            audio_target: AudioTarget::SystemDefault,
            discoverable: true,
            pairable: true,
            audio: AudioConfig::default(),
        }
    }
}
