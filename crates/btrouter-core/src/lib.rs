//! # btrouter-core
//!
//! Shared building blocks for the Bluetooth audio router:
//!
//! - `RouterConfig`, the deploy-time configuration handed to the service
//! - `CommandRunner`, a timeout-bounded external command boundary
//! - `SystemSetup`, pre-flight checks for the daemons the router drives
//!
//! Nothing in this crate talks to Bluetooth or the audio server directly;
//! those live in `btrouter-bluetooth` and `btrouter-audio`.

pub mod command;
pub mod config;
pub mod error;
pub mod setup;

pub use command::{
    CommandLine, CommandOutcome, CommandRunner, SystemCommandRunner, DEFAULT_COMMAND_TIMEOUT,
};
pub use config::{AdapterProperties, AudioConfig, AudioTarget, RestartTiming, RouterConfig};
pub use error::{CoreError, Result};
pub use setup::{ComponentStatus, SetupIssue, SetupStatus, SystemSetup};
