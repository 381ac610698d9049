//! # bt-audio-router
//!
//! Turns a Linux single-board computer into a discoverable Bluetooth audio
//! sink. The router only configures things: BlueZ carries the Bluetooth
//! traffic and PulseAudio moves the audio. Startup order is fixed:
//!
//! 1. privilege check
//! 2. optional system preflight report
//! 3. adapter configuration (`btrouter_bluetooth`)
//! 4. audio backend configuration (`btrouter_audio`)
//! 5. wait for a stop request (SIGINT/SIGTERM, see [`shutdown_signal`])

pub mod lifecycle;
pub mod preflight;
pub mod privilege;
pub mod service;
pub mod signal;

pub use lifecycle::{Lifecycle, ServiceState};
pub use privilege::{EffectiveUser, PrivilegeCheck};
pub use service::{Service, StartupError};
pub use signal::shutdown_signal;
