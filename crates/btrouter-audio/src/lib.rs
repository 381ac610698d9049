//! # btrouter-audio
//!
//! PulseAudio configuration for the Bluetooth audio router.
//!
//! `AudioBackendConfigurator` restarts the audio server, loads the
//! Bluetooth bridging modules, selects the preferred output sink and lists
//! the hardware cards for the operator. Every step goes through a
//! `btrouter_core::CommandRunner`; each failure is reported on its own and
//! none of them stops the remaining steps.

pub mod backend;

pub use backend::{AudioBackendConfigurator, AudioReport, AudioStep, StepReport, BRIDGE_MODULES};
