//! # btrouter-bluetooth
//!
//! BlueZ adapter configuration for the Bluetooth audio router.
//!
//! The adapter is located through the D-Bus object manager exposed by the
//! BlueZ daemon and configured through the standard properties interface:
//!
//! - `BusConnector` / `ManagementBus`: the narrow bus seam (`SystemBus` is
//!   the real system-bus implementation)
//! - `AdapterConfigurator`: finds the first `org.bluez.Adapter1` object and
//!   applies power, alias, discoverability and pairability
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use btrouter_bluetooth::{AdapterConfigurator, SystemBus};
//! use btrouter_core::RouterConfig;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RouterConfig::default();
//!     let configurator =
//!         AdapterConfigurator::new(Arc::new(SystemBus), config.adapter_properties());
//!     let adapter = configurator.configure().await?;
//!     println!("Configured {}", adapter.path());
//!     Ok(())
//! }
//! ```

#![cfg(target_os = "linux")]

pub mod adapter;
pub mod bus;
pub mod error;

pub use adapter::{AdapterConfigurator, AdapterHandle};
pub use bus::{
    BusConnector, ManagedObject, ManagementBus, PropertyValue, SystemBus, ADAPTER_INTERFACE,
    BLUEZ_SERVICE,
};
pub use error::{BluetoothError, Result};
