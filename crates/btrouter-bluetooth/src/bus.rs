//! Management bus seam.
//!
//! The router needs exactly two things from the system bus: the object
//! manager's view of BlueZ objects, and the ability to write a property on
//! one of them. Both sit behind traits so the configurator can be driven by
//! an in-memory bus in tests.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use zbus::fdo::ObjectManagerProxy;
use zbus::zvariant::Value;
use zbus::Connection;

use crate::error::{BluetoothError, Result};

/// Well-known bus name of the BlueZ daemon.
pub const BLUEZ_SERVICE: &str = "org.bluez";

/// Interface implemented by Bluetooth adapter objects.
pub const ADAPTER_INTERFACE: &str = "org.bluez.Adapter1";

const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Bool(bool),
    Str(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Str(s) => write!(f, "'{}'", s),
        }
    }
}

/// One object reported by the object manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedObject {
    /// Object path, e.g. `/org/bluez/hci0`.
    pub path: String,
    /// Names of the interfaces the object implements.
    pub interfaces: Vec<String>,
}

impl ManagedObject {
    /// Whether the object implements `interface`.
    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }
}

/// An open connection to the management bus.
#[async_trait]
pub trait ManagementBus: Send + Sync {
    /// Enumerate every object the Bluetooth daemon manages.
    async fn managed_objects(&self) -> Result<Vec<ManagedObject>>;

    /// Write a single property on an object.
    async fn set_property(
        &self,
        path: &str,
        interface: &str,
        property: &str,
        value: &PropertyValue,
    ) -> Result<()>;
}

/// Opens management bus connections.
#[async_trait]
pub trait BusConnector: Send + Sync {
    /// Connect to the bus.
    async fn connect(&self) -> Result<Box<dyn ManagementBus>>;
}

#[async_trait]
impl<T: ManagementBus + ?Sized> ManagementBus for Arc<T> {
    async fn managed_objects(&self) -> Result<Vec<ManagedObject>> {
        (**self).managed_objects().await
    }

    async fn set_property(
        &self,
        path: &str,
        interface: &str,
        property: &str,
        value: &PropertyValue,
    ) -> Result<()> {
        (**self).set_property(path, interface, property, value).await
    }
}

/// The D-Bus system bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBus;

#[async_trait]
impl BusConnector for SystemBus {
    async fn connect(&self) -> Result<Box<dyn ManagementBus>> {
        let connection = Connection::system().await.map_err(|e| {
            BluetoothError::Bus(format!("Failed to connect to system bus: {}", e))
        })?;
        debug!("Connected to D-Bus system bus");
        Ok(Box::new(SystemBusConnection { connection }))
    }
}

/// Live system bus connection.
struct SystemBusConnection {
    connection: Connection,
}

#[async_trait]
impl ManagementBus for SystemBusConnection {
    async fn managed_objects(&self) -> Result<Vec<ManagedObject>> {
        let proxy = ObjectManagerProxy::builder(&self.connection)
            .destination(BLUEZ_SERVICE)
            .and_then(|b| b.path("/"))
            .map_err(|e| BluetoothError::Bus(format!("Invalid object manager address: {}", e)))?
            .build()
            .await
            .map_err(|e| BluetoothError::Bus(format!("Failed to reach object manager: {}", e)))?;

        let objects = proxy.get_managed_objects().await.map_err(|e| {
            BluetoothError::Bus(format!("Failed to enumerate managed objects: {}", e))
        })?;

        // The reply is a dictionary with no wire order left to honour; order
        // by path so "first" is stable across runs.
        let mut managed: Vec<ManagedObject> = objects
            .into_iter()
            .map(|(path, interfaces)| {
                let mut interfaces: Vec<String> =
                    interfaces.keys().map(|name| name.as_str().to_string()).collect();
                interfaces.sort();
                ManagedObject {
                    path: path.as_str().to_string(),
                    interfaces,
                }
            })
            .collect();
        managed.sort_by(|a, b| path_sort_key(&a.path).cmp(&path_sort_key(&b.path)));

        debug!("Object manager reported {} object(s)", managed.len());
        Ok(managed)
    }

    async fn set_property(
        &self,
        path: &str,
        interface: &str,
        property: &str,
        value: &PropertyValue,
    ) -> Result<()> {
        let value = match value {
            PropertyValue::Bool(b) => Value::from(*b),
            PropertyValue::Str(s) => Value::from(s.as_str()),
        };

        self.connection
            .call_method(
                Some(BLUEZ_SERVICE),
                path,
                Some(PROPERTIES_INTERFACE),
                "Set",
                &(interface, property, value),
            )
            .await
            .map_err(|e| {
                BluetoothError::Bus(format!("Set {}.{} failed: {}", interface, property, e))
            })?;

        Ok(())
    }
}

/// Sort key for object paths. A trailing index compares numerically, so
/// `/org/bluez/hci2` comes before `/org/bluez/hci10`.
fn path_sort_key(path: &str) -> (&str, Option<u64>, &str) {
    let stem = path.trim_end_matches(|c: char| c.is_ascii_digit());
    let index = path[stem.len()..].parse().ok();
    (stem, index, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implements_matches_exact_interface() {
        let object = ManagedObject {
            path: "/org/bluez/hci0".to_string(),
            interfaces: vec![
                "org.bluez.Adapter1".to_string(),
                "org.freedesktop.DBus.Properties".to_string(),
            ],
        };
        assert!(object.implements(ADAPTER_INTERFACE));
        assert!(!object.implements("org.bluez.Adapter"));
        assert!(!object.implements("org.bluez.Device1"));
    }

    #[test]
    fn property_value_display() {
        assert_eq!(PropertyValue::Bool(true).to_string(), "true");
        assert_eq!(PropertyValue::Str("pi".into()).to_string(), "'pi'");
    }

    #[test]
    fn adapter_paths_order_by_index() {
        let mut paths = vec![
            "/org/bluez/hci10",
            "/org/bluez/hci2",
            "/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF",
            "/org/bluez",
            "/org/bluez/hci0",
        ];
        paths.sort_by_key(|p| path_sort_key(*p));
        assert_eq!(
            paths,
            vec![
                "/org/bluez",
                "/org/bluez/hci0",
                "/org/bluez/hci2",
                "/org/bluez/hci10",
                "/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF",
            ]
        );
    }

    #[tokio::test]
    #[ignore = "requires a running BlueZ daemon on the system bus"]
    async fn system_bus_enumerates_objects() {
        let bus = SystemBus.connect().await.expect("system bus");
        let objects = bus.managed_objects().await.expect("managed objects");
        assert!(objects.windows(2).all(|w| w[0].path <= w[1].path));
    }
}
