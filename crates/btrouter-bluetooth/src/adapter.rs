//! Bluetooth adapter discovery and configuration.
//!
//! Finds the adapter through the object manager and applies the router's
//! target properties. Every property is written unconditionally: the values
//! are absolute, so re-applying them is harmless.

use std::sync::Arc;

use btrouter_core::AdapterProperties;
use tracing::{debug, info};

use crate::bus::{BusConnector, ManagementBus, PropertyValue, ADAPTER_INTERFACE};
use crate::error::{BluetoothError, Result};

/// Identifies the adapter object that was configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterHandle {
    path: String,
}

impl AdapterHandle {
    /// Object path of the adapter (e.g. `/org/bluez/hci0`).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Kernel name of the adapter (e.g. `hci0`).
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Configures the system's Bluetooth adapter.
pub struct AdapterConfigurator {
    connector: Arc<dyn BusConnector>,
    properties: AdapterProperties,
}

impl AdapterConfigurator {
    /// Create a configurator that will apply `properties`.
    pub fn new(connector: Arc<dyn BusConnector>, properties: AdapterProperties) -> Self {
        Self {
            connector,
            properties,
        }
    }

    /// Target property values.
    pub fn properties(&self) -> &AdapterProperties {
        &self.properties
    }

    /// Connect to the bus, find the adapter and apply every property.
    ///
    /// Properties already written before a failure are left in place.
    pub async fn configure(&self) -> Result<AdapterHandle> {
        let bus = self.connector.connect().await?;
        let adapter = find_adapter(bus.as_ref()).await?;
        info!("Using Bluetooth adapter: {}", adapter.name());

        apply_properties(bus.as_ref(), &adapter, &self.properties).await?;

        info!(
            "Bluetooth adapter configured successfully. Configured as: '{}'",
            self.properties.alias
        );
        Ok(adapter)
    }
}

/// Return the first object implementing the adapter interface.
pub async fn find_adapter(bus: &dyn ManagementBus) -> Result<AdapterHandle> {
    bus.managed_objects()
        .await?
        .into_iter()
        .find(|object| object.implements(ADAPTER_INTERFACE))
        .map(|object| AdapterHandle { path: object.path })
        .ok_or(BluetoothError::AdapterNotFound)
}

/// Write the four adapter properties, one call each, stopping at the first
/// rejection.
pub async fn apply_properties(
    bus: &dyn ManagementBus,
    adapter: &AdapterHandle,
    properties: &AdapterProperties,
) -> Result<()> {
    for (name, value) in property_assignments(properties) {
        bus.set_property(adapter.path(), ADAPTER_INTERFACE, name, &value)
            .await
            .map_err(|e| BluetoothError::PropertyRejected {
                property: name,
                reason: e.to_string(),
            })?;
        debug!("{}: {} = {}", adapter.name(), name, value);
    }
    Ok(())
}

/// Property writes in application order.
pub fn property_assignments(properties: &AdapterProperties) -> [(&'static str, PropertyValue); 4] {
    [
        ("Powered", PropertyValue::Bool(properties.powered)),
        ("Alias", PropertyValue::Str(properties.alias.clone())),
        ("Discoverable", PropertyValue::Bool(properties.discoverable)),
        ("Pairable", PropertyValue::Bool(properties.pairable)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ManagedObject;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type SetCall = (String, String, String, PropertyValue);

    /// In-memory bus that records every write.
    #[derive(Default)]
    struct RecordingBus {
        objects: Vec<ManagedObject>,
        reject: Option<&'static str>,
        calls: Mutex<Vec<SetCall>>,
        state: Mutex<BTreeMap<(String, String), PropertyValue>>,
    }

    impl RecordingBus {
        fn with_objects(objects: Vec<ManagedObject>) -> Self {
            Self {
                objects,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<SetCall> {
            self.calls.lock().unwrap().clone()
        }

        fn state(&self) -> BTreeMap<(String, String), PropertyValue> {
            self.state.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ManagementBus for RecordingBus {
        async fn managed_objects(&self) -> Result<Vec<ManagedObject>> {
            Ok(self.objects.clone())
        }

        async fn set_property(
            &self,
            path: &str,
            interface: &str,
            property: &str,
            value: &PropertyValue,
        ) -> Result<()> {
            self.calls.lock().unwrap().push((
                path.to_string(),
                interface.to_string(),
                property.to_string(),
                value.clone(),
            ));
            if self.reject == Some(property) {
                return Err(BluetoothError::Bus("org.bluez.Error.Failed".to_string()));
            }
            self.state
                .lock()
                .unwrap()
                .insert((path.to_string(), property.to_string()), value.clone());
            Ok(())
        }
    }

    struct SharedConnector {
        bus: Arc<RecordingBus>,
        connects: AtomicUsize,
    }

    impl SharedConnector {
        fn new(bus: Arc<RecordingBus>) -> Arc<Self> {
            Arc::new(Self {
                bus,
                connects: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl BusConnector for SharedConnector {
        async fn connect(&self) -> Result<Box<dyn ManagementBus>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(self.bus.clone()))
        }
    }

    struct UnreachableBus;

    #[async_trait]
    impl BusConnector for UnreachableBus {
        async fn connect(&self) -> Result<Box<dyn ManagementBus>> {
            Err(BluetoothError::Bus("Failed to connect to system bus".to_string()))
        }
    }

    fn object(path: &str, interfaces: &[&str]) -> ManagedObject {
        ManagedObject {
            path: path.to_string(),
            interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn properties() -> AdapterProperties {
        AdapterProperties {
            powered: true,
            alias: "raspberrypi".to_string(),
            discoverable: true,
            pairable: false,
        }
    }

    fn bluez_tree() -> Vec<ManagedObject> {
        vec![
            object("/org/bluez", &["org.bluez.AgentManager1"]),
            object("/org/bluez/hci0", &["org.bluez.Adapter1", "org.bluez.Media1"]),
            object("/org/bluez/hci0/dev_00_11_22_33_44_55", &["org.bluez.Device1"]),
        ]
    }

    #[test]
    fn handle_name_is_last_path_segment() {
        let handle = AdapterHandle {
            path: "/org/bluez/hci1".to_string(),
        };
        assert_eq!(handle.name(), "hci1");
    }

    #[test]
    fn assignments_follow_fixed_order() {
        let names: Vec<_> = property_assignments(&properties())
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(names, ["Powered", "Alias", "Discoverable", "Pairable"]);
    }

    #[tokio::test]
    async fn configures_first_adapter_with_four_writes() {
        let bus = Arc::new(RecordingBus::with_objects(bluez_tree()));
        let configurator =
            AdapterConfigurator::new(SharedConnector::new(bus.clone()), properties());

        let handle = configurator.configure().await.unwrap();
        assert_eq!(handle.path(), "/org/bluez/hci0");

        let calls = bus.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls
            .iter()
            .all(|(path, iface, _, _)| path == "/org/bluez/hci0" && iface == ADAPTER_INTERFACE));
        assert_eq!(calls[0].3, PropertyValue::Bool(true));
        assert_eq!(calls[1].3, PropertyValue::Str("raspberrypi".to_string()));
        assert_eq!(calls[2].3, PropertyValue::Bool(true));
        assert_eq!(calls[3].3, PropertyValue::Bool(false));
    }

    #[tokio::test]
    async fn first_adapter_in_enumeration_order_wins() {
        let bus = Arc::new(RecordingBus::with_objects(vec![
            object("/org/bluez/hci1", &["org.bluez.Adapter1"]),
            object("/org/bluez/hci0", &["org.bluez.Adapter1"]),
        ]));
        let handle = find_adapter(bus.as_ref()).await.unwrap();
        assert_eq!(handle.path(), "/org/bluez/hci1");
    }

    #[tokio::test]
    async fn no_adapter_means_no_writes() {
        let bus = Arc::new(RecordingBus::with_objects(vec![object(
            "/org/bluez",
            &["org.bluez.AgentManager1"],
        )]));
        let configurator =
            AdapterConfigurator::new(SharedConnector::new(bus.clone()), properties());

        let result = configurator.configure().await;
        assert!(matches!(result, Err(BluetoothError::AdapterNotFound)));
        assert!(bus.calls().is_empty());
    }

    #[tokio::test]
    async fn bus_connection_failure_is_reported() {
        let configurator = AdapterConfigurator::new(Arc::new(UnreachableBus), properties());
        let result = configurator.configure().await;
        assert!(matches!(result, Err(BluetoothError::Bus(_))));
    }

    #[tokio::test]
    async fn rejected_property_fails_without_rollback() {
        let bus = Arc::new(RecordingBus {
            objects: bluez_tree(),
            reject: Some("Discoverable"),
            ..RecordingBus::default()
        });
        let configurator =
            AdapterConfigurator::new(SharedConnector::new(bus.clone()), properties());

        let result = configurator.configure().await;
        assert!(matches!(
            result,
            Err(BluetoothError::PropertyRejected { property: "Discoverable", .. })
        ));

        // Powered and Alias stay applied; Pairable is never attempted.
        let calls = bus.calls();
        assert_eq!(calls.len(), 3);
        let state = bus.state();
        assert_eq!(state.len(), 2);
        assert!(state.contains_key(&("/org/bluez/hci0".to_string(), "Powered".to_string())));
        assert!(state.contains_key(&("/org/bluez/hci0".to_string(), "Alias".to_string())));
    }

    #[tokio::test]
    async fn applying_twice_matches_applying_once() {
        let once = Arc::new(RecordingBus::with_objects(bluez_tree()));
        let twice = Arc::new(RecordingBus::with_objects(bluez_tree()));

        for props in [
            properties(),
            AdapterProperties {
                powered: true,
                alias: "living room".to_string(),
                discoverable: false,
                pairable: true,
            },
        ] {
            let handle = find_adapter(once.as_ref()).await.unwrap();
            apply_properties(once.as_ref(), &handle, &props).await.unwrap();

            let handle = find_adapter(twice.as_ref()).await.unwrap();
            apply_properties(twice.as_ref(), &handle, &props).await.unwrap();
            apply_properties(twice.as_ref(), &handle, &props).await.unwrap();

            assert_eq!(once.state(), twice.state());
        }
    }

    #[tokio::test]
    async fn each_configure_opens_one_connection() {
        let bus = Arc::new(RecordingBus::with_objects(bluez_tree()));
        let connector = SharedConnector::new(bus);
        let configurator = AdapterConfigurator::new(connector.clone(), properties());
        configurator.configure().await.unwrap();
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    }
}
