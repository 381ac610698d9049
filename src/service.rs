//! Service orchestration: ordered startup, then park until told to stop.

use std::future::Future;
use std::sync::Arc;

use btrouter_audio::{AudioBackendConfigurator, AudioReport};
use btrouter_bluetooth::{AdapterConfigurator, AdapterHandle, BluetoothError, BusConnector};
use btrouter_core::{CommandRunner, RouterConfig};
use thiserror::Error;
use tracing::{debug, info};

use crate::lifecycle::{Lifecycle, ServiceState};
use crate::preflight::report_system_setup;
use crate::privilege::PrivilegeCheck;

/// Conditions that abort startup.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("This program must be run as root. Please run with sudo.")]
    InsufficientPrivilege,

    #[error("Bluetooth setup failed: {0}")]
    Adapter(#[from] BluetoothError),

    #[error("Service was already started (state: {0})")]
    AlreadyStarted(ServiceState),
}

impl StartupError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// The Bluetooth audio router.
pub struct Service {
    config: RouterConfig,
    connector: Arc<dyn BusConnector>,
    runner: Arc<dyn CommandRunner>,
    privilege: Box<dyn PrivilegeCheck>,
    preflight: bool,
    lifecycle: Arc<Lifecycle>,
}

impl Service {
    pub fn new(
        config: RouterConfig,
        connector: Arc<dyn BusConnector>,
        runner: Arc<dyn CommandRunner>,
        privilege: Box<dyn PrivilegeCheck>,
    ) -> Self {
        Self {
            config,
            connector,
            runner,
            privilege,
            preflight: false,
            lifecycle: Arc::new(Lifecycle::new()),
        }
    }

    /// Report missing system components once the privilege check passes.
    pub fn with_preflight(mut self) -> Self {
        self.preflight = true;
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Handle for observing state and requesting a stop from elsewhere.
    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        self.lifecycle.clone()
    }

    /// Run startup, then block until `shutdown` resolves or a stop is
    /// requested through the lifecycle.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        self.wait_for_shutdown(shutdown).await;
        Ok(())
    }

    /// Initializing -> AdapterReady -> Running.
    ///
    /// Audio configuration never fails startup; only privilege and adapter
    /// problems do. The caller reports the returned error.
    pub async fn start(&self) -> Result<AudioReport, StartupError> {
        let state = self.lifecycle.state();
        if state != ServiceState::Initializing {
            return Err(StartupError::AlreadyStarted(state));
        }

        if !self.privilege.is_elevated() {
            return Err(StartupError::InsufficientPrivilege);
        }

        if self.preflight {
            report_system_setup(self.runner.as_ref()).await;
        }

        let adapter = self.configure_adapter().await?;
        self.lifecycle.advance(ServiceState::AdapterReady);
        info!("Adapter {} ready", adapter.name());

        let audio = AudioBackendConfigurator::new(
            self.runner.clone(),
            self.config.audio_target.clone(),
            self.config.audio.timing,
        );
        // Each step already logged its own outcome.
        let report = audio.configure().await;
        debug!(
            "Audio configuration finished: {} step(s), {} failed",
            report.steps.len(),
            report.failures().count()
        );

        self.lifecycle.advance(ServiceState::Running);
        info!("Bluetooth audio router is running as '{}'", self.config.alias);
        Ok(report)
    }

    /// Park in Running until `shutdown` resolves or a stop is requested,
    /// then run the stop sequence exactly once.
    pub async fn wait_for_shutdown<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                self.lifecycle.request_stop();
            }
            _ = self.lifecycle.stop_requested() => {}
        }

        if self.lifecycle.advance(ServiceState::Stopping) {
            info!("Exiting the Bluetooth audio router...");
            self.lifecycle.advance(ServiceState::Stopped);
            info!("Bluetooth audio router stopped.");
        }
    }

    async fn configure_adapter(&self) -> Result<AdapterHandle, StartupError> {
        info!("Setting up Bluetooth audio routing...");
        let configurator =
            AdapterConfigurator::new(self.connector.clone(), self.config.adapter_properties());

        Ok(configurator.configure().await?)
    }
}
