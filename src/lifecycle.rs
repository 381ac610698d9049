//! Service state machine and one-shot stop request.

use std::fmt;

use tokio::sync::watch;
use tracing::{debug, warn};

/// Where the service is in its life.
///
/// States only ever move forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceState {
    Initializing,
    AdapterReady,
    Running,
    Stopping,
    Stopped,
}

impl ServiceState {
    /// The only state this one may move to.
    pub fn successor(self) -> Option<ServiceState> {
        match self {
            ServiceState::Initializing => Some(ServiceState::AdapterReady),
            ServiceState::AdapterReady => Some(ServiceState::Running),
            ServiceState::Running => Some(ServiceState::Stopping),
            ServiceState::Stopping => Some(ServiceState::Stopped),
            ServiceState::Stopped => None,
        }
    }

    /// Whether `next` is a legal transition from this state.
    pub fn can_advance_to(self, next: ServiceState) -> bool {
        self.successor() == Some(next)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Initializing => "initializing",
            ServiceState::AdapterReady => "adapter ready",
            ServiceState::Running => "running",
            ServiceState::Stopping => "stopping",
            ServiceState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Shared lifecycle of one service instance.
///
/// The state is published on a watch channel so observers can follow it;
/// stop requests go through a second channel whose flag can only be set once.
#[derive(Debug)]
pub struct Lifecycle {
    state: watch::Sender<ServiceState>,
    stop: watch::Sender<bool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: watch::channel(ServiceState::Initializing).0,
            stop: watch::channel(false).0,
        }
    }

    /// Current state.
    pub fn state(&self) -> ServiceState {
        *self.state.borrow()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.state.subscribe()
    }

    /// Move to `next` if it is the current state's successor.
    pub(crate) fn advance(&self, next: ServiceState) -> bool {
        let advanced = self.state.send_if_modified(|state| {
            if state.can_advance_to(next) {
                *state = next;
                true
            } else {
                false
            }
        });

        if advanced {
            debug!("Service state -> {}", next);
        } else {
            warn!("Ignored transition {} -> {}", self.state(), next);
        }
        advanced
    }

    /// Ask the service to stop.
    ///
    /// Returns `true` for the first request only; later requests are no-ops.
    pub fn request_stop(&self) -> bool {
        self.stop.send_if_modified(|requested| {
            if *requested {
                false
            } else {
                *requested = true;
                true
            }
        })
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    /// Resolve once a stop has been requested (immediately if it already was).
    pub async fn stop_requested(&self) {
        let mut requested = self.stop.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = requested.wait_for(|requested| *requested).await;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
