// crates/chitfund-daemon/src/state.rs
//
// Service lifecycle state machine for the chit fund daemon.
//
// Valid transitions:
//   Initializing -> Ready
//   Any state -> ShuttingDown

use std::fmt;

/// Lifecycle states of the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Loading configuration and opening the store.
    Initializing,
    /// Serving RPC requests.
    Ready,
    /// Draining requests and flushing the store.
    ShuttingDown,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Initializing => write!(f, "Initializing"),
            ServiceState::Ready => write!(f, "Ready"),
            ServiceState::ShuttingDown => write!(f, "ShuttingDown"),
        }
    }
}

pub struct ServiceStateMachine {
    pub current: ServiceState,
}

impl ServiceStateMachine {
    pub fn new() -> Self {
        Self {
            current: ServiceState::Initializing,
        }
    }

    /// Attempt to transition to a new state.
    pub fn transition(&mut self, new_state: ServiceState) -> Result<(), String> {
        let valid = matches!(
            (self.current, new_state),
            (ServiceState::Initializing, ServiceState::Ready) | (_, ServiceState::ShuttingDown)
        );

        if valid {
            tracing::info!("State transition: {} -> {}", self.current, new_state);
            self.current = new_state;
            Ok(())
        } else {
            Err(format!(
                "Invalid state transition: {} -> {}",
                self.current, new_state
            ))
        }
    }
}

impl Default for ServiceStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
