//! System degradation state shared by the controller and the memory store.
//!
//! The controller owns the single writable [`StateCell`]; every other
//! component receives a read-only [`StateView`] of the same cell.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Degradation level gating which features run and at what cost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemState {
    #[default]
    Full,
    Constrained,
    Offline,
    Fallback,
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Full => "full",
            Self::Constrained => "constrained",
            Self::Offline => "offline",
            Self::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Resource availability in percent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemResources {
    pub cpu: f64,
    pub memory: f64,
    pub bandwidth: f64,
}

impl SystemResources {
    pub const CPU_FLOOR: f64 = 30.0;
    pub const MEMORY_FLOOR: f64 = 30.0;
    pub const BANDWIDTH_FLOOR: f64 = 10.0;

    pub fn new(cpu: f64, memory: f64, bandwidth: f64) -> Self {
        Self {
            cpu,
            memory,
            bandwidth,
        }
    }

    /// Compute/memory scarcity wins over bandwidth scarcity.
    pub fn diagnose(&self) -> SystemState {
        if self.cpu < Self::CPU_FLOOR || self.memory < Self::MEMORY_FLOOR {
            SystemState::Constrained
        } else if self.bandwidth < Self::BANDWIDTH_FLOOR {
            SystemState::Offline
        } else {
            SystemState::Full
        }
    }
}

impl Default for SystemResources {
    fn default() -> Self {
        Self::new(100.0, 100.0, 100.0)
    }
}

/// Feature profile enabled by proactive activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSet {
    #[default]
    Full,
    /// Non-essential work (pattern telemetry) is skipped.
    Lightweight,
}

impl FeatureSet {
    pub fn telemetry_enabled(&self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Writable state owned by the controller.
#[derive(Debug, Default)]
pub struct StateCell {
    inner: Arc<RwLock<SystemState>>,
}

impl StateCell {
    pub fn new(initial: SystemState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn get(&self) -> SystemState {
        *self.inner.read()
    }

    /// Move to `next`, returning the previous state.
    pub(crate) fn transition(&self, next: SystemState, reason: &str) -> SystemState {
        let mut guard = self.inner.write();
        let previous = *guard;
        *guard = next;
        if previous != next {
            info!(from = %previous, to = %next, reason, "system state transition");
        }
        previous
    }

    pub fn view(&self) -> StateView {
        StateView {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only handle onto a [`StateCell`].
#[derive(Clone, Debug)]
pub struct StateView {
    inner: Arc<RwLock<SystemState>>,
}

impl StateView {
    /// A view that never changes, for components used without a controller.
    pub fn fixed(state: SystemState) -> Self {
        StateCell::new(state).view()
    }

    pub fn get(&self) -> SystemState {
        *self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnose_thresholds() {
        assert_eq!(SystemResources::default().diagnose(), SystemState::Full);
        assert_eq!(
            SystemResources::new(29.9, 100.0, 100.0).diagnose(),
            SystemState::Constrained
        );
        assert_eq!(
            SystemResources::new(100.0, 10.0, 100.0).diagnose(),
            SystemState::Constrained
        );
        assert_eq!(
            SystemResources::new(100.0, 100.0, 9.0).diagnose(),
            SystemState::Offline
        );
        // Constrained takes precedence over offline.
        assert_eq!(
            SystemResources::new(10.0, 100.0, 5.0).diagnose(),
            SystemState::Constrained
        );
        assert_eq!(
            SystemResources::new(30.0, 30.0, 10.0).diagnose(),
            SystemState::Full
        );
    }

    #[test]
    fn test_view_observes_transitions() {
        let cell = StateCell::new(SystemState::Full);
        let view = cell.view();
        let previous = cell.transition(SystemState::Offline, "test");
        assert_eq!(previous, SystemState::Full);
        assert_eq!(view.get(), SystemState::Offline);
    }

    #[test]
    fn test_state_serializes_lowercase() {
        let json = serde_json::to_string(&SystemState::Constrained).unwrap();
        assert_eq!(json, "\"constrained\"");
        assert_eq!(SystemState::Fallback.to_string(), "fallback");
    }
}
