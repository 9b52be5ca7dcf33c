use serde::{Deserialize, Serialize};

use crate::{DockVisibility, StateInfo};

/// Event filter for subscribing to specific event types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Subscribe to dock, external display and permission state changes
    #[serde(default)]
    pub dock: bool,
    /// Subscribe to non-fatal warnings (failed dock operations)
    #[serde(default)]
    pub warning: bool,
    /// Subscribe to settings changes
    #[serde(default)]
    pub settings: bool,
}

impl EventFilter {
    /// Create a filter that subscribes to all events
    pub fn all() -> Self {
        Self {
            dock: true,
            warning: true,
            settings: true,
        }
    }

    /// Parse a comma separated list such as `dock,warning`
    pub fn parse_list(s: &str) -> Result<Self, String> {
        let mut filter = Self::default();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part {
                "dock" => filter.dock = true,
                "warning" => filter.warning = true,
                "settings" => filter.settings = true,
                other => {
                    return Err(format!(
                        "Unknown event type: {} (use dock, warning, settings)",
                        other
                    ))
                }
            }
        }
        Ok(filter)
    }

    /// Check if the filter matches a given event
    pub fn matches(&self, event: &StateEvent) -> bool {
        match event {
            StateEvent::StateChanged { .. } => self.dock,
            StateEvent::Warning { .. } => self.warning,
            StateEvent::SettingsChanged { .. } => self.settings,
            StateEvent::Snapshot { .. } => true, // Snapshots always pass filter
        }
    }

    /// Check if any filter is set
    pub fn any(&self) -> bool {
        self.dock || self.warning || self.settings
    }
}

/// Request to subscribe to state events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Whether to send a snapshot on connection
    #[serde(default)]
    pub snapshot: bool,
    /// Event filter (if not set or all false, subscribes to all events)
    #[serde(default)]
    pub filter: EventFilter,
}

impl SubscribeRequest {
    /// Create a subscribe request with snapshot enabled
    pub fn with_snapshot() -> Self {
        Self {
            snapshot: true,
            filter: EventFilter::default(),
        }
    }

    /// Get the effective filter (all if none specified)
    pub fn effective_filter(&self) -> EventFilter {
        if self.filter.any() {
            self.filter.clone()
        } else {
            EventFilter::all()
        }
    }
}

/// State change events sent to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    StateChanged {
        external_display_connected: bool,
        dock: DockVisibility,
        accessibility_trusted: bool,
    },
    Warning {
        message: String,
    },
    SettingsChanged {
        min_width: f64,
        min_height: f64,
        launch_at_login: bool,
    },
    Snapshot {
        state: StateInfo,
    },
}
