use shydock_ipc::{DockVisibility, StateEvent, StateInfo};

use crate::core::Settings;
use crate::ipc::EventBroadcaster;

/// Publishes state change events to every event stream subscriber.
pub struct EventEmitter {
    broadcaster: EventBroadcaster,
}

impl EventEmitter {
    pub fn new(broadcaster: EventBroadcaster) -> Self {
        Self { broadcaster }
    }

    fn emit(&self, event: StateEvent) {
        tracing::debug!("Emitting event: {:?}", event);
        self.broadcaster.send(event);
    }

    /// Emit a dock, external display or permission state change
    pub fn emit_state_changed(
        &self,
        external_display_connected: bool,
        dock: DockVisibility,
        accessibility_trusted: bool,
    ) {
        self.emit(StateEvent::StateChanged {
            external_display_connected,
            dock,
            accessibility_trusted,
        });
    }

    /// Emit a non-fatal failure
    pub fn emit_warning(&self, message: &str) {
        self.emit(StateEvent::Warning {
            message: message.to_string(),
        });
    }

    pub fn emit_settings_changed(&self, settings: &Settings) {
        self.emit(StateEvent::SettingsChanged {
            min_width: settings.min_width,
            min_height: settings.min_height,
            launch_at_login: settings.launch_at_login,
        });
    }
}

/// Create a snapshot event from current state
pub fn create_snapshot(state: StateInfo) -> StateEvent {
    StateEvent::Snapshot { state }
}
