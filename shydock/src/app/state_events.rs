use shydock_ipc::DockVisibility;

use crate::core::DockController;
use crate::event_emitter::EventEmitter;

/// State captured before handling an input for event comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreEventState {
    pub connected: bool,
    pub dock: DockVisibility,
    pub accessibility_trusted: bool,
}

pub fn capture_event_state(controller: &DockController) -> PreEventState {
    PreEventState {
        connected: controller.external_display_connected(),
        dock: controller.visibility(),
        accessibility_trusted: controller.accessibility_trusted(),
    }
}

/// Emit a state change event if the observable state moved
pub fn emit_state_change_events(
    event_emitter: &EventEmitter,
    controller: &DockController,
    pre: &PreEventState,
) {
    let post = capture_event_state(controller);
    if post != *pre {
        event_emitter.emit_state_changed(post.connected, post.dock, post.accessibility_trusted);
    }
}
