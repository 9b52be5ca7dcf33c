use shydock_ipc::DockVisibility;

use crate::bridge::{AutomationOutcome, BridgeError};
use crate::effect::{Effect, Generation};

/// Auto-hide state machine.
///
/// Every apply bumps the generation. Apply and verification results carry the
/// generation they were issued under, and anything older than the current
/// generation is dropped, so the most recently issued apply always wins.
/// The controller never performs I/O itself; it returns [`Effect`]s.
#[derive(Debug)]
pub struct DockController {
    visibility: DockVisibility,
    /// Last observed "qualifying external display" answer
    connected: bool,
    /// Forces the next topology evaluation to apply even if `connected` is
    /// unchanged. Set initially and after a failed apply.
    needs_apply: bool,
    accessibility_trusted: bool,
    generation: Generation,
    last_error: Option<String>,
}

impl Default for DockController {
    fn default() -> Self {
        Self {
            visibility: DockVisibility::Unknown,
            connected: false,
            needs_apply: true,
            accessibility_trusted: true,
            generation: 0,
            last_error: None,
        }
    }
}

impl DockController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visibility(&self) -> DockVisibility {
        self.visibility
    }

    pub fn external_display_connected(&self) -> bool {
        self.connected
    }

    pub fn accessibility_trusted(&self) -> bool {
        self.accessibility_trusted
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// An unchanged answer only re-reads the Dock, so a preference changed
    /// outside the daemon is picked up on the next reconfiguration.
    pub fn on_topology_changed(&mut self, connected: bool) -> Vec<Effect> {
        if !self.needs_apply && self.connected == connected {
            tracing::debug!("Topology unchanged (connected={}), verifying only", connected);
            return vec![Effect::QueryAutohide {
                generation: self.generation,
            }];
        }

        tracing::info!(
            "External display {}",
            if connected { "connected" } else { "disconnected" }
        );
        self.connected = connected;
        self.needs_apply = false;
        self.issue_apply(!connected)
    }

    pub fn on_manual_toggle(&mut self) -> Vec<Effect> {
        let hide = self.visibility != DockVisibility::Hidden;
        tracing::info!("Manual toggle: {} dock", if hide { "hiding" } else { "showing" });
        self.issue_apply(hide)
    }

    /// Re-evaluate after the resolution filter changed. `connected` must be
    /// computed with the new filter.
    pub fn on_settings_changed(&mut self, connected: bool) -> Vec<Effect> {
        self.on_topology_changed(connected)
    }

    /// Record a permission poll. Losing the permission warns; regaining it
    /// re-applies the topology answer, since applies made without it failed.
    pub fn on_accessibility_changed(&mut self, trusted: bool, connected: bool) -> Vec<Effect> {
        if trusted == self.accessibility_trusted {
            return vec![];
        }
        self.accessibility_trusted = trusted;

        if trusted {
            tracing::info!("Accessibility permission granted");
            self.needs_apply = true;
            self.on_topology_changed(connected)
        } else {
            vec![Effect::Warn {
                message: "Accessibility permission revoked; the Dock cannot be changed"
                    .to_string(),
            }]
        }
    }

    fn issue_apply(&mut self, hide: bool) -> Vec<Effect> {
        self.generation += 1;
        self.visibility = DockVisibility::from_autohide(hide);
        self.last_error = None;
        vec![Effect::ApplyAutohide {
            generation: self.generation,
            hide,
        }]
    }

    pub fn on_apply_completed(
        &mut self,
        generation: Generation,
        outcome: &AutomationOutcome,
    ) -> Vec<Effect> {
        if self.is_stale(generation, "apply") {
            return vec![];
        }

        let mut effects = Vec::new();
        if !outcome.success {
            let message = format!("Failed to update dock: {}", describe_error(outcome));
            // Let the next topology event try again instead of being deduplicated
            self.needs_apply = true;
            self.last_error = Some(message.clone());
            effects.push(Effect::Warn { message });
        }

        // Verify even after a failure so the optimistic state gets corrected
        effects.push(Effect::ScheduleVerify { generation });
        effects
    }

    pub fn on_verify_due(&self, generation: Generation) -> Vec<Effect> {
        if self.is_stale(generation, "verification") {
            return vec![];
        }
        vec![Effect::QueryAutohide { generation }]
    }

    pub fn on_verified(
        &mut self,
        generation: Generation,
        outcome: &AutomationOutcome,
    ) -> Vec<Effect> {
        if self.is_stale(generation, "verification result") {
            return vec![];
        }

        match (outcome.success, outcome.value) {
            (true, Some(autohide)) => {
                let actual = DockVisibility::from_autohide(autohide);
                if self.visibility != DockVisibility::Unknown && self.visibility != actual {
                    tracing::info!(
                        "Dock state corrected by verification: {} -> {}",
                        self.visibility,
                        actual
                    );
                }
                self.visibility = actual;
                vec![]
            }
            _ => {
                let message = format!("Failed to read dock state: {}", describe_error(outcome));
                self.last_error = Some(message.clone());
                vec![Effect::Warn { message }]
            }
        }
    }

    fn is_stale(&self, generation: Generation, what: &str) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "Discarding stale {} (generation {} < {})",
                what,
                generation,
                self.generation
            );
            return true;
        }
        false
    }
}

fn describe_error(outcome: &AutomationOutcome) -> String {
    match &outcome.error {
        Some(e) => e.to_string(),
        None => BridgeError::Rejected {
            message: "no value returned".to_string(),
        }
        .to_string(),
    }
}
