use shydock_ipc::{Command, Response, StateInfo};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::bridge::{AutomationBridge, AutomationOutcome, RetryPolicy};
use crate::core::{
    is_any_external_display_connected, DisplayReconfigEvent, DockController, SchedulerConfig,
    Settings, SettingsStore,
};
use crate::effect::Generation;
use crate::event_emitter::{create_snapshot, EventEmitter};
use crate::ipc::{IpcCommandWithResponse, SnapshotRequest};
use crate::platform::{AccessibilityPermission, DisplaySystem, DockAutomation, LoginItems};

use super::state_events::{capture_event_state, emit_state_change_events};
use super::worker::BridgeWorker;

/// Results flowing back into the control loop from workers and timers.
#[derive(Debug)]
pub enum Completion {
    Applied {
        generation: Generation,
        outcome: AutomationOutcome,
    },
    VerifyDue {
        generation: Generation,
    },
    Verified {
        generation: Generation,
        outcome: AutomationOutcome,
    },
}

/// Everything that can wake the control loop from outside.
pub struct SchedulerInputs {
    pub cmd_rx: mpsc::Receiver<IpcCommandWithResponse>,
    pub display_rx: mpsc::UnboundedReceiver<DisplayReconfigEvent>,
    pub snapshot_rx: mpsc::Receiver<SnapshotRequest>,
}

/// Platform services and configuration the scheduler is built from.
pub struct Services<D, A, L, P> {
    pub display_system: D,
    pub automation: A,
    pub login_items: L,
    pub accessibility: P,
    pub store: SettingsStore,
    pub config: SchedulerConfig,
}

/// Single serialized control flow that owns the dock controller.
///
/// Bridge calls run on the [`BridgeWorker`] thread and settle timers run as
/// tokio tasks; both report back through `completion_tx`, so every state
/// transition happens here, one at a time.
pub struct Scheduler<D, A, L, P> {
    pub(super) controller: DockController,
    pub(super) settings: Settings,
    pub(super) store: SettingsStore,
    pub(super) display_system: D,
    pub(super) login_items: L,
    pub(super) accessibility: P,
    pub(super) worker: BridgeWorker<A>,
    pub(super) config: SchedulerConfig,
    pub(super) event_emitter: EventEmitter,
    pub(super) completion_tx: mpsc::UnboundedSender<Completion>,
}

impl<D, A, L, P> Scheduler<D, A, L, P>
where
    D: DisplaySystem,
    A: DockAutomation + 'static,
    L: LoginItems,
    P: AccessibilityPermission,
{
    pub fn new(
        services: Services<D, A, L, P>,
        event_emitter: EventEmitter,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<Completion>)> {
        let Services {
            display_system,
            automation,
            login_items,
            accessibility,
            store,
            config,
        } = services;

        let bridge = AutomationBridge::new(
            automation,
            RetryPolicy {
                max_retries: config.max_retries,
                retry_delay: config.retry_delay,
            },
        );
        let worker = BridgeWorker::spawn(bridge)?;
        let settings = store.load();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let scheduler = Self {
            controller: DockController::new(),
            settings,
            store,
            display_system,
            login_items,
            accessibility,
            worker,
            config,
            event_emitter,
            completion_tx,
        };
        Ok((scheduler, completion_rx))
    }

    pub async fn run(
        mut self,
        mut completion_rx: mpsc::UnboundedReceiver<Completion>,
        inputs: SchedulerInputs,
    ) {
        let SchedulerInputs {
            mut cmd_rx,
            mut display_rx,
            mut snapshot_rx,
        } = inputs;

        self.start();

        let mut topology_deadline: Option<Instant> = None;
        let mut permission_poll = tokio::time::interval_at(
            Instant::now() + self.config.permission_poll,
            self.config.permission_poll,
        );
        permission_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = topology_deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                Some((cmd, resp_tx)) = cmd_rx.recv() => {
                    let quit = matches!(cmd, Command::Quit);
                    let response = self.handle_command(&cmd);
                    let _ = resp_tx.try_send(response);
                    if quit {
                        tracing::info!("Quit command received");
                        break;
                    }
                }
                Some(event) = display_rx.recv() => {
                    // Restart the quiet period on every event of a hotplug burst
                    tracing::debug!(
                        "Display reconfiguration: id={} flags={:#x}",
                        event.display_id,
                        event.flags
                    );
                    topology_deadline = Some(Instant::now() + self.config.debounce);
                }
                _ = tokio::time::sleep_until(deadline), if topology_deadline.is_some() => {
                    topology_deadline = None;
                    self.reevaluate_topology();
                }
                Some(completion) = completion_rx.recv() => {
                    self.handle_completion(completion);
                }
                _ = permission_poll.tick() => {
                    self.check_accessibility();
                }
                Some(reply) = snapshot_rx.recv() => {
                    let _ = reply.send(create_snapshot(self.state_info()));
                }
            }
        }

        tracing::info!("Scheduler exiting");
    }

    /// Permission check, login item sync and the first topology evaluation.
    /// The resulting apply is followed by the first verification read.
    fn start(&mut self) {
        tracing::info!(
            "Starting with filter {}x{} (launch at login: {})",
            self.settings.min_width,
            self.settings.min_height,
            self.settings.launch_at_login
        );

        if !self.accessibility.is_trusted() {
            // System Events still answers without it, but toggling the Dock will fail
            tracing::warn!("Accessibility permission not granted, requesting...");
            self.accessibility.request();
            self.check_accessibility();
        }

        if self.login_items.is_enabled() != self.settings.launch_at_login {
            if let Err(e) = self.login_items.set_enabled(self.settings.launch_at_login) {
                tracing::warn!("Failed to sync login item: {:#}", e);
            }
        }

        self.reevaluate_topology();
    }

    pub(super) fn is_external_display_connected(&self) -> bool {
        let displays = self.display_system.get_displays();
        is_any_external_display_connected(&displays, &self.settings.filter())
    }

    fn reevaluate_topology(&mut self) {
        let pre = capture_event_state(&self.controller);
        let connected = self.is_external_display_connected();
        let effects = self.controller.on_topology_changed(connected);
        self.execute_effects(effects);
        emit_state_change_events(&self.event_emitter, &self.controller, &pre);
    }

    fn check_accessibility(&mut self) {
        let trusted = self.accessibility.is_trusted();
        if trusted == self.controller.accessibility_trusted() {
            return;
        }
        let pre = capture_event_state(&self.controller);
        let connected = self.is_external_display_connected();
        let effects = self.controller.on_accessibility_changed(trusted, connected);
        self.execute_effects(effects);
        emit_state_change_events(&self.event_emitter, &self.controller, &pre);
    }

    fn handle_command(&mut self, cmd: &Command) -> Response {
        let pre = capture_event_state(&self.controller);
        let result = self.process_command(cmd);
        self.execute_effects(result.effects);
        emit_state_change_events(&self.event_emitter, &self.controller, &pre);
        result.response
    }

    fn handle_completion(&mut self, completion: Completion) {
        let pre = capture_event_state(&self.controller);
        let effects = match completion {
            Completion::Applied {
                generation,
                outcome,
            } => self.controller.on_apply_completed(generation, &outcome),
            Completion::VerifyDue { generation } => self.controller.on_verify_due(generation),
            Completion::Verified {
                generation,
                outcome,
            } => self.controller.on_verified(generation, &outcome),
        };
        self.execute_effects(effects);
        emit_state_change_events(&self.event_emitter, &self.controller, &pre);
    }

    pub(super) fn state_info(&self) -> StateInfo {
        StateInfo {
            external_display_connected: self.controller.external_display_connected(),
            dock: self.controller.visibility(),
            min_width: self.settings.min_width,
            min_height: self.settings.min_height,
            launch_at_login: self.settings.launch_at_login,
            accessibility_trusted: self.controller.accessibility_trusted(),
            generation: self.controller.generation(),
            last_error: self.controller.last_error().map(str::to_string),
        }
    }
}
