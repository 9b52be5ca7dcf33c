use crate::bridge::{AutomationOutcome, BridgeError};
use crate::effect::Effect;
use crate::platform::{AccessibilityPermission, DisplaySystem, DockAutomation, LoginItems};

use super::scheduler::{Completion, Scheduler};
use super::worker::worker_lost;

impl<D, A, L, P> Scheduler<D, A, L, P>
where
    D: DisplaySystem,
    A: DockAutomation + 'static,
    L: LoginItems,
    P: AccessibilityPermission,
{
    /// Execute side effects. Nothing here blocks the control loop: bridge
    /// calls and delays report back as [`Completion`]s.
    pub(super) fn execute_effects(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ApplyAutohide { generation, hide } => {
                    let reply = self.worker.apply(hide);
                    let tx = self.completion_tx.clone();
                    tokio::spawn(async move {
                        let outcome = reply.await.unwrap_or_else(|_| worker_lost());
                        let _ = tx.send(Completion::Applied {
                            generation,
                            outcome,
                        });
                    });
                }
                Effect::ScheduleVerify { generation } => {
                    let delay = self.config.settle_delay;
                    let tx = self.completion_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(Completion::VerifyDue { generation });
                    });
                }
                Effect::QueryAutohide { generation } => {
                    let reply = self.worker.query();
                    let timeout = self.config.verify_timeout;
                    let tx = self.completion_tx.clone();
                    tokio::spawn(async move {
                        let outcome = match tokio::time::timeout(timeout, reply).await {
                            Ok(Ok(outcome)) => outcome,
                            Ok(Err(_)) => worker_lost(),
                            Err(_) => AutomationOutcome::failed(BridgeError::TimedOut),
                        };
                        let _ = tx.send(Completion::Verified {
                            generation,
                            outcome,
                        });
                    });
                }
                Effect::Warn { message } => {
                    tracing::warn!("{}", message);
                    self.event_emitter.emit_warning(&message);
                }
            }
        }
    }
}
