use std::sync::mpsc as std_mpsc;

use anyhow::{Context, Result};
use tokio::sync::oneshot;

use crate::bridge::{AutomationBridge, AutomationOutcome, BridgeError};
use crate::platform::DockAutomation;

type Job<A> = Box<dyn FnOnce(&AutomationBridge<A>) + Send>;

/// Dedicated thread that owns the automation bridge and runs its blocking
/// calls one at a time, in submission order.
pub struct BridgeWorker<A> {
    job_tx: std_mpsc::Sender<Job<A>>,
}

impl<A: DockAutomation + 'static> BridgeWorker<A> {
    pub fn spawn(bridge: AutomationBridge<A>) -> Result<Self> {
        let (job_tx, job_rx) = std_mpsc::channel::<Job<A>>();

        std::thread::Builder::new()
            .name("shydock-bridge".to_string())
            .spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    job(&bridge);
                }
                tracing::debug!("Bridge worker exiting");
            })
            .context("Failed to spawn bridge worker thread")?;

        Ok(Self { job_tx })
    }

    pub fn apply(&self, hide: bool) -> oneshot::Receiver<AutomationOutcome> {
        self.submit(move |bridge| bridge.apply(hide))
    }

    pub fn query(&self) -> oneshot::Receiver<AutomationOutcome> {
        self.submit(|bridge| bridge.query())
    }

    fn submit(
        &self,
        op: impl FnOnce(&AutomationBridge<A>) -> AutomationOutcome + Send + 'static,
    ) -> oneshot::Receiver<AutomationOutcome> {
        let (tx, rx) = oneshot::channel();
        let job: Job<A> = Box::new(move |bridge| {
            let _ = tx.send(op(bridge));
        });
        if self.job_tx.send(job).is_err() {
            // Receiver side sees a closed channel
            tracing::error!("Bridge worker is gone, dropping job");
        }
        rx
    }
}

/// Outcome for a job whose reply never arrived.
pub fn worker_lost() -> AutomationOutcome {
    AutomationOutcome::failed(BridgeError::Rejected {
        message: "bridge worker stopped".to_string(),
    })
}
