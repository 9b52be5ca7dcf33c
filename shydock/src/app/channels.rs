use anyhow::Result;
use tokio::sync::{broadcast, mpsc};

use crate::core::DisplayReconfigEvent;
use crate::event_emitter::EventEmitter;
use crate::ipc::{
    EventBroadcaster, EventServer, IpcCommandWithResponse, IpcServer, SnapshotRequest,
};
use crate::platform::{AccessibilityPermission, DisplaySystem, DockAutomation, LoginItems};
use shydock_ipc::StateEvent;

use super::scheduler::{Scheduler, SchedulerInputs, Services};

pub struct IpcRelay {
    pub server_tx: mpsc::Sender<IpcCommandWithResponse>,
    pub cmd_rx: mpsc::Receiver<IpcCommandWithResponse>,
}

pub struct EventStreaming {
    pub broadcaster: EventBroadcaster,
    pub event_server_rx: broadcast::Receiver<StateEvent>,
}

pub struct SnapshotRelay {
    pub request_tx: mpsc::Sender<SnapshotRequest>,
    pub request_rx: mpsc::Receiver<SnapshotRequest>,
}

pub struct TokioChannels {
    pub ipc: IpcRelay,
    pub events: EventStreaming,
    pub snapshots: SnapshotRelay,
    pub display_reconfig_rx: mpsc::UnboundedReceiver<DisplayReconfigEvent>,
}

pub struct MainChannels {
    /// Handed to the display reconfiguration callback on the main thread
    pub display_reconfig_tx: mpsc::UnboundedSender<DisplayReconfigEvent>,
}

pub fn create_channels() -> (TokioChannels, MainChannels) {
    // Channel: IPC server -> scheduler
    let (server_tx, cmd_rx) = mpsc::channel::<IpcCommandWithResponse>(256);

    // Event broadcasting for state streaming
    let broadcaster = EventBroadcaster::new(256);
    let event_server_rx = broadcaster.subscribe();

    // Channel: snapshot requests (event server -> scheduler)
    let (request_tx, request_rx) = mpsc::channel::<SnapshotRequest>(16);

    // Channel: display reconfiguration events (callback -> scheduler)
    let (display_reconfig_tx, display_reconfig_rx) =
        mpsc::unbounded_channel::<DisplayReconfigEvent>();

    let tokio_channels = TokioChannels {
        ipc: IpcRelay { server_tx, cmd_rx },
        events: EventStreaming {
            broadcaster,
            event_server_rx,
        },
        snapshots: SnapshotRelay {
            request_tx,
            request_rx,
        },
        display_reconfig_rx,
    };

    let main_channels = MainChannels {
        display_reconfig_tx,
    };

    (tokio_channels, main_channels)
}

/// Start the socket servers and run the scheduler until it quits or the
/// process is asked to terminate.
pub async fn run_async<D, A, L, P>(
    channels: TokioChannels,
    services: Services<D, A, L, P>,
) -> Result<()>
where
    D: DisplaySystem,
    A: DockAutomation + 'static,
    L: LoginItems,
    P: AccessibilityPermission,
{
    let TokioChannels {
        ipc,
        events,
        snapshots,
        display_reconfig_rx,
    } = channels;

    tracing::info!("Tokio runtime started");

    // Start IPC server
    let ipc_server = IpcServer::new(ipc.server_tx);
    tokio::spawn(async move {
        if let Err(e) = ipc_server.run().await {
            tracing::error!("IPC server error: {}", e);
        }
    });

    // Start Event server
    let event_server = EventServer::new(events.event_server_rx, snapshots.request_tx);
    tokio::spawn(async move {
        if let Err(e) = event_server.run().await {
            tracing::error!("Event server error: {}", e);
        }
    });

    let event_emitter = EventEmitter::new(events.broadcaster);
    let (scheduler, completion_rx) = Scheduler::new(services, event_emitter)?;
    let inputs = SchedulerInputs {
        cmd_rx: ipc.cmd_rx,
        display_rx: display_reconfig_rx,
        snapshot_rx: snapshots.request_rx,
    };

    tokio::select! {
        _ = scheduler.run(completion_rx, inputs) => {}
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Tokio runtime exiting");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}
