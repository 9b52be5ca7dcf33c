use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot};

use shydock_ipc::{StateEvent, SubscribeRequest};

pub const EVENT_SOCKET_PATH: &str = "/tmp/shydock-events.sock";

pub type SnapshotRequest = oneshot::Sender<StateEvent>;

/// Streams [`StateEvent`]s to subscribers as newline-delimited JSON.
pub struct EventServer {
    socket_path: PathBuf,
    event_rx: broadcast::Receiver<StateEvent>,
    snapshot_tx: mpsc::Sender<SnapshotRequest>,
}

impl EventServer {
    pub fn new(
        event_rx: broadcast::Receiver<StateEvent>,
        snapshot_tx: mpsc::Sender<SnapshotRequest>,
    ) -> Self {
        Self {
            socket_path: PathBuf::from(EVENT_SOCKET_PATH),
            event_rx,
            snapshot_tx,
        }
    }

    pub fn with_socket_path(mut self, socket_path: impl Into<PathBuf>) -> Self {
        self.socket_path = socket_path.into();
        self
    }

    pub async fn run(self) -> Result<()> {
        // Remove existing socket file if it exists
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("Event server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let event_rx = self.event_rx.resubscribe();
                    let snapshot_tx = self.snapshot_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, event_rx, snapshot_tx).await
                        {
                            tracing::debug!("Event subscriber disconnected: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Event server accept error: {}", e);
                }
            }
        }
    }

    async fn handle_connection(
        stream: UnixStream,
        mut event_rx: broadcast::Receiver<StateEvent>,
        snapshot_tx: mpsc::Sender<SnapshotRequest>,
    ) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        // Read subscribe request
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Ok(()); // EOF
        }

        let request: SubscribeRequest = serde_json::from_str(line.trim()).unwrap_or_default();
        let filter = request.effective_filter();

        tracing::debug!("New event subscriber with filter: {:?}", filter);

        if request.snapshot {
            let (resp_tx, resp_rx) = oneshot::channel();
            if snapshot_tx.send(resp_tx).await.is_ok() {
                if let Ok(snapshot) = resp_rx.await {
                    write_event(&mut writer, &snapshot).await?;
                }
            }
        }

        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    if filter.matches(&event) {
                        write_event(&mut writer, &event).await?;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event subscriber lagged by {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn write_event<W: AsyncWrite + Unpin>(writer: &mut W, event: &StateEvent) -> Result<()> {
    let json = serde_json::to_string(event)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

impl Drop for EventServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Event broadcaster that holds the sender side of the broadcast channel
#[derive(Clone)]
pub struct EventBroadcaster {
    event_tx: broadcast::Sender<StateEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        Self { event_tx }
    }

    /// Get a receiver for the event server
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.event_tx.subscribe()
    }

    /// Send an event to all subscribers
    pub fn send(&self, event: StateEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shydock_ipc::{DockVisibility, EventFilter, StateInfo};
    use std::time::Duration;

    fn sample_state() -> StateInfo {
        StateInfo {
            external_display_connected: false,
            dock: DockVisibility::Hidden,
            min_width: 0.0,
            min_height: 0.0,
            launch_at_login: false,
            accessibility_trusted: true,
            generation: 1,
            last_error: None,
        }
    }

    #[tokio::test]
    async fn test_snapshot_then_filtered_events() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("events.sock");

        let broadcaster = EventBroadcaster::new(16);
        let (snapshot_tx, mut snapshot_rx) = mpsc::channel::<SnapshotRequest>(4);
        let server = EventServer::new(broadcaster.subscribe(), snapshot_tx)
            .with_socket_path(&socket_path);
        tokio::spawn(server.run());

        tokio::spawn(async move {
            while let Some(reply) = snapshot_rx.recv().await {
                let _ = reply.send(StateEvent::Snapshot {
                    state: sample_state(),
                });
            }
        });

        let mut stream = None;
        for _ in 0..50 {
            if let Ok(s) = UnixStream::connect(&socket_path).await {
                stream = Some(s);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let stream = stream.expect("event server did not start");
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        let request = SubscribeRequest {
            snapshot: true,
            filter: EventFilter {
                warning: true,
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        writer.write_all(json.as_bytes()).await.unwrap();
        writer.write_all(b"\n").await.unwrap();

        let first = lines.next_line().await.unwrap().unwrap();
        let event: StateEvent = serde_json::from_str(&first).unwrap();
        assert_eq!(
            event,
            StateEvent::Snapshot {
                state: sample_state()
            }
        );

        // Give the connection task time to reach the streaming loop
        tokio::time::sleep(Duration::from_millis(50)).await;
        broadcaster.send(StateEvent::StateChanged {
            external_display_connected: true,
            dock: DockVisibility::Shown,
            accessibility_trusted: true,
        });
        broadcaster.send(StateEvent::Warning {
            message: "dock update failed".to_string(),
        });

        let next = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let event: StateEvent = serde_json::from_str(&next).unwrap();
        assert_eq!(
            event,
            StateEvent::Warning {
                message: "dock update failed".to_string()
            }
        );
    }
}
