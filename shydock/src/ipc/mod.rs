mod client;
mod event_server;
mod server;

pub use client::{subscribe_and_print, IpcClient};
pub use event_server::{EventBroadcaster, EventServer, SnapshotRequest};
pub use server::{IpcCommandWithResponse, IpcServer};
