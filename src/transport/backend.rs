use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// Connection state of the detection channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Something the transport observed
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Connection state transition
    State(ConnectionState),
    /// Named server event with its first argument
    Message { name: String, payload: Value },
}

/// Commands the session sends back over the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    /// Subscribe to a session room
    Join { room: String },
}

/// Channel pair handed out by a started transport
pub struct TransportChannels {
    /// Inbound events, in arrival order
    pub events: mpsc::Receiver<TransportEvent>,
    /// Outbound commands
    pub commands: mpsc::Sender<OutboundCommand>,
}

/// Detection channel transport trait
///
/// Implementations:
/// - Socket.IO over WebSocket (`SocketIoTransport`)
/// - In-memory channels (tests, replays)
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Start the transport
    ///
    /// Returns the inbound event receiver and the outbound command sender
    async fn start(&mut self) -> Result<TransportChannels>;

    /// Stop the transport and wait for its task to finish
    async fn stop(&mut self) -> Result<()>;

    /// Get transport name for logging
    fn name(&self) -> &str;
}
