use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::backend::{
    ConnectionState, OutboundCommand, Transport, TransportChannels, TransportEvent,
};
use super::messages::JoinMessage;
use super::packet::Packet;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Socket.IO client configuration
#[derive(Debug, Clone)]
pub struct SocketIoConfig {
    /// Server base URL (e.g., "http://localhost:5000")
    pub url: String,
    /// Delay between reconnect attempts
    pub reconnect_delay: Duration,
    /// Capacity of the inbound event channel
    pub channel_capacity: usize,
}

impl Default for SocketIoConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
            reconnect_delay: Duration::from_secs(2),
            channel_capacity: 256,
        }
    }
}

/// Why a single connection ended
enum ConnectionEnd {
    Lost,
    Shutdown,
}

/// Socket.IO v5 client over a WebSocket, reconnecting until stopped
pub struct SocketIoTransport {
    config: SocketIoConfig,
    shutdown_tx: Option<watch::Sender<bool>>,
    task_handle: Option<JoinHandle<()>>,
}

impl SocketIoTransport {
    pub fn new(config: SocketIoConfig) -> Self {
        Self {
            config,
            shutdown_tx: None,
            task_handle: None,
        }
    }

    /// Whether the connection task is running
    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl Transport for SocketIoTransport {
    async fn start(&mut self) -> Result<TransportChannels> {
        if self.task_handle.is_some() {
            anyhow::bail!("Transport already started");
        }

        let endpoint = socket_endpoint(&self.config.url)?;
        info!("Starting Socket.IO transport for {}", endpoint);

        let (event_tx, event_rx) = mpsc::channel(self.config.channel_capacity);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let reconnect_delay = self.config.reconnect_delay;
        let task = tokio::spawn(async move {
            run(endpoint, reconnect_delay, event_tx, command_rx, shutdown_rx).await;
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.task_handle = Some(task);

        Ok(TransportChannels {
            events: event_rx,
            commands: command_tx,
        })
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }

        if let Some(task) = self.task_handle.take() {
            task.await.context("Transport task panicked")?;
        }

        info!("Socket.IO transport stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "socket.io"
    }
}

/// Build the Engine.IO WebSocket endpoint from an http(s) or ws(s) base URL
pub fn socket_endpoint(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');

    let ws_base = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
        trimmed.to_string()
    } else {
        anyhow::bail!("Unsupported server URL scheme: {}", url);
    };

    Ok(format!("{}/socket.io/?EIO=4&transport=websocket", ws_base))
}

async fn run(
    endpoint: String,
    reconnect_delay: Duration,
    events: mpsc::Sender<TransportEvent>,
    mut commands: mpsc::Receiver<OutboundCommand>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        if report(&events, ConnectionState::Connecting).await.is_err() {
            break;
        }

        let end = match connect_async(endpoint.as_str()).await {
            Ok((socket, _response)) => {
                debug!("WebSocket upgrade complete");
                run_connection(socket, &events, &mut commands, &mut shutdown).await
            }
            Err(e) => {
                warn!("Failed to connect to {}: {}", endpoint, e);
                ConnectionEnd::Lost
            }
        };

        if report(&events, ConnectionState::Disconnected).await.is_err() {
            break;
        }

        if let ConnectionEnd::Shutdown = end {
            break;
        }

        info!("Reconnecting in {}ms", reconnect_delay.as_millis());
        tokio::select! {
            _ = sleep(reconnect_delay) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    debug!("Transport task exiting");
}

async fn report(
    events: &mpsc::Sender<TransportEvent>,
    state: ConnectionState,
) -> Result<(), mpsc::error::SendError<TransportEvent>> {
    events.send(TransportEvent::State(state)).await
}

async fn run_connection(
    socket: Socket,
    events: &mpsc::Sender<TransportEvent>,
    commands: &mut mpsc::Receiver<OutboundCommand>,
    shutdown: &mut watch::Receiver<bool>,
) -> ConnectionEnd {
    let (mut write, mut read) = socket.split();

    // Replaced by the open handshake's ping interval + timeout
    let mut liveness = Duration::from_secs(45);
    let mut deadline = Instant::now() + liveness;

    loop {
        tokio::select! {
            frame = read.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Server closed the connection");
                        return ConnectionEnd::Lost;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {}", e);
                        return ConnectionEnd::Lost;
                    }
                };

                let packet = match Packet::decode(&text) {
                    Ok(packet) => packet,
                    Err(e) => {
                        debug!("Skipping undecodable frame: {:#}", e);
                        continue;
                    }
                };

                match packet {
                    Packet::Open(handshake) => {
                        debug!(
                            "Engine.IO open (sid={}, ping={}ms, timeout={}ms)",
                            handshake.sid, handshake.ping_interval_ms, handshake.ping_timeout_ms
                        );
                        if handshake.ping_interval_ms > 0 {
                            liveness = Duration::from_millis(
                                handshake.ping_interval_ms + handshake.ping_timeout_ms,
                            );
                            deadline = Instant::now() + liveness;
                        }
                        if let Err(e) = write.send(Message::Text(Packet::Connect.encode())).await {
                            warn!("Failed to request namespace connect: {}", e);
                            return ConnectionEnd::Lost;
                        }
                    }
                    Packet::Ping => {
                        deadline = Instant::now() + liveness;
                        if let Err(e) = write.send(Message::Text(Packet::Pong.encode())).await {
                            warn!("Failed to answer ping: {}", e);
                            return ConnectionEnd::Lost;
                        }
                    }
                    Packet::Connect => {
                        info!("Socket.IO namespace connected");
                        if report(events, ConnectionState::Connected).await.is_err() {
                            return ConnectionEnd::Shutdown;
                        }
                    }
                    Packet::Event { name, payload } => {
                        if events.send(TransportEvent::Message { name, payload }).await.is_err() {
                            return ConnectionEnd::Shutdown;
                        }
                    }
                    Packet::ConnectError(payload) => {
                        error!("Namespace connect refused: {}", payload);
                        return ConnectionEnd::Lost;
                    }
                    Packet::Close | Packet::Disconnect => {
                        info!("Server ended the session");
                        return ConnectionEnd::Lost;
                    }
                    Packet::Pong | Packet::Noop => {}
                }
            }

            command = commands.recv() => {
                let Some(command) = command else {
                    return ConnectionEnd::Shutdown;
                };
                let packet = match encode_command(&command) {
                    Ok(packet) => packet,
                    Err(e) => {
                        warn!("Dropping outbound command: {:#}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(packet.encode())).await {
                    warn!("Failed to send {:?}: {}", command, e);
                    return ConnectionEnd::Lost;
                }
            }

            _ = tokio::time::sleep_until(deadline) => {
                warn!("No ping from server within {}ms", liveness.as_millis());
                return ConnectionEnd::Lost;
            }

            _ = shutdown.changed() => {
                let _ = write.send(Message::Text(Packet::Disconnect.encode())).await;
                let _ = write.close().await;
                return ConnectionEnd::Shutdown;
            }
        }
    }
}

fn encode_command(command: &OutboundCommand) -> Result<Packet> {
    match command {
        OutboundCommand::Join { room } => {
            let payload = serde_json::to_value(JoinMessage { room: room.clone() })
                .context("Failed to encode join payload")?;
            Ok(Packet::event("join", payload))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_endpoint_from_http() {
        assert_eq!(
            socket_endpoint("http://localhost:5000/").unwrap(),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            socket_endpoint("https://detect.example.org").unwrap(),
            "wss://detect.example.org/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_socket_endpoint_rejects_unknown_scheme() {
        assert!(socket_endpoint("ftp://example.org").is_err());
    }

    #[test]
    fn test_join_command_encoding() {
        let packet = encode_command(&OutboundCommand::Join {
            room: "abc123".to_string(),
        })
        .unwrap();
        assert_eq!(packet.encode(), r#"42["join",{"room":"abc123"}]"#);
    }
}
