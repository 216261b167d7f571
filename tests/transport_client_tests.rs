// Integration tests for the Socket.IO transport client
//
// An in-process WebSocket server plays the detection backend: it speaks the
// Engine.IO handshake, pushes an event and a ping, then drops the connection
// to force a reconnect.

use anyhow::{bail, Context, Result};
use armory_watch::transport::{
    ConnectionState, OutboundCommand, SocketIoConfig, SocketIoTransport, Transport,
    TransportEvent,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

const OPEN: &str = r#"0{"sid":"eio-1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;
const FRAME_EVENT: &str =
    r#"42["frame_detection",{"frame_index":7,"detections":[{"class":"handgun"}]}]"#;

/// Text frames the server received, tagged with the connection number
type Received = mpsc::UnboundedSender<(usize, String)>;

async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> Result<String> {
    while let Some(message) = ws.next().await {
        if let Message::Text(text) = message? {
            return Ok(text);
        }
    }
    bail!("Client closed the socket")
}

async fn record(ws: &mut WebSocketStream<TcpStream>, conn: usize, received: &Received) -> Result<()> {
    let text = next_text(ws).await?;
    received.send((conn, text))?;
    Ok(())
}

async fn serve(listener: TcpListener, received: Received) -> Result<()> {
    // First connection: handshake, join, one event, one ping, then dropped
    let (stream, _) = listener.accept().await?;
    let mut ws = accept_async(stream).await?;
    ws.send(Message::Text(OPEN.to_string())).await?;
    record(&mut ws, 1, &received).await?; // namespace connect
    ws.send(Message::Text(r#"40{"sid":"ns-1"}"#.to_string())).await?;
    record(&mut ws, 1, &received).await?; // join
    ws.send(Message::Text(FRAME_EVENT.to_string())).await?;
    ws.send(Message::Text("2".to_string())).await?;
    record(&mut ws, 1, &received).await?; // pong
    drop(ws);

    // Second connection stays up until the client leaves
    let (stream, _) = listener.accept().await?;
    let mut ws = accept_async(stream).await?;
    ws.send(Message::Text(OPEN.to_string())).await?;
    record(&mut ws, 2, &received).await?;
    ws.send(Message::Text(r#"40{"sid":"ns-2"}"#.to_string())).await?;
    while let Some(Ok(message)) = ws.next().await {
        if let Message::Text(text) = message {
            received.send((2, text))?;
        }
    }

    Ok(())
}

async fn next_event(events: &mut mpsc::Receiver<TransportEvent>) -> Result<TransportEvent> {
    timeout(Duration::from_secs(5), events.recv())
        .await?
        .context("Transport closed its event channel")
}

#[tokio::test]
async fn test_handshake_events_and_reconnect() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (received_tx, mut received_rx) = mpsc::unbounded_channel();
    let server = tokio::spawn(serve(listener, received_tx));

    let mut transport = SocketIoTransport::new(SocketIoConfig {
        url: format!("http://{}", addr),
        reconnect_delay: Duration::from_millis(50),
        ..SocketIoConfig::default()
    });
    let mut channels = transport.start().await?;
    assert!(transport.is_running());

    let mut seen = Vec::new();
    seen.push(next_event(&mut channels.events).await?);
    seen.push(next_event(&mut channels.events).await?);
    channels
        .commands
        .send(OutboundCommand::Join {
            room: "room-1".to_string(),
        })
        .await?;
    for _ in 0..4 {
        seen.push(next_event(&mut channels.events).await?);
    }

    assert_eq!(
        seen,
        vec![
            TransportEvent::State(ConnectionState::Connecting),
            TransportEvent::State(ConnectionState::Connected),
            TransportEvent::Message {
                name: "frame_detection".to_string(),
                payload: json!({"frame_index": 7, "detections": [{"class": "handgun"}]}),
            },
            TransportEvent::State(ConnectionState::Disconnected),
            TransportEvent::State(ConnectionState::Connecting),
            TransportEvent::State(ConnectionState::Connected),
        ]
    );

    timeout(Duration::from_secs(5), transport.stop()).await??;
    assert!(!transport.is_running());
    timeout(Duration::from_secs(5), server).await???;

    let mut first = Vec::new();
    let mut second = Vec::new();
    while let Ok((conn, text)) = received_rx.try_recv() {
        match conn {
            1 => first.push(text),
            _ => second.push(text),
        }
    }

    assert_eq!(first, vec!["40", r#"42["join",{"room":"room-1"}]"#, "3"]);
    assert_eq!(second.first().map(String::as_str), Some("40"));
    // Clean shutdown leaves the namespace before closing
    assert!(second.iter().any(|text| text == "41"));

    Ok(())
}

#[tokio::test]
async fn test_unreachable_server_keeps_retrying_until_stopped() -> Result<()> {
    // Bind then release a port so nothing is listening on it
    let addr = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;

    let mut transport = SocketIoTransport::new(SocketIoConfig {
        url: format!("http://{}", addr),
        reconnect_delay: Duration::from_millis(20),
        ..SocketIoConfig::default()
    });
    let mut channels = transport.start().await?;

    for _ in 0..2 {
        assert_eq!(
            next_event(&mut channels.events).await?,
            TransportEvent::State(ConnectionState::Connecting)
        );
        assert_eq!(
            next_event(&mut channels.events).await?,
            TransportEvent::State(ConnectionState::Disconnected)
        );
    }

    timeout(Duration::from_secs(5), transport.stop()).await??;
    Ok(())
}
