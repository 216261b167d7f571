// Socket.IO packet codec
//
// Engine.IO v4 carries Socket.IO v5 packets as WebSocket text frames:
// - "0{...}"           engine open handshake
// - "2" / "3"          engine ping / pong
// - "40", "41"         namespace connect / disconnect
// - "42[name, arg]"    event
// - "44{...}"          namespace connect error
//
// Only the default namespace is used. Binary attachments are not supported.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Engine.IO open handshake sent by the server right after the upgrade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(rename = "pingInterval", default)]
    pub ping_interval_ms: u64,
    #[serde(rename = "pingTimeout", default)]
    pub ping_timeout_ms: u64,
}

/// A decoded Engine.IO / Socket.IO frame
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(OpenHandshake),
    Close,
    Ping,
    Pong,
    Noop,
    Connect,
    Disconnect,
    Event { name: String, payload: Value },
    ConnectError(Value),
}

impl Packet {
    /// Build an event packet with a single argument
    pub fn event(name: impl Into<String>, payload: Value) -> Self {
        Packet::Event {
            name: name.into(),
            payload,
        }
    }

    /// Decode a single WebSocket text frame
    pub fn decode(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let engine_type = chars.next().context("Empty frame")?;
        let rest = chars.as_str();

        match engine_type {
            '0' => {
                let handshake: OpenHandshake =
                    serde_json::from_str(rest).context("Invalid open handshake")?;
                Ok(Packet::Open(handshake))
            }
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '4' => Self::decode_socket(rest),
            '6' => Ok(Packet::Noop),
            other => bail!("Unsupported engine packet type '{}'", other),
        }
    }

    fn decode_socket(body: &str) -> Result<Self> {
        let mut chars = body.chars();
        let socket_type = chars.next().context("Empty socket packet")?;
        let rest = strip_namespace(chars.as_str());

        match socket_type {
            '0' => Ok(Packet::Connect),
            '1' => Ok(Packet::Disconnect),
            '2' => {
                // Skip an optional ack id before the argument array
                let args = rest.trim_start_matches(|c: char| c.is_ascii_digit());
                let mut values: Vec<Value> =
                    serde_json::from_str(args).context("Invalid event arguments")?;
                if values.is_empty() {
                    bail!("Event packet without a name");
                }
                let name = match values.remove(0) {
                    Value::String(name) => name,
                    other => bail!("Event name must be a string, got {}", other),
                };
                let payload = values.into_iter().next().unwrap_or(Value::Null);
                Ok(Packet::Event { name, payload })
            }
            '4' => {
                let payload = if rest.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(rest).context("Invalid connect error payload")?
                };
                Ok(Packet::ConnectError(payload))
            }
            other => bail!("Unsupported socket packet type '{}'", other),
        }
    }

    /// Encode into a WebSocket text frame
    pub fn encode(&self) -> String {
        match self {
            Packet::Open(handshake) => {
                format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
            }
            Packet::Close => "1".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Pong => "3".to_string(),
            Packet::Noop => "6".to_string(),
            Packet::Connect => "40".to_string(),
            Packet::Disconnect => "41".to_string(),
            Packet::Event { name, payload } => {
                let args = if payload.is_null() {
                    Value::Array(vec![Value::String(name.clone())])
                } else {
                    Value::Array(vec![Value::String(name.clone()), payload.clone()])
                };
                format!("42{}", args)
            }
            Packet::ConnectError(payload) => format!("44{}", payload),
        }
    }
}

/// Drop a "/namespace," prefix if present
fn strip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        match body.find(',') {
            Some(idx) => &body[idx + 1..],
            None => "",
        }
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open_handshake() {
        let packet =
            Packet::decode(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#)
                .unwrap();

        assert_eq!(
            packet,
            Packet::Open(OpenHandshake {
                sid: "abc".to_string(),
                ping_interval_ms: 25000,
                ping_timeout_ms: 20000,
            })
        );
    }

    #[test]
    fn test_decode_ping_and_connect() {
        assert_eq!(Packet::decode("2").unwrap(), Packet::Ping);
        assert_eq!(Packet::decode(r#"40{"sid":"xyz"}"#).unwrap(), Packet::Connect);
        assert_eq!(Packet::decode("41").unwrap(), Packet::Disconnect);
    }

    #[test]
    fn test_decode_event_with_payload() {
        let packet = Packet::decode(r#"42["frame_detection",{"frame_index":3,"detections":[]}]"#)
            .unwrap();

        match packet {
            Packet::Event { name, payload } => {
                assert_eq!(name, "frame_detection");
                assert_eq!(payload["frame_index"], 3);
            }
            other => panic!("Expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack_id() {
        let packet = Packet::decode(r#"42/detect,17["room_msg",{"text":"hi"}]"#).unwrap();

        assert_eq!(packet, Packet::event("room_msg", json!({"text": "hi"})));
    }

    #[test]
    fn test_decode_event_without_arguments() {
        let packet = Packet::decode(r#"42["video_processing_started"]"#).unwrap();
        assert_eq!(packet, Packet::event("video_processing_started", Value::Null));
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        assert!(Packet::decode("").is_err());
        assert!(Packet::decode("42").is_err());
        assert!(Packet::decode("42[]").is_err());
        assert!(Packet::decode("42[5,{}]").is_err());
        assert!(Packet::decode("9").is_err());
    }

    #[test]
    fn test_encode_join_event() {
        let packet = Packet::event("join", json!({"room": "session-1"}));
        assert_eq!(packet.encode(), r#"42["join",{"room":"session-1"}]"#);
        assert_eq!(Packet::Pong.encode(), "3");
        assert_eq!(Packet::Connect.encode(), "40");
    }
}
