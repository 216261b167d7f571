pub mod backend;
pub mod client;
pub mod messages;
pub mod packet;

pub use backend::{ConnectionState, OutboundCommand, Transport, TransportChannels, TransportEvent};
pub use client::{socket_endpoint, SocketIoConfig, SocketIoTransport};
pub use messages::{
    CompleteMessage, DetectionMessage, ErrorMessage, FrameDetectionMessage, JoinMessage,
    ProgressMessage, StartedMessage,
};
pub use packet::{OpenHandshake, Packet};
