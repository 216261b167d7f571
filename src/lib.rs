pub mod config;
pub mod http;
pub mod session;
pub mod sound;
pub mod transport;

pub use config::Config;
pub use http::{create_router, AppState};
pub use session::{
    Alert, AlertGate, Detection, EventRouter, FrameEvent, HistoryEntry, RingHistory,
    SessionCommand, SessionConfig, SessionController, SessionHandle, SessionRunner,
    SessionSnapshot,
};
pub use sound::{NullSoundPlayer, SoundCategory, SoundPlayer, SoundPlayerFactory};
pub use transport::{ConnectionState, SocketIoConfig, SocketIoTransport, Transport};
