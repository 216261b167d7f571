//! Alert sound playback
//!
//! The detection session never talks to an audio device directly; it holds a
//! `SoundPlayer` and treats every call as best-effort.

pub mod player;

#[cfg(feature = "playback")]
pub mod rodio_player;

pub use player::{NullSoundPlayer, SoundCategory, SoundConfig, SoundPlayer, SoundPlayerFactory};

#[cfg(feature = "playback")]
pub use rodio_player::RodioSoundPlayer;
