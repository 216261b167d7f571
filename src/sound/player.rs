use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
#[cfg(feature = "playback")]
use tracing::info;
#[cfg(not(feature = "playback"))]
use tracing::warn;

/// Alert sound categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCategory {
    /// Dedicated weapon alert, cooldown-gated
    Weapon,
    /// Short two-tone beep for any other detection
    Generic,
}

/// Alert sound playback capability
///
/// Implementations:
/// - `NullSoundPlayer`: plays nothing (headless runs, tests)
/// - `RodioSoundPlayer`: default audio output device (`playback` feature)
///
/// Playback is fire-and-forget. An `Err` only means the request could not be
/// handed to the backend; callers are expected to ignore it.
pub trait SoundPlayer: Send {
    /// Play the dedicated weapon alert
    fn play_weapon_alert(&self) -> Result<()>;

    /// Play the synthesized two-tone alert
    fn play_generic_alert(&self) -> Result<()>;

    /// Get player name for logging
    fn name(&self) -> &str;
}

/// Player that discards every request
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSoundPlayer;

impl SoundPlayer for NullSoundPlayer {
    fn play_weapon_alert(&self) -> Result<()> {
        Ok(())
    }

    fn play_generic_alert(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Configuration for the sound player
#[derive(Debug, Clone, Default)]
pub struct SoundConfig {
    /// Audio file for the weapon alert (synthesized siren if unset)
    pub weapon_sound_path: Option<PathBuf>,
}

/// Sound player factory
pub struct SoundPlayerFactory;

impl SoundPlayerFactory {
    /// Create the best available player for this build
    pub fn create(config: SoundConfig) -> Box<dyn SoundPlayer> {
        #[cfg(feature = "playback")]
        {
            let player = super::rodio_player::RodioSoundPlayer::new(config);
            info!("Alert sounds enabled ({})", player.name());
            Box::new(player)
        }

        #[cfg(not(feature = "playback"))]
        {
            let _ = config;
            warn!("Built without the `playback` feature; weapon and detection alerts will be silent");
            Box::new(NullSoundPlayer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "playback"))]
    #[test]
    fn test_default_build_uses_silent_player() {
        let player = SoundPlayerFactory::create(SoundConfig::default());

        assert_eq!(player.name(), "null");
        assert!(player.play_weapon_alert().is_ok());
        assert!(player.play_generic_alert().is_ok());
    }
}
