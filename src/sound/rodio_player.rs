use anyhow::{Context, Result};
use rodio::source::{SineWave, Source, Zero};
use rodio::{Decoder, OutputStream, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::player::{SoundCategory, SoundConfig, SoundPlayer};

const TONE_SAMPLE_RATE: u32 = 48_000;
const TONE_DURATION: Duration = Duration::from_millis(180);
const TONE_GAP: Duration = Duration::from_millis(50);
const TONE_GAIN: f32 = 0.3;

/// Plays alerts on the default output device from a dedicated thread
///
/// `OutputStream` is not `Send`, so the stream lives on its own thread and
/// requests are queued to it.
pub struct RodioSoundPlayer {
    tx: Sender<SoundCategory>,
}

impl RodioSoundPlayer {
    pub fn new(config: SoundConfig) -> Self {
        let (tx, rx) = mpsc::channel::<SoundCategory>();

        thread::spawn(move || {
            let mut output = OutputStream::try_default().ok();
            if output.is_none() {
                warn!("audio output unavailable; alert sounds disabled until a device appears");
            }
            let mut active_sinks: Vec<Sink> = Vec::new();

            while let Ok(category) = rx.recv() {
                active_sinks.retain(|sink| !sink.empty());

                if output.is_none() {
                    output = OutputStream::try_default().ok();
                    if output.is_none() {
                        continue;
                    }
                }

                let Some((_, handle)) = output.as_ref() else {
                    continue;
                };

                let sink = match Sink::try_new(handle) {
                    Ok(sink) => sink,
                    Err(err) => {
                        warn!(?err, "failed to create audio sink");
                        output = None;
                        continue;
                    }
                };

                match category {
                    SoundCategory::Weapon => {
                        let loaded = config
                            .weapon_sound_path
                            .as_deref()
                            .map(|path| append_file(&sink, path));
                        match loaded {
                            Some(Ok(())) => {}
                            Some(Err(err)) => {
                                debug!(?err, "weapon sound file unusable; using siren");
                                append_siren(&sink);
                            }
                            None => append_siren(&sink),
                        }
                    }
                    SoundCategory::Generic => append_two_tone(&sink),
                }

                active_sinks.push(sink);
            }
        });

        Self { tx }
    }

    fn enqueue(&self, category: SoundCategory) -> Result<()> {
        self.tx
            .send(category)
            .context("Audio thread is no longer running")
    }
}

impl SoundPlayer for RodioSoundPlayer {
    fn play_weapon_alert(&self) -> Result<()> {
        self.enqueue(SoundCategory::Weapon)
    }

    fn play_generic_alert(&self) -> Result<()> {
        self.enqueue(SoundCategory::Generic)
    }

    fn name(&self) -> &str {
        "rodio"
    }
}

fn append_file(sink: &Sink, path: &Path) -> Result<()> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open sound file: {:?}", path))?;
    let decoder = Decoder::new(BufReader::new(file))
        .with_context(|| format!("Failed to decode sound file: {:?}", path))?;
    sink.append(decoder);
    Ok(())
}

fn append_tone(sink: &Sink, freq: f32) {
    sink.append(
        SineWave::new(freq)
            .take_duration(TONE_DURATION)
            .amplify(TONE_GAIN),
    );
}

fn append_gap(sink: &Sink) {
    sink.append(Zero::<f32>::new(1, TONE_SAMPLE_RATE).take_duration(TONE_GAP));
}

/// Two quick beeps: 1000 Hz then 1200 Hz
fn append_two_tone(sink: &Sink) {
    append_tone(sink, 1000.0);
    append_gap(sink);
    append_tone(sink, 1200.0);
}

/// Alternating 900/1500 Hz pulses used when no weapon sound file is set
fn append_siren(sink: &Sink) {
    for _ in 0..3 {
        append_tone(sink, 900.0);
        append_tone(sink, 1500.0);
    }
}
