use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use super::events::FrameImage;

/// Writes the JPEG of each alerted frame to disk
#[derive(Debug, Clone)]
pub struct AlertFrameWriter {
    output_dir: PathBuf,
    session_id: String,
}

impl AlertFrameWriter {
    pub fn new(output_dir: PathBuf, session_id: String) -> Result<Self> {
        // Create output directory if it doesn't exist
        fs::create_dir_all(&output_dir).context("Failed to create alert frames directory")?;

        info!("Saving alerted frames to {:?}", output_dir);

        Ok(Self {
            output_dir,
            session_id,
        })
    }

    /// Path a frame would be written to
    pub fn frame_path(&self, frame_index: i64) -> PathBuf {
        self.output_dir.join(format!(
            "{}-frame-{:06}.jpg",
            self.session_id, frame_index
        ))
    }

    /// Decode and write one frame, returning its path
    pub fn write(&self, frame_index: i64, image: &FrameImage) -> Result<PathBuf> {
        let bytes = image.decode()?;
        let path = self.frame_path(frame_index);

        fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write alert frame: {:?}", path))?;

        Ok(path)
    }
}

/// Hands alerted frames to a writer thread so disk I/O stays off the event loop
///
/// Dropping the queue finishes pending writes before returning.
pub struct AlertFrameQueue {
    tx: Option<Sender<(i64, FrameImage)>>,
    worker: Option<JoinHandle<()>>,
}

impl AlertFrameQueue {
    pub fn spawn(writer: AlertFrameWriter) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<(i64, FrameImage)>();

        let worker = thread::Builder::new()
            .name("alert-frames".to_string())
            .spawn(move || {
                while let Ok((frame_index, image)) = rx.recv() {
                    match writer.write(frame_index, &image) {
                        Ok(path) => debug!("Saved alerted frame to {:?}", path),
                        Err(e) => warn!("Failed to save frame {}: {:#}", frame_index, e),
                    }
                }
            })
            .context("Failed to start alert frame writer thread")?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Queue one frame; never blocks
    pub fn submit(&self, frame_index: i64, image: FrameImage) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send((frame_index, image)).is_err() {
            warn!("Alert frame writer stopped; frame {} not saved", frame_index);
        }
    }
}

impl Drop for AlertFrameQueue {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once the backlog is written
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Alert frame writer thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_frame_path_is_zero_padded() {
        let temp = TempDir::new().unwrap();
        let writer = AlertFrameWriter::new(temp.path().to_path_buf(), "room-1".to_string()).unwrap();

        assert_eq!(
            writer.frame_path(42),
            temp.path().join("room-1-frame-000042.jpg")
        );
    }

    #[test]
    fn test_write_creates_directory_and_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("alerts").join("today");
        let writer = AlertFrameWriter::new(dir.clone(), "room-1".to_string()).unwrap();

        // "hello" in base64
        let path = writer.write(3, &FrameImage::new("aGVsbG8=".to_string())).unwrap();

        assert_eq!(path, dir.join("room-1-frame-000003.jpg"));
        assert_eq!(fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn test_queue_writes_every_frame_before_drop() {
        let temp = TempDir::new().unwrap();
        let writer = AlertFrameWriter::new(temp.path().to_path_buf(), "room-1".to_string()).unwrap();
        let paths: Vec<PathBuf> = (1..=3).map(|i| writer.frame_path(i)).collect();

        let queue = AlertFrameQueue::spawn(writer).unwrap();
        for i in 1..=3 {
            queue.submit(i, FrameImage::new("aGVsbG8=".to_string()));
        }
        drop(queue);

        for path in paths {
            assert_eq!(fs::read(&path).unwrap(), b"hello");
        }
    }

    #[test]
    fn test_write_rejects_bad_encoding() {
        let temp = TempDir::new().unwrap();
        let writer = AlertFrameWriter::new(temp.path().to_path_buf(), "room-1".to_string()).unwrap();

        let result = writer.write(1, &FrameImage::new("not base64!".to_string()));

        assert!(result.is_err());
        assert!(!writer.frame_path(1).exists());
    }
}
