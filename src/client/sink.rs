//! Audio playback collaborators

use std::path::PathBuf;

use crate::{Error, Result};

/// Plays decoded reply audio and can be cut off at any time
pub trait AudioSink: Send {
    /// Start playing an MP3 clip, replacing anything already playing
    ///
    /// # Errors
    ///
    /// Returns error if the clip cannot be played
    fn play(&mut self, mp3: Vec<u8>) -> Result<()>;

    /// Stop playback immediately
    fn stop(&mut self);

    /// Whether a clip is currently playing
    fn is_playing(&self) -> bool;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn play(&mut self, mp3: Vec<u8>) -> Result<()> {
        (**self).play(mp3)
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
}

/// Writes each reply clip to a directory, for hosts without an audio device
///
/// A clip counts as playing until the next `stop` or `play`.
#[derive(Debug)]
pub struct FileSink {
    dir: PathBuf,
    clips: usize,
    playing: bool,
}

impl FileSink {
    /// Create a sink writing into `dir`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            clips: 0,
            playing: false,
        })
    }

    /// Path of the most recently written clip
    #[must_use]
    pub fn last_clip(&self) -> Option<PathBuf> {
        (self.clips > 0).then(|| self.clip_path(self.clips))
    }

    fn clip_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("reply-{n:04}.mp3"))
    }
}

impl AudioSink for FileSink {
    fn play(&mut self, mp3: Vec<u8>) -> Result<()> {
        if mp3.is_empty() {
            return Err(Error::Audio("empty audio clip".to_string()));
        }
        self.stop();
        let path = self.clip_path(self.clips + 1);
        std::fs::write(&path, mp3)?;
        self.clips += 1;
        self.playing = true;
        tracing::info!(path = %path.display(), "reply audio saved");
        Ok(())
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_writes_numbered_clips() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("audio")).unwrap();
        assert!(sink.last_clip().is_none());

        sink.play(vec![1, 2, 3]).unwrap();
        assert!(sink.is_playing());
        sink.play(vec![4]).unwrap();

        let last = sink.last_clip().unwrap();
        assert!(last.ends_with("reply-0002.mp3"));
        assert_eq!(std::fs::read(last).unwrap(), vec![4]);

        sink.stop();
        assert!(!sink.is_playing());
    }

    #[test]
    fn file_sink_rejects_empty_clip() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path()).unwrap();
        assert!(matches!(sink.play(Vec::new()), Err(Error::Audio(_))));
        assert!(sink.last_clip().is_none());
    }
}
