//! In-memory output double for tests.

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use crate::playback::{
    error::PlaybackError,
    output::{AudioOutput, OutputEvent},
};

#[derive(Debug, Default)]
pub struct FakeOutput {
    /// every loaded path, in order
    pub loaded: Vec<PathBuf>,
    pub plays: usize,
    pub pauses: usize,
    pub rewinds: usize,
    /// makes the next `play` calls fail like a blocked autoplay
    pub reject_play: bool,
    pub playing: bool,
    pub paused: bool,
    pub events: VecDeque<OutputEvent>,
}

impl FakeOutput {
    pub fn last_loaded(&self) -> Option<&Path> {
        self.loaded.last().map(PathBuf::as_path)
    }
}

impl AudioOutput for FakeOutput {
    fn load(&mut self, source: &Path, _mime: &str) -> Result<(), PlaybackError> {
        self.loaded.push(source.to_path_buf());
        self.playing = false;
        self.paused = false;
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.plays += 1;
        if self.reject_play {
            return Err(PlaybackError::StartRejected("autoplay blocked".into()));
        }
        // a real player cannot start a file that is gone
        match self.last_loaded() {
            Some(path) if path.exists() => {}
            _ => return Err(PlaybackError::StartRejected("source is gone".into())),
        }
        self.playing = true;
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.pauses += 1;
        self.playing = false;
        self.paused = !self.loaded.is_empty();
    }

    fn rewind(&mut self) {
        self.rewinds += 1;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_paused_on_source(&self) -> bool {
        self.paused
    }

    fn poll_event(&mut self) -> Option<OutputEvent> {
        self.events.pop_front()
    }
}
