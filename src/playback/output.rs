//! The seam between playback and the audio device.

use std::path::Path;

use crate::playback::error::PlaybackError;

/// Signals an output reports back asynchronously to play requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// audio is actually coming out
    Started,
    /// the loaded source played to its end
    Ended,
    Failed(String),
}

/// The device side of playback.
///
/// `play` only *requests* playback. Whether it really started is reported
/// later through [`OutputEvent::Started`]; a file that breaks down after that
/// is reported as [`OutputEvent::Failed`].
pub trait AudioOutput {
    /// replaces the current source, stopping whatever played before
    fn load(&mut self, source: &Path, mime: &str) -> Result<(), PlaybackError>;

    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    /// seek back to the start of the loaded source
    fn rewind(&mut self);

    fn is_playing(&self) -> bool;

    /// a source is loaded and halted, so `play` would resume it
    fn is_paused_on_source(&self) -> bool;

    fn poll_event(&mut self) -> Option<OutputEvent>;
}
