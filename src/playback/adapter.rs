use std::{
    path::Path,
    time::{Duration, Instant},
};

use crate::{
    domain::{
        record::SlotRecord,
        slot::SlotCode,
        title::{EMPTY_TITLE, or_empty},
    },
    playback::{
        error::PlaybackError,
        handle::{BlobHandle, ReleaseSchedule},
        output::{AudioOutput, OutputEvent},
    },
    storage::records::RecordStore,
};

/// Drives an [`AudioOutput`] for slots and keeps the "now playing" text.
///
/// The title of a requested track is only *pending* until the output
/// confirms that audio started. A start that never happens therefore
/// never replaces the confirmed title, and a track that fails after its
/// start hands the display back to the title confirmed before it.
pub struct PlaybackAdapter<O: AudioOutput> {
    output: O,
    /// audio file the output has loaded, kept until another one replaces it
    current: Option<BlobHandle>,
    releases: ReleaseSchedule,
    confirmed: String,
    pending: Option<String>,
    fallback: Option<String>,
}

impl<O: AudioOutput> PlaybackAdapter<O> {
    pub fn new(output: O, release_grace: Duration) -> Self {
        Self {
            output,
            current: None,
            releases: ReleaseSchedule::new(release_grace),
            confirmed: EMPTY_TITLE.to_string(),
            pending: None,
            fallback: None,
        }
    }

    /// Looks up `slot` and starts it. Empty slots are ignored.
    pub fn play_slot<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        slot: SlotCode,
        user_initiated: bool,
    ) -> Result<(), PlaybackError> {
        match store.get(slot)? {
            Some(record) => self.play_record(&record, user_initiated),
            None => {
                log::warn!("no file assigned to {slot}");
                Ok(())
            }
        }
    }

    /// Requests playback of `record`.
    ///
    /// A failed start is returned only when `user_initiated`; otherwise it
    /// is logged and the previous confirmed title stays on display.
    pub fn play_record(
        &mut self,
        record: &SlotRecord,
        user_initiated: bool,
    ) -> Result<(), PlaybackError> {
        let now = Instant::now();
        self.releases.sweep(now);
        self.pending = Some(record.display_title());

        let requested = self
            .load_record(record, now)
            .and_then(|()| self.output.play());

        match requested {
            Ok(()) => {
                log::info!("requested {} ({})", record.slot, record.display_title());
                Ok(())
            }
            Err(e) => self.start_failed(e, user_initiated),
        }
    }

    /// Materializes the blob and hands it to the output. The file it
    /// replaces is released once the grace window has passed.
    fn load_record(&mut self, record: &SlotRecord, now: Instant) -> Result<(), PlaybackError> {
        let handle = BlobHandle::create(record).map_err(PlaybackError::Handle)?;
        self.output.load(handle.path(), &record.mime)?;
        if let Some(replaced) = self.current.replace(handle) {
            self.releases.retire(replaced, now);
        }
        Ok(())
    }

    fn start_failed(&mut self, error: PlaybackError, user_initiated: bool) -> Result<(), PlaybackError> {
        self.pending = None;
        if user_initiated {
            Err(error)
        } else {
            log::debug!("automatic playback did not start: {error}");
            Ok(())
        }
    }

    /// Output confirmed that audio is playing.
    pub fn on_started(&mut self) {
        if let Some(title) = self.pending.take() {
            let previous = std::mem::replace(&mut self.confirmed, or_empty(&title));
            self.fallback = Some(previous);
        }
    }

    /// Output reported that the requested or playing track failed.
    pub fn on_failed(&mut self, reason: &str) {
        log::warn!("playback failed: {reason}");
        if self.pending.take().is_some() {
            return;
        }
        if let Some(previous) = self.fallback.take() {
            self.confirmed = previous;
        }
    }

    pub fn pause(&mut self) {
        self.output.pause();
    }

    /// Continues the loaded source.
    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        self.output.play()
    }

    /// Pause and seek back to the start.
    pub fn stop(&mut self) {
        self.output.pause();
        self.output.rewind();
    }

    /// Back to the empty state once the queue ran out.
    pub fn reset_display(&mut self) {
        self.pending = None;
        self.fallback = None;
        self.confirmed = EMPTY_TITLE.to_string();
    }

    /// what the "now playing" window shows
    pub fn now_playing_title(&self) -> String {
        or_empty(self.pending.as_deref().unwrap_or(&self.confirmed))
    }

    pub fn confirmed_title(&self) -> &str {
        &self.confirmed
    }

    pub fn pending_title(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn is_audio_active(&self) -> bool {
        self.output.is_playing()
    }

    pub fn is_paused_on_source(&self) -> bool {
        self.output.is_paused_on_source()
    }

    pub fn poll_output(&mut self) -> Option<OutputEvent> {
        self.output.poll_event()
    }

    /// releases handles whose grace window has passed
    pub fn tick(&mut self, now: Instant) -> usize {
        self.releases.sweep(now)
    }

    /// replaced audio files still waiting for their grace window
    pub fn held_handles(&self) -> usize {
        self.releases.pending()
    }

    pub fn loaded_path(&self) -> Option<&Path> {
        self.current.as_ref().map(BlobHandle::path)
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }
}
