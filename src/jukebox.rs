//! One jukebox session: the slot store, the rolodex cards, the play queue
//! and the audio output, mutated only through the methods below.

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use crate::{
    catalog::{CatalogEntry, SlotCatalog},
    domain::{
        Direction,
        media::is_music_file,
        record::SlotRecord,
        slot::{SLOT_COUNT, SlotCode},
    },
    playback::{
        AudioOutput, OutputEvent, PlaybackAdapter, QueueEngine, QueueEntry, Transition,
        error::PlaybackError,
    },
    storage::{error::StorageError, records::RecordStore},
};

pub struct Jukebox<S: RecordStore, O: AudioOutput> {
    store: S,
    catalog: SlotCatalog,
    queue: QueueEngine,
    playback: PlaybackAdapter<O>,
    selected_letter: Option<char>,
}

impl<S: RecordStore, O: AudioOutput> Jukebox<S, O> {
    pub fn new(mut store: S, output: O, release_grace: Duration) -> Result<Self, StorageError> {
        let catalog = SlotCatalog::from_records(&store.get_all()?);
        Ok(Self {
            store,
            catalog,
            queue: QueueEngine::new(),
            playback: PlaybackAdapter::new(output, release_grace),
            selected_letter: None,
        })
    }

    fn refresh_catalog(&mut self) -> Result<(), StorageError> {
        let records = self.store.get_all()?;
        self.catalog.rebuild(&records);
        Ok(())
    }

    pub fn page_view(&self, page: usize) -> Option<&[CatalogEntry]> {
        self.catalog.page_view(page)
    }

    pub fn catalog(&self) -> &SlotCatalog {
        &self.catalog
    }

    pub fn queue(&self) -> &QueueEngine {
        &self.queue
    }

    pub fn now_playing_title(&self) -> String {
        self.playback.now_playing_title()
    }

    pub fn up_next_title(&self) -> String {
        self.queue.up_next_text()
    }

    pub fn selected_letter(&self) -> Option<char> {
        self.selected_letter
    }

    pub fn flip_page(&mut self, direction: Direction) -> usize {
        self.catalog.flip(direction)
    }

    /// Enqueues `slot`; on an idle jukebox it starts playing right away.
    /// Empty slots are logged and ignored.
    pub fn select_slot(&mut self, slot: SlotCode) -> Result<(), PlaybackError> {
        let Some(record) = self.store.get(slot)? else {
            log::warn!("no file assigned for {slot}");
            return Ok(());
        };

        let entry = QueueEntry::new(slot, record.display_title());
        let transition = self.queue.enqueue(entry, self.playback.is_audio_active());
        self.apply(transition, true)
    }

    pub fn advance(&mut self, direction: Direction) -> Result<(), PlaybackError> {
        let transition = self.queue.advance(direction);
        self.apply(transition, true)
    }

    /// Moves the "up next" preview and returns its new text.
    pub fn browse(&mut self, direction: Direction) -> String {
        self.queue.browse(direction);
        self.queue.up_next_text()
    }

    /// Transport play: resumes a paused track or (re)starts the current one.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if self.queue.is_empty() {
            return Ok(());
        }
        if self.queue.cursor().is_some() && self.playback.is_paused_on_source() {
            return self.playback.resume();
        }
        let transition = self.queue.play();
        self.apply(transition, true)
    }

    pub fn pause(&mut self) {
        self.playback.pause();
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    /// The current track played to its end.
    pub fn on_track_end(&mut self) -> Result<(), PlaybackError> {
        let transition = self.queue.on_track_end();
        self.apply(transition, false)
    }

    pub fn handle_output_event(&mut self, event: OutputEvent) -> Result<(), PlaybackError> {
        log::debug!("output event {event:?}");
        match event {
            OutputEvent::Started => self.playback.on_started(),
            OutputEvent::Ended => self.on_track_end()?,
            OutputEvent::Failed(reason) => self.playback.on_failed(&reason),
        }
        Ok(())
    }

    /// Drains pending output events and releases expired audio handles.
    pub fn tick(&mut self, now: Instant) -> Result<(), PlaybackError> {
        while let Some(event) = self.playback.poll_output() {
            self.handle_output_event(event)?;
        }
        self.playback.tick(now);
        Ok(())
    }

    fn apply(&mut self, transition: Transition, user_initiated: bool) -> Result<(), PlaybackError> {
        match transition {
            Transition::Play(entry) => {
                self.playback
                    .play_slot(&mut self.store, entry.slot, user_initiated)
            }
            Transition::Stop => {
                self.playback.stop();
                Ok(())
            }
            Transition::Finished => {
                self.playback.reset_display();
                Ok(())
            }
            Transition::Nothing => Ok(()),
        }
    }

    /// First half of a keypad selection. Returns false for keys outside A-H.
    pub fn press_letter(&mut self, letter: char) -> bool {
        match SlotCode::new(letter, 1) {
            Ok(code) => {
                self.selected_letter = Some(code.letter());
                true
            }
            Err(_) => false,
        }
    }

    /// Second half of a keypad selection. Ignored until a letter was pressed.
    /// The letter stays selected for further numbers.
    pub fn press_number(&mut self, number: u8) -> Result<Option<SlotCode>, PlaybackError> {
        let Some(letter) = self.selected_letter else {
            return Ok(None);
        };
        match SlotCode::new(letter, number) {
            Ok(slot) => {
                self.select_slot(slot)?;
                Ok(Some(slot))
            }
            Err(e) => {
                log::debug!("ignoring key: {e}");
                Ok(None)
            }
        }
    }

    /// Stores `path` in `slot`, replacing what was there. A blank or absent
    /// title is derived from the file name.
    pub fn assign_file(
        &mut self,
        slot: SlotCode,
        path: &Path,
        title: Option<&str>,
    ) -> Result<SlotRecord, StorageError> {
        if !is_music_file(path) {
            log::warn!("{} does not look like an audio file", path.to_string_lossy());
        }
        let record = SlotRecord::from_file(slot, path, title)?;
        self.store.put(&record)?;
        log::info!("assigned {} to {slot} as '{}'", record.file_name, record.title);
        self.refresh_catalog()?;
        Ok(record)
    }

    pub fn set_title(&mut self, slot: SlotCode, title: &str) -> Result<bool, StorageError> {
        let found = self.store.set_title(slot, title)?;
        if found {
            self.refresh_catalog()?;
        }
        Ok(found)
    }

    /// Fills slots in catalog order (A1, A2, ...) with `paths`, titling each
    /// from its file name. Paths beyond the 64th slot are skipped.
    pub fn autofill(&mut self, paths: &[PathBuf]) -> Result<Vec<SlotCode>, StorageError> {
        if paths.len() > SLOT_COUNT {
            log::warn!(
                "only {SLOT_COUNT} of {} files fit into the rolodex",
                paths.len()
            );
        }

        let mut filled = Vec::new();
        for (slot, path) in SlotCode::all().zip(paths) {
            let record = SlotRecord::from_file(slot, path, None)?;
            self.store.put(&record)?;
            filled.push(slot);
        }
        self.refresh_catalog()?;
        Ok(filled)
    }

    /// returns whether the slot held a file
    pub fn clear_slot(&mut self, slot: SlotCode) -> Result<bool, StorageError> {
        let removed = self.store.delete(slot)?;
        if removed {
            self.refresh_catalog()?;
        } else {
            log::debug!("{slot} was already empty");
        }
        Ok(removed)
    }

    pub fn clear_all(&mut self) -> Result<usize, StorageError> {
        let removed = self.store.clear_all()?;
        self.refresh_catalog()?;
        Ok(removed)
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn playback(&self) -> &PlaybackAdapter<O> {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackAdapter<O> {
        &mut self.playback
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rusqlite::Connection;
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::{
        domain::title::EMPTY_TITLE,
        playback::fake::FakeOutput,
        storage::{records::SlotStore, schema},
    };

    fn slot(code: &str) -> SlotCode {
        code.parse().unwrap()
    }

    fn setup_jukebox() -> anyhow::Result<Jukebox<SlotStore, FakeOutput>> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        Ok(Jukebox::new(
            SlotStore::from_existing_conn(conn),
            FakeOutput::default(),
            Duration::from_secs(30),
        )?)
    }

    fn write_file(dir: &TempDir, name: &str) -> anyhow::Result<PathBuf> {
        let path = dir.path().join(name);
        fs::write(&path, name.as_bytes())?;
        Ok(path)
    }

    fn assign(
        jukebox: &mut Jukebox<SlotStore, FakeOutput>,
        dir: &TempDir,
        code: &str,
        name: &str,
    ) -> anyhow::Result<()> {
        let path = write_file(dir, name)?;
        jukebox.assign_file(slot(code), &path, None)?;
        Ok(())
    }

    fn confirm_start(jukebox: &mut Jukebox<SlotStore, FakeOutput>) -> anyhow::Result<()> {
        jukebox.handle_output_event(OutputEvent::Started)?;
        Ok(())
    }

    #[test]
    fn assigned_file_plays_on_idle_jukebox() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "B3", "My_Song.mp3")?;

        assert_eq!(jukebox.page_view(1).unwrap()[2].display_title, "My Song");

        jukebox.select_slot(slot("B3"))?;

        assert_eq!(jukebox.queue().cursor(), Some(0));
        assert_eq!(jukebox.playback().output().plays, 1);
        assert_eq!(jukebox.playback().confirmed_title(), EMPTY_TITLE);

        jukebox
            .playback_mut()
            .output_mut()
            .events
            .push_back(OutputEvent::Started);
        jukebox.tick(Instant::now())?;

        assert_eq!(jukebox.playback().confirmed_title(), "My Song");
        assert_eq!(jukebox.now_playing_title(), "My Song");
        assert_eq!(jukebox.up_next_title(), EMPTY_TITLE);
        Ok(())
    }

    #[test]
    fn selecting_empty_slot_is_ignored() -> anyhow::Result<()> {
        let mut jukebox = setup_jukebox()?;

        jukebox.select_slot(slot("E5"))?;

        assert!(jukebox.queue().is_empty());
        assert_eq!(jukebox.playback().output().plays, 0);
        Ok(())
    }

    #[test]
    fn selecting_while_playing_only_appends() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "A1", "one.mp3")?;
        assign(&mut jukebox, &dir, "A2", "two.mp3")?;

        jukebox.select_slot(slot("A1"))?;
        confirm_start(&mut jukebox)?;
        jukebox.select_slot(slot("A2"))?;

        assert_eq!(jukebox.queue().cursor(), Some(0));
        assert_eq!(jukebox.queue().len(), 2);
        assert_eq!(jukebox.playback().output().plays, 1);
        assert_eq!(jukebox.now_playing_title(), "one");
        assert_eq!(jukebox.up_next_title(), "two");
        Ok(())
    }

    #[test]
    fn advancing_through_the_queue_then_stopping() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        for code in ["A1", "A2", "A3"] {
            assign(&mut jukebox, &dir, code, &format!("{code}.mp3"))?;
            jukebox.select_slot(slot(code))?;
        }
        assert_eq!(jukebox.queue().cursor(), Some(0));

        jukebox.advance(Direction::Next)?;
        jukebox.advance(Direction::Next)?;

        assert_eq!(jukebox.queue().cursor(), Some(2));
        let output = jukebox.playback().output();
        assert_eq!(output.loaded.len(), 3);
        assert_eq!(fs::read(output.last_loaded().unwrap())?, b"A3.mp3");

        jukebox.advance(Direction::Next)?;

        assert_eq!(jukebox.queue().cursor(), Some(2));
        let output = jukebox.playback().output();
        assert_eq!(output.loaded.len(), 3);
        assert_eq!(output.pauses, 1);
        assert_eq!(output.rewinds, 1);
        Ok(())
    }

    #[test]
    fn prev_at_first_entry_stops() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "A1", "a.mp3")?;
        jukebox.select_slot(slot("A1"))?;

        jukebox.advance(Direction::Prev)?;

        assert_eq!(jukebox.queue().cursor(), Some(0));
        assert_eq!(jukebox.playback().output().rewinds, 1);
        assert_eq!(jukebox.playback().output().plays, 1);
        Ok(())
    }

    #[test]
    fn track_end_auto_advances_and_finishes() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "A1", "first.mp3")?;
        assign(&mut jukebox, &dir, "A2", "second.mp3")?;
        jukebox.select_slot(slot("A1"))?;
        confirm_start(&mut jukebox)?;
        jukebox.select_slot(slot("A2"))?;

        jukebox.handle_output_event(OutputEvent::Ended)?;
        confirm_start(&mut jukebox)?;

        assert_eq!(jukebox.queue().cursor(), Some(1));
        assert_eq!(jukebox.now_playing_title(), "second");

        jukebox.handle_output_event(OutputEvent::Ended)?;

        assert_eq!(jukebox.queue().cursor(), Some(1));
        assert_eq!(jukebox.now_playing_title(), EMPTY_TITLE);
        assert_eq!(jukebox.up_next_title(), EMPTY_TITLE);
        Ok(())
    }

    #[test]
    fn blocked_auto_advance_keeps_previous_title() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "A1", "first.mp3")?;
        assign(&mut jukebox, &dir, "A2", "second.mp3")?;
        jukebox.select_slot(slot("A1"))?;
        confirm_start(&mut jukebox)?;
        jukebox.select_slot(slot("A2"))?;

        jukebox.playback_mut().output_mut().reject_play = true;
        jukebox.handle_output_event(OutputEvent::Ended)?;

        assert_eq!(jukebox.queue().cursor(), Some(1));
        assert_eq!(jukebox.now_playing_title(), "first");
        Ok(())
    }

    #[test]
    fn blocked_user_selection_is_reported() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "A1", "first.mp3")?;
        jukebox.playback_mut().output_mut().reject_play = true;

        let result = jukebox.select_slot(slot("A1"));

        assert!(matches!(result, Err(PlaybackError::StartRejected(_))));
        assert_eq!(jukebox.now_playing_title(), EMPTY_TITLE);
        Ok(())
    }

    #[test]
    fn browse_previews_without_touching_playback() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        for (code, name) in [("A1", "one.mp3"), ("A2", "two.mp3"), ("A3", "three.mp3")] {
            assign(&mut jukebox, &dir, code, name)?;
            jukebox.select_slot(slot(code))?;
        }

        assert_eq!(jukebox.browse(Direction::Next), "three");
        assert_eq!(jukebox.browse(Direction::Next), "three");
        assert_eq!(jukebox.browse(Direction::Prev), "two");

        assert_eq!(jukebox.queue().cursor(), Some(0));
        assert_eq!(jukebox.playback().output().plays, 1);
        Ok(())
    }

    #[test]
    fn play_resumes_paused_track() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "A1", "a.mp3")?;
        jukebox.select_slot(slot("A1"))?;

        jukebox.pause();
        jukebox.play()?;

        let output = jukebox.playback().output();
        assert_eq!(output.loaded.len(), 1);
        assert_eq!(output.plays, 2);
        assert!(output.playing);
        Ok(())
    }

    #[test]
    fn resume_after_grace_window_plays_the_same_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "A1", "Long_Track.mp3")?;
        jukebox.select_slot(slot("A1"))?;
        confirm_start(&mut jukebox)?;

        jukebox.pause();
        jukebox.tick(Instant::now() + Duration::from_secs(31))?;
        jukebox.play()?;

        let output = jukebox.playback().output();
        assert_eq!(output.loaded.len(), 1);
        assert_eq!(output.plays, 2);
        assert!(output.playing);
        assert_eq!(fs::read(output.last_loaded().unwrap())?, b"Long_Track.mp3");
        assert_eq!(jukebox.now_playing_title(), "Long Track");
        Ok(())
    }

    #[test]
    fn play_after_stop_past_grace_window_restarts_the_track() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "A1", "a.mp3")?;
        jukebox.select_slot(slot("A1"))?;

        jukebox.stop();
        jukebox.tick(Instant::now() + Duration::from_secs(120))?;
        jukebox.play()?;

        let output = jukebox.playback().output();
        assert_eq!(output.rewinds, 1);
        assert_eq!(output.plays, 2);
        assert!(output.playing);
        Ok(())
    }

    #[test]
    fn track_failing_after_start_falls_back_to_previous_title() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "A1", "first.mp3")?;
        assign(&mut jukebox, &dir, "A2", "Broken_Song.mp3")?;
        jukebox.select_slot(slot("A1"))?;
        confirm_start(&mut jukebox)?;
        jukebox.select_slot(slot("A2"))?;

        jukebox.advance(Direction::Next)?;
        {
            let events = &mut jukebox.playback_mut().output_mut().events;
            events.push_back(OutputEvent::Started);
            events.push_back(OutputEvent::Failed("mpv could not play the file".into()));
        }
        jukebox.tick(Instant::now())?;

        assert_eq!(jukebox.queue().cursor(), Some(1));
        assert_eq!(jukebox.now_playing_title(), "first");
        Ok(())
    }

    #[test]
    fn play_on_empty_queue_does_nothing() -> anyhow::Result<()> {
        let mut jukebox = setup_jukebox()?;

        jukebox.play()?;

        assert_eq!(jukebox.playback().output().plays, 0);
        Ok(())
    }

    #[test]
    fn keypad_selects_letter_then_number() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "C2", "c2.mp3")?;
        assign(&mut jukebox, &dir, "C5", "c5.mp3")?;

        assert_eq!(jukebox.press_number(2)?, None);
        assert!(!jukebox.press_letter('x'));
        assert!(jukebox.press_letter('c'));
        assert_eq!(jukebox.press_number(2)?, Some(slot("C2")));
        assert_eq!(jukebox.press_number(5)?, Some(slot("C5")));
        assert_eq!(jukebox.press_number(9)?, None);

        assert_eq!(jukebox.selected_letter(), Some('C'));
        assert_eq!(jukebox.queue().len(), 2);
        Ok(())
    }

    #[test]
    fn clearing_unassigned_slot_is_noop() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "A1", "a.mp3")?;

        assert!(!jukebox.clear_slot(slot("G7"))?);

        assert_eq!(jukebox.store_mut().get_all()?.len(), 1);
        assert_eq!(jukebox.catalog().assigned_count(), 1);
        Ok(())
    }

    #[test]
    fn clearing_updates_the_cards() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "A1", "a.mp3")?;
        assign(&mut jukebox, &dir, "B1", "b.mp3")?;

        assert!(jukebox.clear_slot(slot("A1"))?);
        assert_eq!(jukebox.page_view(0).unwrap()[0].display_title, "Song A1");

        assert_eq!(jukebox.clear_all()?, 1);
        assert_eq!(jukebox.catalog().assigned_count(), 0);
        Ok(())
    }

    #[test]
    fn retitle_shows_on_cards() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        assign(&mut jukebox, &dir, "D4", "raw_name.mp3")?;

        assert!(jukebox.set_title(slot("D4"), "Better Name")?);

        assert_eq!(jukebox.page_view(3).unwrap()[3].display_title, "Better Name");
        Ok(())
    }

    #[test]
    fn autofill_assigns_in_catalog_order() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut jukebox = setup_jukebox()?;
        let paths = (0..10)
            .map(|i| write_file(&dir, &format!("track_{i:02}.mp3")))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let filled = jukebox.autofill(&paths)?;

        assert_eq!(filled.len(), 10);
        assert_eq!(filled[0], slot("A1"));
        assert_eq!(filled[8], slot("B1"));
        assert_eq!(jukebox.page_view(1).unwrap()[1].display_title, "track 09");
        Ok(())
    }

    #[test]
    fn cards_are_loaded_from_existing_store() -> anyhow::Result<()> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        let mut store = SlotStore::from_existing_conn(conn);
        store.put(&SlotRecord::new(
            slot("H8"),
            "closer.mp3".into(),
            Some("Closing Time"),
            "audio/mpeg".into(),
            vec![1, 2, 3],
        ))?;

        let jukebox = Jukebox::new(store, FakeOutput::default(), Duration::from_secs(1))?;

        assert_eq!(jukebox.page_view(7).unwrap()[7].display_title, "Closing Time");
        Ok(())
    }
}
