//! Play queue with a playback cursor and an independent browse cursor.
//!
//! The engine never talks to audio output itself. Each operation returns a
//! [`Transition`] describing what playback should do next.

use crate::domain::{Direction, slot::SlotCode, title::EMPTY_TITLE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub slot: SlotCode,
    pub title: String,
}

impl QueueEntry {
    pub fn new(slot: SlotCode, title: impl Into<String>) -> Self {
        Self {
            slot,
            title: title.into(),
        }
    }

    /// text shown in the "up next" window
    pub fn display_text(&self) -> String {
        if self.title.trim().is_empty() {
            self.slot.to_string()
        } else {
            self.title.clone()
        }
    }
}

/// What playback has to do after a queue operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// start the entry at the queue cursor
    Play(QueueEntry),
    /// pause and seek back to the start, cursor stays put
    Stop,
    /// the last entry ended, the display goes back to its empty state
    Finished,
    Nothing,
}

#[derive(Debug, Default)]
pub struct QueueEngine {
    entries: Vec<QueueEntry>,
    cursor: Option<usize>,
    browse: Option<usize>,
}

impl QueueEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn browse_cursor(&self) -> Option<usize> {
        self.browse
    }

    /// entry previewed in the "up next" window
    pub fn up_next(&self) -> Option<&QueueEntry> {
        self.browse.and_then(|i| self.entries.get(i))
    }

    pub fn up_next_text(&self) -> String {
        self.up_next()
            .map(QueueEntry::display_text)
            .unwrap_or_else(|| EMPTY_TITLE.to_string())
    }

    /// Appends `entry`. On an idle player it becomes the current track and
    /// starts playing; otherwise it only waits in line.
    pub fn enqueue(&mut self, entry: QueueEntry, audio_active: bool) -> Transition {
        self.entries.push(entry);
        let appended = self.entries.len() - 1;

        let transition = if self.cursor.is_none() && !audio_active {
            self.move_cursor(appended)
        } else {
            Transition::Nothing
        };
        self.normalize_browse();
        transition
    }

    /// User driven skip. Never wraps; running off either end stops playback.
    pub fn advance(&mut self, direction: Direction) -> Transition {
        if self.entries.is_empty() {
            return Transition::Nothing;
        }

        let target = match (direction, self.cursor) {
            (Direction::Next, None) => Some(0),
            (Direction::Next, Some(i)) if i + 1 < self.entries.len() => Some(i + 1),
            (Direction::Prev, Some(i)) if i > 0 => Some(i - 1),
            _ => None,
        };

        let transition = match target {
            Some(index) => self.move_cursor(index),
            None => Transition::Stop,
        };
        self.normalize_browse();
        transition
    }

    /// The current track finished on its own.
    pub fn on_track_end(&mut self) -> Transition {
        if self.entries.is_empty() {
            return Transition::Nothing;
        }

        let next = self.cursor.map_or(0, |i| i + 1);
        if next < self.entries.len() {
            let transition = self.move_cursor(next);
            self.normalize_browse();
            transition
        } else {
            self.browse = None;
            Transition::Finished
        }
    }

    /// Transport "play": (re)starts the current entry, or the first one if
    /// nothing was ever active.
    pub fn play(&mut self) -> Transition {
        if self.entries.is_empty() {
            return Transition::Nothing;
        }
        let index = self.cursor.unwrap_or(0);
        let transition = self.move_cursor(index);
        self.normalize_browse();
        transition
    }

    /// Moves the "up next" preview within the entries after the cursor.
    /// Playback is not affected.
    pub fn browse(&mut self, direction: Direction) -> Option<&QueueEntry> {
        let Some(cursor) = self.cursor else {
            return None;
        };
        if self.entries.is_empty() {
            return None;
        }

        let first = cursor + 1;
        let last = self.entries.len() - 1;
        if first > last {
            self.browse = None;
            return None;
        }

        let current = self.browse.unwrap_or(first).max(first);
        self.browse = Some(match direction {
            Direction::Prev => current.saturating_sub(1).max(first),
            Direction::Next => (current + 1).min(last),
        });
        self.up_next()
    }

    fn move_cursor(&mut self, index: usize) -> Transition {
        self.cursor = Some(index);
        self.browse = None;
        Transition::Play(self.entries[index].clone())
    }

    /// Keeps the browse cursor inside `[cursor + 1, len - 1]`, defaulting to
    /// the entry right after the cursor.
    fn normalize_browse(&mut self) {
        let Some(cursor) = self.cursor else {
            self.browse = None;
            return;
        };
        let first = cursor + 1;
        if first >= self.entries.len() {
            self.browse = None;
            return;
        }
        match self.browse {
            Some(b) if b >= first && b < self.entries.len() => {}
            _ => self.browse = Some(first),
        }
    }
}
