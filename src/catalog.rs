//! The rolodex card view: 8 pages of 8 slots, derived from stored records

use std::collections::HashMap;

use crate::domain::{
    Direction,
    record::SlotRecord,
    slot::{LETTERS, NUMBERS, SlotCode},
    title::placeholder_title,
};

pub const PAGE_COUNT: usize = LETTERS.len();

/// One card of the rolodex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub slot: SlotCode,
    pub display_title: String,
    pub has_file: bool,
}

impl CatalogEntry {
    fn empty(slot: SlotCode) -> Self {
        Self {
            slot,
            display_title: placeholder_title(slot),
            has_file: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlotCatalog {
    pages: Vec<Vec<CatalogEntry>>,
    page_index: usize,
}

impl Default for SlotCatalog {
    fn default() -> Self {
        Self::from_records(&[])
    }
}

impl SlotCatalog {
    pub fn from_records(records: &[SlotRecord]) -> Self {
        Self {
            pages: Self::derive_pages(records),
            page_index: 0,
        }
    }

    /// Re-derives every card from `records`, keeping the open page.
    pub fn rebuild(&mut self, records: &[SlotRecord]) {
        self.pages = Self::derive_pages(records);
    }

    fn derive_pages(records: &[SlotRecord]) -> Vec<Vec<CatalogEntry>> {
        let by_slot = records
            .iter()
            .map(|r| (r.slot, r))
            .collect::<HashMap<_, _>>();

        let mut pages = vec![Vec::with_capacity(NUMBERS as usize); PAGE_COUNT];
        for slot in SlotCode::all() {
            let entry = match by_slot.get(&slot) {
                Some(record) => CatalogEntry {
                    slot,
                    display_title: record.display_title(),
                    has_file: true,
                },
                None => CatalogEntry::empty(slot),
            };
            pages[slot.page()].push(entry);
        }
        pages
    }

    /// the 8 cards of page `index`, None past the last page
    pub fn page_view(&self, index: usize) -> Option<&[CatalogEntry]> {
        self.pages.get(index).map(Vec::as_slice)
    }

    pub fn entry(&self, slot: SlotCode) -> &CatalogEntry {
        &self.pages[slot.page()][slot.number() as usize - 1]
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn current_page(&self) -> &[CatalogEntry] {
        &self.pages[self.page_index]
    }

    /// Turns the rolodex one page, wrapping around at either end.
    pub fn flip(&mut self, direction: Direction) -> usize {
        self.page_index = match direction {
            Direction::Next => (self.page_index + 1) % PAGE_COUNT,
            Direction::Prev => (self.page_index + PAGE_COUNT - 1) % PAGE_COUNT,
        };
        self.page_index
    }

    /// number of slots that have a file
    pub fn assigned_count(&self) -> usize {
        self.pages.iter().flatten().filter(|e| e.has_file).count()
    }
}
