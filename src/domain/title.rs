use super::{media::is_music_extension, slot::SlotCode};

/// Shown wherever there is no title to display.
pub const EMPTY_TITLE: &str = "—";

/// Derives a human readable title from a file name.
///
/// Strips a trailing audio extension, turns runs of underscores and hyphens
/// into a single space, collapses whitespace and trims. The steps are
/// repeated until nothing changes, so `title_from_filename` of its own
/// output is always the same string.
pub fn title_from_filename(name: &str) -> String {
    let mut current = name.to_string();
    loop {
        let next = derive_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn derive_once(name: &str) -> String {
    let base = match name.rsplit_once('.') {
        Some((base, ext)) if is_music_extension(ext) => base,
        _ => name,
    };

    let mut spaced = String::with_capacity(base.len());
    let mut in_separator_run = false;
    for c in base.chars() {
        if c == '_' || c == '-' {
            if !in_separator_run {
                spaced.push(' ');
            }
            in_separator_run = true;
        } else {
            spaced.push(c);
            in_separator_run = false;
        }
    }

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title a slot shows: the explicit title if any, otherwise one derived from
/// the file name, otherwise the slot code itself.
pub fn display_title(title: &str, file_name: &str, slot: SlotCode) -> String {
    if !title.trim().is_empty() {
        return title.to_string();
    }
    let derived = title_from_filename(file_name);
    if derived.is_empty() {
        slot.to_string()
    } else {
        derived
    }
}

/// Placeholder for slots with nothing assigned.
pub fn placeholder_title(slot: SlotCode) -> String {
    format!("Song {slot}")
}

/// Replaces blank text with the empty-state dash.
pub fn or_empty(text: &str) -> String {
    if text.trim().is_empty() {
        EMPTY_TITLE.to_string()
    } else {
        text.to_string()
    }
}
