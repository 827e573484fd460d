use std::path::Path;

use super::{
    media::mime_for_path,
    slot::SlotCode,
    title::{display_title, title_from_filename},
};

/// An audio file bound to a slot, as persisted by the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub slot: SlotCode,
    pub file_name: String,
    pub title: String,
    pub mime: String,
    pub audio: Vec<u8>,
}

impl SlotRecord {
    /// Reads `path` into a record for `slot`.
    ///
    /// A blank `title` is replaced by one derived from the file name.
    pub fn from_file(slot: SlotCode, path: &Path, title: Option<&str>) -> std::io::Result<Self> {
        let audio = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(slot, file_name, title, mime_for_path(path), audio))
    }

    pub fn new(
        slot: SlotCode,
        file_name: String,
        title: Option<&str>,
        mime: String,
        audio: Vec<u8>,
    ) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| title_from_filename(&file_name));
        Self {
            slot,
            file_name,
            title,
            mime,
            audio,
        }
    }

    pub fn display_title(&self) -> String {
        display_title(&self.title, &self.file_name, self.slot)
    }

    /// file extension used when the blob has to be materialized on disk
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn record_from_file_derives_title_and_mime() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("My_Song.mp3");
        fs::write(&path, b"ID3")?;

        let record = SlotRecord::from_file("B3".parse()?, &path, None)?;

        assert_eq!(record.file_name, "My_Song.mp3");
        assert_eq!(record.title, "My Song");
        assert_eq!(record.mime, "audio/mpeg");
        assert_eq!(record.audio, b"ID3");
        assert_eq!(record.extension(), Some("mp3"));
        Ok(())
    }

    #[test]
    fn explicit_title_is_trimmed_and_kept() -> anyhow::Result<()> {
        let record = SlotRecord::new(
            "A1".parse()?,
            "x.mp3".into(),
            Some("  Intro  "),
            "audio/mpeg".into(),
            vec![],
        );
        assert_eq!(record.title, "Intro");

        let blank = SlotRecord::new(
            "A1".parse()?,
            "the-intro.mp3".into(),
            Some("   "),
            "audio/mpeg".into(),
            vec![],
        );
        assert_eq!(blank.title, "the intro");
        Ok(())
    }
}
