//! File-type knowledge about audio files

use std::path::Path;

pub const MUSIC_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "m4a", "ogg", "aac", "opus", "webm"];

/// used when neither the extension nor mime_guess know better
pub const DEFAULT_MIME: &str = "audio/mpeg";

pub fn is_music_extension(ext: &str) -> bool {
    MUSIC_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

pub fn is_music_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(is_music_extension)
        .unwrap_or(false)
}

/// Map file extension (without dot) to proper MIME type for playback.
/// Returns None if the extension is not recognized.
pub fn mime_from_ext(ext: &str) -> Option<String> {
    match ext {
        "m4a" => Some("audio/x-m4a".to_string()),
        "aac" => Some("audio/aac".to_string()),
        "mp3" => Some("audio/mpeg".to_string()),
        "wav" => Some("audio/wav".to_string()),
        "ogg" => Some("audio/ogg".to_string()),
        "opus" => Some("audio/ogg".to_string()),
        "flac" => Some("audio/flac".to_string()),
        "webm" => Some("audio/webm".to_string()),
        _ => None,
    }
}

pub fn mime_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy())
        .map(|s| s.to_lowercase());
    let guessed = || {
        mime_guess::from_path(path)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| DEFAULT_MIME.to_string())
    };
    ext.and_then(|ext| mime_from_ext(ext.as_str()))
        .unwrap_or_else(guessed)
}
