use thiserror::Error;

use crate::storage::error::StorageError;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("could not prepare audio for playback: {0}")]
    Handle(std::io::Error),

    #[error("could not launch audio player: {0}")]
    Spawn(std::io::Error),

    #[error("audio player exited: {0}")]
    PlayerExited(String),

    #[error("could not talk to audio player: {0}")]
    Ipc(std::io::Error),

    #[error("could not encode player command: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("playback did not start: {0}")]
    StartRejected(String),
}
