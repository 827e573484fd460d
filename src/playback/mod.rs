//! Turning queue decisions into sound

pub mod adapter;
pub mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod handle;
pub mod mpv;
pub mod output;
pub mod queue;

pub use adapter::PlaybackAdapter;
pub use mpv::MpvOutput;
pub use output::{AudioOutput, OutputEvent};
pub use queue::{QueueEngine, QueueEntry, Transition};
