//! Playback: the engine state machine and the audio outputs it drives.

pub mod clock;
#[cfg(feature = "audio")]
pub mod device;
pub mod engine;
pub mod output;

pub use clock::ClockOutput;
#[cfg(feature = "audio")]
pub use device::DeviceOutput;
pub use engine::{BackendOutcome, PlaybackEngine};
pub use output::{AudioOutput, OutputError};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Play, pause or seek with nothing loaded. Callers treat it as a no-op.
    #[error("no track is loaded")]
    NoActiveTrack,
    #[error("playback rejected: {0}")]
    Rejected(String),
}
