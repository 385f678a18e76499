// output.rs: the single audio resource commanded by the playback engine

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OutputError {
    #[error("audio output is closed")]
    Closed,
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),
    #[error("audio device error: {0}")]
    Device(String),
}

/// An audio output. Only the playback engine holds one.
///
/// Commands return once they are queued; outcomes (`Started`, `Rejected`,
/// time and duration updates, `Ended`) come back later as
/// [`BackendEvent`](crate::event::BackendEvent)s tagged with the
/// `generation` passed to [`load`](AudioOutput::load). An `Err` here means
/// the command could not even be queued.
pub trait AudioOutput: Send {
    /// Bind a new source. Discards the previous one and its position.
    fn load(&mut self, source: &str, generation: u64) -> Result<(), OutputError>;
    fn play(&mut self, generation: u64) -> Result<(), OutputError>;
    fn pause(&mut self, generation: u64) -> Result<(), OutputError>;
    fn seek(&mut self, generation: u64, position: f64) -> Result<(), OutputError>;
    /// Release the device. Further commands fail with `Closed`.
    fn stop(&mut self);
}
