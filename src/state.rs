// state.rs: Playback state snapshot shared between the engine and shells

use crate::content::Track;

/// Engine phase. `Idle` until the first track is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Track bound to the output, position 0, not started yet.
    Loaded,
    Playing,
    Paused,
}

/// Snapshot of the single playback state.
///
/// `duration` is 0 until the output reports the track's metadata;
/// `current_time` stays within `[0, duration]` once it is known.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub phase: Phase,
    pub current_time: f64,
    pub duration: f64,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn has_duration(&self) -> bool {
        self.duration > 0.0
    }

    /// Fraction of the track played, for progress bars.
    pub fn progress(&self) -> f64 {
        if self.has_duration() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Whether `track` is the current one, by title.
    pub fn is_current(&self, track: &Track) -> bool {
        self.current_track
            .as_ref()
            .is_some_and(|t| t.title == track.title)
    }
}
