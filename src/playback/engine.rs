//! The playback engine: one state machine over one audio output.
//!
//! ```text
//!   Idle ──load──▶ Loaded ──play──▶ Playing ──pause──▶ Paused
//!                    ▲                │  ▲               │
//!                    │                │  └─────play──────┘
//!                    │              ended / rejected ──▶ Paused
//!   any ─────────load┘
//! ```
//!
//! Every `load_track` bumps a generation number. Commands to the output and
//! events coming back carry it, and events for any generation other than
//! the current one are dropped, so a late `Started`/`Rejected`/`Ended` from
//! an abandoned track can never touch the new one.

use crate::content::Track;
use crate::event::{BackendEvent, BackendEventKind, Notification, Notifier};
use crate::playback::output::AudioOutput;
use crate::playback::PlaybackError;
use crate::state::{Phase, PlaybackState};
use crate::timer::{clamp_position, sanitize_position};

/// What applying a backend event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendOutcome {
    Applied,
    /// Belonged to an older load; ignored.
    Stale,
    /// The current track finished; the caller decides what plays next.
    Ended,
}

pub struct PlaybackEngine {
    output: Box<dyn AudioOutput>,
    notifier: Notifier,
    state: PlaybackState,
    generation: u64,
    /// Set when the output refused the current source at load time.
    load_error: Option<String>,
}

impl PlaybackEngine {
    pub fn new(output: Box<dyn AudioOutput>, notifier: Notifier) -> Self {
        Self {
            output,
            notifier,
            state: PlaybackState::default(),
            generation: 0,
            load_error: None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state.current_track.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn publish_state(&self) {
        self.notifier
            .emit(Notification::PlaybackStateChanged(self.state.clone()));
    }

    fn publish_time(&self) {
        self.notifier.emit(Notification::TimeUpdated {
            current_time: self.state.current_time,
            duration: self.state.duration,
        });
    }

    fn reject(&mut self, reason: String) -> PlaybackError {
        tracing::warn!(
            track = self.current_track().map(|t| t.title.as_str()).unwrap_or_default(),
            %reason,
            "playback rejected"
        );
        if self.state.phase == Phase::Playing {
            self.state.phase = Phase::Paused;
        }
        self.publish_state();
        self.notifier.emit(Notification::PlaybackRejected {
            reason: reason.clone(),
        });
        PlaybackError::Rejected(reason)
    }

    /// Bind `track` to the output. Position resets to 0 and the duration is
    /// unknown until the output reports it.
    pub fn load_track(&mut self, track: Track) {
        self.generation += 1;
        tracing::info!(title = %track.title, generation = self.generation, "loading track");
        self.load_error = match self.output.load(&track.file, self.generation) {
            Ok(()) => None,
            Err(e) => Some(e.to_string()),
        };
        self.state = PlaybackState {
            current_track: Some(track),
            phase: Phase::Loaded,
            current_time: 0.0,
            duration: 0.0,
        };
        self.publish_state();
        self.publish_time();
    }

    /// Start playback. The transition to `Playing` is optimistic; a later
    /// `Rejected` from the output reverts it.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if self.state.current_track.is_none() {
            return Err(PlaybackError::NoActiveTrack);
        }
        if self.state.phase == Phase::Playing {
            return Ok(());
        }
        if let Some(reason) = self.load_error.clone() {
            return Err(self.reject(reason));
        }
        if let Err(e) = self.output.play(self.generation) {
            return Err(self.reject(e.to_string()));
        }
        self.state.phase = Phase::Playing;
        self.publish_state();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        if self.state.current_track.is_none() {
            return Err(PlaybackError::NoActiveTrack);
        }
        if self.state.phase != Phase::Playing {
            return Ok(());
        }
        if let Err(e) = self.output.pause(self.generation) {
            tracing::warn!(error = %e, "output refused pause");
        }
        self.state.phase = Phase::Paused;
        self.publish_state();
        Ok(())
    }

    pub fn toggle_play(&mut self) -> Result<(), PlaybackError> {
        if self.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Pause if playing; used when the user leaves the current section.
    pub fn force_pause(&mut self) {
        if self.is_playing() {
            tracing::debug!("pausing playback on section switch");
            let _ = self.pause();
        }
    }

    /// Jump to `position`, clamped to `[0, duration]`. The new position is
    /// visible immediately; the play/pause state is unchanged.
    pub fn seek(&mut self, position: f64) -> Result<f64, PlaybackError> {
        if self.state.current_track.is_none() {
            return Err(PlaybackError::NoActiveTrack);
        }
        let target = clamp_position(position, self.state.duration);
        self.state.current_time = target;
        if let Err(e) = self.output.seek(self.generation, target) {
            tracing::warn!(error = %e, "output refused seek");
        }
        self.publish_time();
        Ok(target)
    }

    /// Apply a report from the output, in arrival order.
    pub fn handle_backend(&mut self, event: BackendEvent) -> BackendOutcome {
        if event.generation != self.generation || self.state.current_track.is_none() {
            tracing::trace!(
                event_generation = event.generation,
                current = self.generation,
                "discarding stale backend event"
            );
            return BackendOutcome::Stale;
        }
        match event.kind {
            BackendEventKind::Started => {
                tracing::debug!(generation = event.generation, "output started");
            }
            BackendEventKind::Rejected(reason) => {
                let _ = self.reject(reason);
            }
            BackendEventKind::TimeUpdate(t) => {
                let t = sanitize_position(t);
                self.state.current_time = if self.state.has_duration() {
                    t.min(self.state.duration)
                } else {
                    t
                };
                self.publish_time();
            }
            BackendEventKind::DurationKnown(d) => {
                self.state.duration = sanitize_position(d);
                if self.state.has_duration() {
                    self.state.current_time = self.state.current_time.min(self.state.duration);
                }
                self.publish_time();
            }
            BackendEventKind::Ended => {
                tracing::debug!(generation = event.generation, "track ended");
                self.state.phase = Phase::Paused;
                if self.state.has_duration() {
                    self.state.current_time = self.state.duration;
                }
                self.publish_state();
                self.notifier.emit(Notification::TrackEnded);
                return BackendOutcome::Ended;
            }
        }
        BackendOutcome::Applied
    }

    /// Release the output.
    pub fn shutdown(&mut self) {
        self.output.stop();
    }
}
