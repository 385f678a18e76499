use tokio::time::Instant;

/// Estimates the playback position of an output between device reports.
///
/// The position is kept as an anchor plus the monotonic instant the anchor
/// was taken at; while running, the estimate is `anchor + elapsed`. Outputs
/// use it to produce time updates without querying the device.
#[derive(Debug, Default, PartialEq)]
pub struct PlaybackTimer {
    /// Anchor position in seconds (finite, >= 0).
    anchor_position: f64,
    /// Set while running; the instant `anchor_position` was observed.
    anchor_instant: Option<Instant>,
}

impl PlaybackTimer {
    /// Stop and move to `position`.
    pub fn reset(&mut self, position: f64) {
        self.anchor_position = sanitize_position(position);
        self.anchor_instant = None;
    }

    /// Move to `position`, keeping the running state.
    pub fn seek(&mut self, position: f64) {
        self.anchor_position = sanitize_position(position);
        if self.anchor_instant.is_some() {
            self.anchor_instant = Some(Instant::now());
        }
    }

    pub fn start(&mut self) {
        if self.anchor_instant.is_none() {
            self.anchor_instant = Some(Instant::now());
        }
    }

    /// Freeze the estimate at the current position.
    pub fn pause(&mut self) {
        self.anchor_position = self.position();
        self.anchor_instant = None;
    }

    pub fn is_running(&self) -> bool {
        self.anchor_instant.is_some()
    }

    pub fn position(&self) -> f64 {
        let base = self.anchor_position;
        match self.anchor_instant {
            Some(inst) => {
                let val = base + inst.elapsed().as_secs_f64();
                if val.is_finite() { val } else { base }
            }
            None => base,
        }
    }
}

/// Clamp a reported position to something meaningful: non-finite values
/// become 0, negatives clamp to 0.
pub fn sanitize_position(p: f64) -> f64 {
    if !p.is_finite() || p < 0.0 { 0.0 } else { p }
}

/// Clamp a position into `[0, duration]`. An unknown duration (0) pins the
/// position to 0.
pub fn clamp_position(p: f64, duration: f64) -> f64 {
    sanitize_position(p).min(sanitize_position(duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn sanitize_rejects_nan_and_negatives() {
        assert_eq!(sanitize_position(f64::NAN), 0.0);
        assert_eq!(sanitize_position(f64::INFINITY), 0.0);
        assert_eq!(sanitize_position(-3.0), 0.0);
        assert_eq!(sanitize_position(12.5), 12.5);
    }

    #[test]
    fn clamp_respects_duration() {
        assert_eq!(clamp_position(-5.0, 120.0), 0.0);
        assert_eq!(clamp_position(500.0, 120.0), 120.0);
        assert_eq!(clamp_position(60.0, 120.0), 60.0);
        assert_eq!(clamp_position(60.0, 0.0), 0.0);
    }

    #[test]
    fn paused_timer_holds_its_position() {
        let mut timer = PlaybackTimer::default();
        timer.reset(10.0);
        assert!(!timer.is_running());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(timer.position(), 10.0);
    }

    #[test]
    fn running_timer_advances_and_pause_freezes() {
        let mut timer = PlaybackTimer::default();
        timer.reset(1.0);
        timer.start();
        std::thread::sleep(Duration::from_millis(20));
        timer.pause();
        let frozen = timer.position();
        assert!(frozen > 1.0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(timer.position(), frozen);
    }

    #[test]
    fn seek_keeps_running_state() {
        let mut timer = PlaybackTimer::default();
        timer.start();
        timer.seek(30.0);
        assert!(timer.is_running());
        assert!(timer.position() >= 30.0);
        timer.pause();
        timer.seek(5.0);
        assert!(!timer.is_running());
        assert_eq!(timer.position(), 5.0);
    }
}
