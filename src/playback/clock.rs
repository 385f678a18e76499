//! Silent output driven by a clock.
//!
//! Plays nothing; it advances a [`PlaybackTimer`] while "playing" and
//! reports time updates on a fixed tick, which is enough to run the whole
//! player headless (pipe mode, machines without a sound device, tests).
//! With a nominal length it also reports the duration and the natural end
//! of every track, so auto-advance works as it would with real audio.

use crate::event::{BackendEvent, BackendEventKind};
use crate::playback::output::{AudioOutput, OutputError};
use crate::timer::PlaybackTimer;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug)]
enum ClockCommand {
    Load { generation: u64 },
    Play { generation: u64 },
    Pause { generation: u64 },
    Seek { generation: u64, position: f64 },
    Stop,
}

pub struct ClockOutput {
    commands: mpsc::UnboundedSender<ClockCommand>,
    worker: Option<JoinHandle<()>>,
}

impl ClockOutput {
    /// Default interval between time updates.
    pub const TICK: Duration = Duration::from_millis(250);

    /// Start the worker on the current runtime. `nominal_length` is the
    /// duration reported for every track; `None` leaves it unknown.
    pub fn spawn(events: mpsc::UnboundedSender<BackendEvent>, nominal_length: Option<f64>) -> Self {
        Self::with_tick(events, nominal_length, Self::TICK)
    }

    pub fn with_tick(
        events: mpsc::UnboundedSender<BackendEvent>,
        nominal_length: Option<f64>,
        tick: Duration,
    ) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let worker = ClockWorker {
            events,
            nominal_length: nominal_length.filter(|l| l.is_finite() && *l > 0.0),
            generation: 0,
            timer: PlaybackTimer::default(),
        };
        Self {
            commands,
            worker: Some(tokio::spawn(run(worker, rx, tick))),
        }
    }

    fn send(&self, cmd: ClockCommand) -> Result<(), OutputError> {
        self.commands.send(cmd).map_err(|_| OutputError::Closed)
    }
}

impl AudioOutput for ClockOutput {
    fn load(&mut self, _source: &str, generation: u64) -> Result<(), OutputError> {
        self.send(ClockCommand::Load { generation })
    }

    fn play(&mut self, generation: u64) -> Result<(), OutputError> {
        self.send(ClockCommand::Play { generation })
    }

    fn pause(&mut self, generation: u64) -> Result<(), OutputError> {
        self.send(ClockCommand::Pause { generation })
    }

    fn seek(&mut self, generation: u64, position: f64) -> Result<(), OutputError> {
        self.send(ClockCommand::Seek { generation, position })
    }

    fn stop(&mut self) {
        let _ = self.commands.send(ClockCommand::Stop);
        self.worker.take();
    }
}

impl Drop for ClockOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

struct ClockWorker {
    events: mpsc::UnboundedSender<BackendEvent>,
    nominal_length: Option<f64>,
    generation: u64,
    timer: PlaybackTimer,
}

impl ClockWorker {
    fn emit(&self, kind: BackendEventKind) {
        let _ = self.events.send(BackendEvent::new(self.generation, kind));
    }

    fn clamp(&self, position: f64) -> f64 {
        match self.nominal_length {
            Some(len) => position.min(len),
            None => position,
        }
    }

    /// Returns false once the worker should exit.
    fn handle(&mut self, cmd: ClockCommand) -> bool {
        match cmd {
            ClockCommand::Load { generation } => {
                self.generation = generation;
                self.timer.reset(0.0);
                if let Some(len) = self.nominal_length {
                    self.emit(BackendEventKind::DurationKnown(len));
                }
            }
            ClockCommand::Play { generation } if generation == self.generation => {
                // An ended track plays again from the start.
                if self.nominal_length.is_some_and(|len| self.timer.position() >= len) {
                    self.timer.reset(0.0);
                }
                self.timer.start();
                self.emit(BackendEventKind::Started);
            }
            ClockCommand::Pause { generation } if generation == self.generation => {
                self.timer.pause();
                self.emit(BackendEventKind::TimeUpdate(self.timer.position()));
            }
            ClockCommand::Seek {
                generation,
                position,
            } if generation == self.generation => {
                self.timer.seek(self.clamp(position));
                self.emit(BackendEventKind::TimeUpdate(self.timer.position()));
            }
            ClockCommand::Stop => return false,
            stale => tracing::trace!(?stale, current = self.generation, "ignoring stale clock command"),
        }
        true
    }

    fn tick(&mut self) {
        if !self.timer.is_running() {
            return;
        }
        let position = self.timer.position();
        match self.nominal_length {
            Some(len) if position >= len => {
                self.timer.reset(len);
                self.emit(BackendEventKind::TimeUpdate(len));
                self.emit(BackendEventKind::Ended);
            }
            _ => self.emit(BackendEventKind::TimeUpdate(position)),
        }
    }
}

async fn run(
    mut worker: ClockWorker,
    mut rx: mpsc::UnboundedReceiver<ClockCommand>,
    tick: Duration,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(cmd) => {
                    if !worker.handle(cmd) {
                        break;
                    }
                }
                None => break,
            },
            _ = interval.tick() => worker.tick(),
        }
    }
    tracing::debug!("clock output stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn next_kind(rx: &mut mpsc::UnboundedReceiver<BackendEvent>) -> BackendEvent {
        rx.recv().await.expect("clock worker stopped")
    }

    #[tokio::test(start_paused = true)]
    async fn nominal_length_reports_duration_and_end() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut out = ClockOutput::with_tick(tx, Some(1.0), Duration::from_millis(250));
        out.load("/a.mp3", 1).unwrap();
        out.play(1).unwrap();

        assert_eq!(
            next_kind(&mut rx).await,
            BackendEvent::new(1, BackendEventKind::DurationKnown(1.0))
        );
        assert_eq!(next_kind(&mut rx).await, BackendEvent::new(1, BackendEventKind::Started));

        let mut last_time = 0.0;
        loop {
            let ev = next_kind(&mut rx).await;
            assert_eq!(ev.generation, 1);
            match ev.kind {
                BackendEventKind::TimeUpdate(t) => {
                    assert!(t >= last_time && t <= 1.0);
                    last_time = t;
                }
                BackendEventKind::Ended => break,
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(last_time, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn play_after_end_restarts_from_zero() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut out = ClockOutput::with_tick(tx, Some(1.0), Duration::from_millis(250));
        out.load("/a.mp3", 1).unwrap();
        out.play(1).unwrap();
        while next_kind(&mut rx).await.kind != BackendEventKind::Ended {}

        out.play(1).unwrap();
        assert_eq!(next_kind(&mut rx).await, BackendEvent::new(1, BackendEventKind::Started));
        match next_kind(&mut rx).await.kind {
            BackendEventKind::TimeUpdate(t) => assert!(t < 1.0, "resumed at {}", t),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stale_play_is_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut out = ClockOutput::spawn(tx, None);
        out.load("/a.mp3", 1).unwrap();
        out.load("/b.mp3", 2).unwrap();
        out.play(1).unwrap();
        out.play(2).unwrap();

        assert_eq!(next_kind(&mut rx).await, BackendEvent::new(2, BackendEventKind::Started));
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_output_reports_closed() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut out = ClockOutput::spawn(tx, None);
        out.stop();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(out.play(1), Err(OutputError::Closed));
    }
}
