//! Audio output on the system sound device (rodio).
//!
//! rodio's `OutputStream` cannot leave the thread that opened it, so the
//! device lives on a dedicated thread that owns the stream and the sink and
//! receives commands over a std channel. Between commands the thread wakes
//! every [`DeviceOutput::TICK`] to report the position and to notice the
//! sink running dry, which is the natural end of a track.

use crate::content::{ContentRoot, Location};
use crate::event::{BackendEvent, BackendEventKind};
use crate::playback::output::{AudioOutput, OutputError};
use crate::timer::PlaybackTimer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

enum DeviceCommand {
    Load { generation: u64, source: Result<PathBuf, String> },
    Play { generation: u64 },
    Pause { generation: u64 },
    Seek { generation: u64, position: f64 },
    Stop,
}

pub struct DeviceOutput {
    root: ContentRoot,
    commands: std_mpsc::Sender<DeviceCommand>,
    worker: Option<thread::JoinHandle<()>>,
}

impl DeviceOutput {
    pub const TICK: Duration = Duration::from_millis(250);

    /// Open the default output device. Track files are resolved against
    /// `root`; only local files can be played.
    pub fn open(
        root: ContentRoot,
        events: mpsc::UnboundedSender<BackendEvent>,
    ) -> Result<Self, OutputError> {
        let (commands, rx) = std_mpsc::channel();
        let (ready_tx, ready_rx) = std_mpsc::channel();
        let worker = thread::Builder::new()
            .name("mandir-audio".to_string())
            .spawn(move || {
                let (stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(OutputError::Device(e.to_string())));
                        return;
                    }
                };
                let sink = match Sink::try_new(&handle) {
                    Ok(sink) => sink,
                    Err(e) => {
                        let _ = ready_tx.send(Err(OutputError::Device(e.to_string())));
                        return;
                    }
                };
                sink.pause();
                let _ = ready_tx.send(Ok(()));
                let worker = DeviceWorker {
                    _stream: stream,
                    handle,
                    sink,
                    events,
                    generation: 0,
                    path: None,
                    load_error: None,
                    duration: None,
                    timer: PlaybackTimer::default(),
                };
                worker.run(rx);
            })
            .map_err(|e| OutputError::Device(e.to_string()))?;

        ready_rx.recv().map_err(|_| OutputError::Closed)??;
        tracing::info!(root = %root, "audio device opened");
        Ok(Self {
            root,
            commands,
            worker: Some(worker),
        })
    }

    fn send(&self, cmd: DeviceCommand) -> Result<(), OutputError> {
        self.commands.send(cmd).map_err(|_| OutputError::Closed)
    }
}

impl AudioOutput for DeviceOutput {
    fn load(&mut self, source: &str, generation: u64) -> Result<(), OutputError> {
        // An unplayable source still becomes the current one; the failure
        // surfaces as a rejection when playback is requested.
        let resolved = match self.root.resolve(source) {
            Ok(Location::File(path)) => Ok(path),
            Ok(Location::Url(url)) => {
                Err(OutputError::UnsupportedSource(url.to_string()).to_string())
            }
            Err(e) => Err(e.to_string()),
        };
        self.send(DeviceCommand::Load {
            generation,
            source: resolved,
        })
    }

    fn play(&mut self, generation: u64) -> Result<(), OutputError> {
        self.send(DeviceCommand::Play { generation })
    }

    fn pause(&mut self, generation: u64) -> Result<(), OutputError> {
        self.send(DeviceCommand::Pause { generation })
    }

    fn seek(&mut self, generation: u64, position: f64) -> Result<(), OutputError> {
        self.send(DeviceCommand::Seek {
            generation,
            position,
        })
    }

    fn stop(&mut self) {
        let _ = self.commands.send(DeviceCommand::Stop);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("audio thread panicked");
            }
        }
    }
}

impl Drop for DeviceOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

struct DeviceWorker {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Sink,
    events: mpsc::UnboundedSender<BackendEvent>,
    generation: u64,
    path: Option<PathBuf>,
    load_error: Option<String>,
    duration: Option<f64>,
    timer: PlaybackTimer,
}

type FileSource = rodio::source::SkipDuration<Decoder<BufReader<File>>>;

fn open_source(path: &Path, skip: f64) -> Result<(FileSource, Option<f64>), String> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let decoder =
        Decoder::new(BufReader::new(file)).map_err(|e| format!("{}: {}", path.display(), e))?;
    let total = decoder.total_duration().map(|d| d.as_secs_f64());
    Ok((decoder.skip_duration(Duration::from_secs_f64(skip)), total))
}

impl DeviceWorker {
    fn emit(&self, kind: BackendEventKind) {
        let _ = self.events.send(BackendEvent::new(self.generation, kind));
    }

    fn clamp(&self, position: f64) -> f64 {
        match self.duration {
            Some(d) => position.min(d),
            None => position,
        }
    }

    /// Replace the sink with a fresh, paused one holding `path` from `skip`.
    fn rebuild(&mut self, path: &Path, skip: f64) -> Result<Option<f64>, String> {
        self.sink.stop();
        let sink = Sink::try_new(&self.handle).map_err(|e| e.to_string())?;
        sink.pause();
        let (source, total) = open_source(path, skip)?;
        sink.append(source);
        self.sink = sink;
        Ok(total)
    }

    fn run(mut self, rx: std_mpsc::Receiver<DeviceCommand>) {
        loop {
            match rx.recv_timeout(DeviceOutput::TICK) {
                Ok(DeviceCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => self.tick(),
            }
        }
        self.sink.stop();
        tracing::debug!("audio thread stopped");
    }

    fn handle(&mut self, cmd: DeviceCommand) {
        match cmd {
            DeviceCommand::Load { generation, source } => {
                self.generation = generation;
                self.timer.reset(0.0);
                self.duration = None;
                self.path = None;
                self.load_error = None;
                let loaded = source.and_then(|path| {
                    let total = self.rebuild(&path, 0.0)?;
                    Ok((path, total))
                });
                match loaded {
                    Ok((path, total)) => {
                        tracing::debug!(path = %path.display(), "decoder ready");
                        self.path = Some(path);
                        self.duration = total;
                        if let Some(d) = total {
                            self.emit(BackendEventKind::DurationKnown(d));
                        }
                    }
                    Err(reason) => {
                        self.sink.stop();
                        self.load_error = Some(reason);
                    }
                }
            }
            DeviceCommand::Play { generation } if generation == self.generation => {
                if let Some(reason) = self.load_error.clone() {
                    self.emit(BackendEventKind::Rejected(reason));
                    return;
                }
                // An ended track plays again from the start.
                if self.sink.empty() {
                    if let Some(path) = self.path.clone() {
                        if let Err(reason) = self.rebuild(&path, 0.0) {
                            self.emit(BackendEventKind::Rejected(reason));
                            return;
                        }
                        self.timer.reset(0.0);
                    }
                }
                self.sink.play();
                self.timer.start();
                self.emit(BackendEventKind::Started);
            }
            DeviceCommand::Pause { generation } if generation == self.generation => {
                self.sink.pause();
                self.timer.pause();
                self.emit(BackendEventKind::TimeUpdate(self.timer.position()));
            }
            DeviceCommand::Seek {
                generation,
                position,
            } if generation == self.generation => {
                let Some(path) = self.path.clone() else {
                    return;
                };
                let target = self.clamp(position);
                let running = self.timer.is_running();
                if let Err(reason) = self.rebuild(&path, target) {
                    tracing::warn!(%reason, "seek failed");
                    self.emit(BackendEventKind::Rejected(reason));
                    self.timer.pause();
                    return;
                }
                if running {
                    self.sink.play();
                }
                self.timer.seek(target);
                self.emit(BackendEventKind::TimeUpdate(target));
            }
            _ => tracing::trace!(current = self.generation, "ignoring stale device command"),
        }
    }

    fn tick(&mut self) {
        if !self.timer.is_running() {
            return;
        }
        if self.sink.empty() {
            self.timer.pause();
            let end = self.duration.unwrap_or_else(|| self.timer.position());
            self.timer.reset(end);
            self.emit(BackendEventKind::TimeUpdate(end));
            self.emit(BackendEventKind::Ended);
            return;
        }
        self.emit(BackendEventKind::TimeUpdate(self.clamp(self.timer.position())));
    }
}
