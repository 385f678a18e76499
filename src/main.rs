mod ui;

use clap::Parser;
use mandir::logging::init_logging;
use mandir::playback::{AudioOutput, ClockOutput};
use mandir::{Config, Notifier, Session};
use std::error::Error;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut cfg = Config::parse();
    cfg.content_from_env_if_empty();
    init_logging(&cfg);

    let root = cfg.content_root()?;
    let (backend_tx, backend_rx) = mpsc::unbounded_channel();
    let output = open_output(&cfg, &root, backend_tx)?;

    let (notifier, notes) = Notifier::channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let session = Session::new(root, output, backend_rx, notifier);
    let session_task = tokio::spawn(session.run(command_rx));

    let result = if cfg.pipe {
        crate::ui::pipe::display_pipe(command_tx.clone(), notes).await
    } else {
        crate::ui::modern::display_modern(command_tx.clone(), notes).await
    };

    let _ = command_tx.send(mandir::Command::Quit);
    drop(command_tx);
    if let Err(e) = session_task.await {
        tracing::error!(error = %e, "session task failed");
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        return Err(e);
    }
    Ok(())
}

#[cfg(feature = "audio")]
fn open_output(
    cfg: &Config,
    root: &mandir::content::ContentRoot,
    events: mpsc::UnboundedSender<mandir::BackendEvent>,
) -> Result<Box<dyn AudioOutput>, Box<dyn Error + Send + Sync>> {
    if cfg.device {
        let device = mandir::playback::DeviceOutput::open(root.clone(), events)?;
        return Ok(Box::new(device));
    }
    Ok(Box::new(ClockOutput::spawn(events, cfg.nominal_length())))
}

#[cfg(not(feature = "audio"))]
fn open_output(
    cfg: &Config,
    _root: &mandir::content::ContentRoot,
    events: mpsc::UnboundedSender<mandir::BackendEvent>,
) -> Result<Box<dyn AudioOutput>, Box<dyn Error + Send + Sync>> {
    Ok(Box::new(ClockOutput::spawn(events, cfg.nominal_length())))
}
