//! Messages between the shell, the session and the audio output.
//!
//! The session's transitions are synchronous calls; everything it reports
//! goes out as a [`Notification`] over an unbounded channel so emitting
//! never blocks and nothing is dropped or reordered.

use crate::book::BookView;
use crate::content::{Quote, Resource, Track};
use crate::gallery::GalleryView;
use crate::playlist::Playlist;
use crate::state::PlaybackState;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Top-level application sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub enum Section {
    #[default]
    Home,
    Bhajan,
    Gallery,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Home, Section::Bhajan, Section::Gallery];

    pub fn title(self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::Bhajan => "Bhajan",
            Section::Gallery => "Gallery",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Section::Home => 0,
            Section::Bhajan => 1,
            Section::Gallery => 2,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Section::Home => Section::Bhajan,
            Section::Bhajan => Section::Gallery,
            Section::Gallery => Section::Home,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Section::Home => Section::Gallery,
            Section::Bhajan => Section::Home,
            Section::Gallery => Section::Bhajan,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "home" => Ok(Section::Home),
            "bhajan" | "bhajans" => Ok(Section::Bhajan),
            "gallery" => Ok(Section::Gallery),
            other => Err(format!("unknown section: {}", other)),
        }
    }
}

/// Shell → core intents.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SelectTrack(Track),
    TogglePlay,
    Seek(f64),
    Next,
    Previous,
    OpenBook,
    CloseBook,
    BookNext,
    BookPrevious,
    SwitchSection(Section),
    GalleryFilter(String),
    /// Index into the currently visible (filtered) gallery items.
    GallerySelect(usize),
    GalleryClose,
    Quit,
}

/// Core → shell notifications.
#[derive(Debug, Clone)]
pub enum Notification {
    PlaybackStateChanged(PlaybackState),
    TimeUpdated { current_time: f64, duration: f64 },
    TrackEnded,
    PlaybackRejected { reason: String },
    LoadFailed { resource: Resource, reason: String },
    DailyQuoteChanged(Quote),
    CatalogChanged(Arc<Playlist>),
    BookChanged(BookView),
    GalleryChanged(GalleryView),
    SectionChanged(Section),
}

/// Reports from the audio output, tagged with the load generation they
/// belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendEvent {
    pub generation: u64,
    pub kind: BackendEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendEventKind {
    /// A `play` request was honoured.
    Started,
    /// A `play` request was refused (missing file, device policy, ...).
    Rejected(String),
    TimeUpdate(f64),
    DurationKnown(f64),
    /// The track reached its natural end.
    Ended,
}

impl BackendEvent {
    pub fn new(generation: u64, kind: BackendEventKind) -> Self {
        Self { generation, kind }
    }
}

/// Sending half of the notification channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn new(tx: mpsc::UnboundedSender<Notification>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::trace!("shell is gone; notification dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_cycle_both_ways() {
        for s in Section::ALL {
            assert_eq!(s.next().prev(), s);
            assert_eq!(Section::ALL[s.index()], s);
        }
        assert_eq!("Bhajans".parse::<Section>(), Ok(Section::Bhajan));
        assert!("temple".parse::<Section>().is_err());
    }
}
