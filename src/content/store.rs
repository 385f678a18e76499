// store.rs: last-known snapshots of every document plus their load state

use crate::content::loader::{Content, Resource};
use crate::content::types::{ContentError, GalleryItem, LyricsCatalog, Quote, SongCatalog};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Ready,
    /// The latest attempt failed; any earlier snapshot is still served.
    Unavailable(String),
}

/// One document's snapshot. A failed load never clears `snapshot`.
///
/// Every fetch gets a sequence number from [`Slot::begin`]. Completions may
/// arrive in any order; one that is not newer than the last applied
/// completion is dropped.
#[derive(Debug)]
pub struct Slot<T> {
    snapshot: Option<Arc<T>>,
    state: LoadState,
    issued: u64,
    applied: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            snapshot: None,
            state: LoadState::NotLoaded,
            issued: 0,
            applied: 0,
        }
    }
}

impl<T> Slot<T> {
    pub fn snapshot(&self) -> Option<Arc<T>> {
        self.snapshot.clone()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Sequence number of the most recent fetch.
    pub fn latest(&self) -> u64 {
        self.issued
    }

    fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.state = LoadState::Loading;
        self.issued
    }

    fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }

    // A newer fetch still in flight keeps the slot `Loading`.
    fn settle(&mut self, seq: u64, done: LoadState) {
        self.state = if seq < self.issued {
            LoadState::Loading
        } else {
            done
        };
    }

    fn fulfil(&mut self, seq: u64, value: Arc<T>) -> bool {
        if !self.accept(seq) {
            return false;
        }
        self.snapshot = Some(value);
        self.settle(seq, LoadState::Ready);
        true
    }

    fn fail(&mut self, seq: u64, reason: String) -> bool {
        if !self.accept(seq) {
            return false;
        }
        self.settle(seq, LoadState::Unavailable(reason));
        true
    }
}

#[derive(Debug, Default)]
pub struct ContentStore {
    pub quotes: Slot<Vec<Quote>>,
    pub songs: Slot<SongCatalog>,
    pub lyrics: Slot<LyricsCatalog>,
    pub gallery: Slot<Vec<GalleryItem>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, resource: Resource) -> &LoadState {
        match resource {
            Resource::Quotes => self.quotes.state(),
            Resource::Songs => self.songs.state(),
            Resource::Lyrics => self.lyrics.state(),
            Resource::Gallery => self.gallery.state(),
        }
    }

    /// Mark a fetch as started and return its sequence number.
    pub fn begin(&mut self, resource: Resource) -> u64 {
        match resource {
            Resource::Quotes => self.quotes.begin(),
            Resource::Songs => self.songs.begin(),
            Resource::Lyrics => self.lyrics.begin(),
            Resource::Gallery => self.gallery.begin(),
        }
    }

    /// Swap in a complete snapshot. Returns false when the completion is
    /// older than one already applied.
    pub fn fulfil(&mut self, seq: u64, content: Content) -> bool {
        match content {
            Content::Quotes(v) => self.quotes.fulfil(seq, v),
            Content::Songs(v) => self.songs.fulfil(seq, v),
            Content::Lyrics(v) => self.lyrics.fulfil(seq, v),
            Content::Gallery(v) => self.gallery.fulfil(seq, v),
        }
    }

    /// Record a failed load; returns the reason reported to the shell, or
    /// `None` for an outdated completion.
    pub fn fail(&mut self, resource: Resource, seq: u64, err: &ContentError) -> Option<String> {
        let reason = err.to_string();
        let applied = match resource {
            Resource::Quotes => self.quotes.fail(seq, reason.clone()),
            Resource::Songs => self.songs.fail(seq, reason.clone()),
            Resource::Lyrics => self.lyrics.fail(seq, reason.clone()),
            Resource::Gallery => self.gallery.fail(seq, reason.clone()),
        };
        applied.then_some(reason)
    }
}
