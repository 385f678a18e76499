// playlist.rs: flat track order derived from the song catalog

use crate::content::{SongCatalog, Track};
use std::collections::HashSet;
use std::sync::Arc;

/// The song catalog flattened in section-then-track order.
///
/// Tracks are identified by title. When titles repeat, lookups resolve to
/// the first occurrence.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    catalog: Arc<SongCatalog>,
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn flatten(catalog: Arc<SongCatalog>) -> Self {
        let tracks: Vec<Track> = catalog.entries().map(|(_, t)| t.clone()).collect();
        let playlist = Self { catalog, tracks };
        for title in playlist.duplicate_titles() {
            tracing::warn!(%title, "duplicate track title; navigation uses the first one");
        }
        playlist
    }

    /// The catalog this playlist was derived from, grouped by section.
    pub fn catalog(&self) -> &SongCatalog {
        &self.catalog
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn position_of(&self, title: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.title == title)
    }

    pub fn duplicate_titles(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for t in &self.tracks {
            if !seen.insert(t.title.as_str()) && !dups.contains(&t.title.as_str()) {
                dups.push(t.title.as_str());
            }
        }
        dups
    }

    fn step(&self, current: Option<&Track>, forward: bool) -> Option<&Track> {
        let n = self.tracks.len();
        if n == 0 {
            return None;
        }
        let i = self.position_of(&current?.title)?;
        let j = if forward { (i + 1) % n } else { (i + n - 1) % n };
        self.tracks.get(j)
    }

    /// The track after `current`, wrapping to the first.
    pub fn next(&self, current: Option<&Track>) -> Option<&Track> {
        self.step(current, true)
    }

    /// The track before `current`, wrapping to the last.
    pub fn previous(&self, current: Option<&Track>) -> Option<&Track> {
        self.step(current, false)
    }
}
