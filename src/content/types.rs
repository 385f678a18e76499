use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// A playable bhajan. `title` is the identity used for navigation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Track {
    pub title: String,
    pub singer: String,
    /// Audio source, relative to the content root or an absolute URL.
    pub file: String,
}

/// One entry of the lyrics book, before pagination.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct LyricsEntry {
    pub title: String,
    pub singer: String,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub meaning: Option<String>,
}

/// A scripture line and its explanation (bhaavarth).
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Quote {
    pub quote: String,
    pub bhaavarth: String,
}

impl Quote {
    /// Shown until the quotes document has been loaded.
    pub fn placeholder() -> Self {
        Self {
            quote: "Loading...".to_string(),
            bhaavarth: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct GalleryItem {
    pub title: String,
    pub image: String,
    pub location: String,
    pub category: String,
    pub history: String,
    /// Optional "fun fact" revealed on demand in the detail view.
    #[serde(default)]
    pub mystery: Option<String>,
}

/// Entries grouped under section names, in document order.
///
/// JSON objects are decoded with a map visitor so the key order of the
/// document is kept; that order is the navigation order for playlists and
/// the page order of the lyrics book. A repeated key replaces the earlier
/// section's entries in place, matching how a JS object literal behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sections<T> {
    sections: Vec<(String, Vec<T>)>,
}

impl<T> Default for Sections<T> {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
        }
    }
}

impl<T> Sections<T> {
    pub fn new(sections: Vec<(String, Vec<T>)>) -> Self {
        let mut out = Self::default();
        for (name, entries) in sections {
            out.insert(name, entries);
        }
        out
    }

    fn insert(&mut self, name: String, entries: Vec<T>) {
        match self.sections.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = entries,
            None => self.sections.push((name, entries)),
        }
    }

    /// Sections in order with their entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.sections
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    /// Every entry tagged with its section, section-then-entry order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &T)> {
        self.iter()
            .flat_map(|(name, entries)| entries.iter().map(move |e| (name, e)))
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|(_, e)| e.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}

struct SectionsVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for SectionsVisitor<T> {
    type Value = Sections<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping section names to arrays")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut out = Sections::default();
        while let Some((name, entries)) = map.next_entry::<String, Vec<T>>()? {
            out.insert(name, entries);
        }
        Ok(out)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sections<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SectionsVisitor(PhantomData))
    }
}

pub type SongCatalog = Sections<Track>;
pub type LyricsCatalog = Sections<LyricsEntry>;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed document: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid content location: {0}")]
    Location(String),
}
