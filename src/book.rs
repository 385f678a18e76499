//! The lyrics book: the lyrics catalog as a sequence of pages.

use crate::content::LyricsCatalog;
use std::sync::Arc;

/// Shown on pages whose entry has no lyrics.
pub const MISSING_LYRICS: &str = "Lyrics not added yet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Catalog section the entry came from.
    pub section: String,
    pub title: String,
    pub singer: String,
    pub lyrics: Option<String>,
    pub meaning: Option<String>,
}

impl Page {
    /// Lyrics to display; blank lyrics count as missing.
    pub fn lyrics_text(&self) -> &str {
        match self.lyrics.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => MISSING_LYRICS,
        }
    }

    pub fn meaning_text(&self) -> Option<&str> {
        self.meaning.as_deref().filter(|m| !m.trim().is_empty())
    }
}

/// A paginated view over one lyrics snapshot. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsBook {
    pages: Arc<Vec<Page>>,
    index: usize,
}

fn paginate(catalog: &LyricsCatalog) -> Vec<Page> {
    catalog
        .entries()
        .map(|(section, e)| Page {
            section: section.to_string(),
            title: e.title.clone(),
            singer: e.singer.clone(),
            lyrics: e.lyrics.clone(),
            meaning: e.meaning.clone(),
        })
        .collect()
}

impl LyricsBook {
    /// Open at the first page. `None` when the catalog has no entries.
    pub fn open(catalog: &LyricsCatalog) -> Option<Self> {
        let pages = paginate(catalog);
        if pages.is_empty() {
            return None;
        }
        Some(Self {
            pages: Arc::new(pages),
            index: 0,
        })
    }

    /// Rebuild from a fresher snapshot, keeping the page index where it
    /// still exists.
    pub fn reload(&self, catalog: &LyricsCatalog) -> Option<Self> {
        let mut book = Self::open(catalog)?;
        book.index = self.index.min(book.pages.len() - 1);
        Some(book)
    }

    pub fn current(&self) -> &Page {
        &self.pages[self.index]
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// One-based page number and total, for the "n / total" indicator.
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.pages.len())
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.pages.len()
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Returns false at the last page.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Returns false at the first page.
    pub fn previous(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.index -= 1;
        true
    }
}

/// What the book area shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BookView {
    #[default]
    Closed,
    /// Open requested, lyrics not fetched yet.
    Loading,
    /// Fetched, no entries.
    Empty,
    /// Fetch failed and there is nothing to show.
    Unavailable(String),
    Open(LyricsBook),
}

impl BookView {
    pub fn is_closed(&self) -> bool {
        matches!(self, BookView::Closed)
    }
}
