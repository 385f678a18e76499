// content/mod.rs - static JSON documents: shapes, loading and snapshots
pub mod loader;
pub mod store;
pub mod types;

pub use loader::{load_resource, Content, ContentRoot, Location, Resource};
pub use store::{ContentStore, LoadState};
pub use types::{
    ContentError, GalleryItem, LyricsCatalog, LyricsEntry, Quote, Sections, SongCatalog, Track,
};
