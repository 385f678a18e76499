//! Fetching the static documents from a content root.
//!
//! The root is either a local directory (the `public/` folder of the site)
//! or an HTTP base URL serving the same files. Each [`Resource`] is fetched
//! and decoded independently; the caller gets a complete [`Content`]
//! snapshot or a [`ContentError`], never a partial collection.

use crate::content::types::{ContentError, GalleryItem, LyricsCatalog, Quote, SongCatalog};
use once_cell::sync::Lazy;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

// Shared HTTP client with reasonable defaults for timeouts
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("mandir/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_default()
});

/// The four documents the application consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Quotes,
    Songs,
    Lyrics,
    Gallery,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Quotes,
        Resource::Songs,
        Resource::Lyrics,
        Resource::Gallery,
    ];

    /// Document name relative to the content root.
    pub fn document(self) -> &'static str {
        match self {
            Resource::Quotes => "shloka.json",
            Resource::Songs => "bhajans.json",
            Resource::Lyrics => "bhajan-lyrics.json",
            Resource::Gallery => "gallery.json",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Quotes => "quotes",
            Resource::Songs => "song catalog",
            Resource::Lyrics => "lyrics book",
            Resource::Gallery => "gallery",
        };
        f.write_str(name)
    }
}

/// A loaded document. Collections are behind `Arc` so snapshots can be
/// handed to the shell without copying.
#[derive(Debug, Clone)]
pub enum Content {
    Quotes(Arc<Vec<Quote>>),
    Songs(Arc<SongCatalog>),
    Lyrics(Arc<LyricsCatalog>),
    Gallery(Arc<Vec<GalleryItem>>),
}

impl Content {
    pub fn resource(&self) -> Resource {
        match self {
            Content::Quotes(_) => Resource::Quotes,
            Content::Songs(_) => Resource::Songs,
            Content::Lyrics(_) => Resource::Lyrics,
            Content::Gallery(_) => Resource::Gallery,
        }
    }
}

/// Where a document or an audio file lives once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Url(Url),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File(p) => write!(f, "{}", p.display()),
            Location::Url(u) => write!(f, "{}", u),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRoot {
    Dir(PathBuf),
    Http(Url),
}

impl ContentRoot {
    /// Interpret a CLI/env value: `http(s)://` means a base URL, anything
    /// else a directory.
    pub fn parse(value: &str) -> Result<Self, ContentError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ContentError::Location("empty content root".to_string()));
        }
        if value.starts_with("http://") || value.starts_with("https://") {
            // Url::join only appends to a base ending in '/'
            let with_slash = if value.ends_with('/') {
                value.to_string()
            } else {
                format!("{}/", value)
            };
            let url = Url::parse(&with_slash)
                .map_err(|e| ContentError::Location(format!("{}: {}", value, e)))?;
            Ok(ContentRoot::Http(url))
        } else {
            Ok(ContentRoot::Dir(PathBuf::from(value)))
        }
    }

    /// Resolve a path as the site would: a leading `/` is relative to the
    /// root, absolute URLs are kept as they are.
    pub fn resolve(&self, path: &str) -> Result<Location, ContentError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            let url = Url::parse(path)
                .map_err(|e| ContentError::Location(format!("{}: {}", path, e)))?;
            return Ok(Location::Url(url));
        }
        let relative = path.trim_start_matches('/');
        if relative.is_empty() {
            return Err(ContentError::Location(format!("empty path {:?}", path)));
        }
        match self {
            ContentRoot::Dir(dir) => Ok(Location::File(dir.join(relative))),
            ContentRoot::Http(base) => base
                .join(relative)
                .map(Location::Url)
                .map_err(|e| ContentError::Location(format!("{}: {}", path, e))),
        }
    }
}

impl fmt::Display for ContentRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentRoot::Dir(p) => write!(f, "{}", p.display()),
            ContentRoot::Http(u) => write!(f, "{}", u),
        }
    }
}

async fn fetch_bytes(location: &Location) -> Result<Vec<u8>, ContentError> {
    match location {
        Location::File(path) => tokio::fs::read(path).await.map_err(|source| ContentError::Io {
            path: path.display().to_string(),
            source,
        }),
        Location::Url(url) => {
            let resp = HTTP_CLIENT.get(url.clone()).send().await?;
            if !resp.status().is_success() {
                return Err(ContentError::Status {
                    status: resp.status().as_u16(),
                    url: url.to_string(),
                });
            }
            Ok(resp.bytes().await?.to_vec())
        }
    }
}

async fn load_document<T: DeserializeOwned>(
    root: &ContentRoot,
    resource: Resource,
) -> Result<T, ContentError> {
    let location = root.resolve(resource.document())?;
    tracing::debug!(%resource, %location, "fetching document");
    let bytes = fetch_bytes(&location).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Fetch and decode one resource.
pub async fn load_resource(root: &ContentRoot, resource: Resource) -> Result<Content, ContentError> {
    let content = match resource {
        Resource::Quotes => Content::Quotes(Arc::new(load_document(root, resource).await?)),
        Resource::Songs => Content::Songs(Arc::new(load_document(root, resource).await?)),
        Resource::Lyrics => Content::Lyrics(Arc::new(load_document(root, resource).await?)),
        Resource::Gallery => Content::Gallery(Arc::new(load_document(root, resource).await?)),
    };
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parse_distinguishes_dirs_and_urls() {
        assert_eq!(
            ContentRoot::parse("public").unwrap(),
            ContentRoot::Dir(PathBuf::from("public"))
        );
        match ContentRoot::parse("https://example.org/site").unwrap() {
            ContentRoot::Http(url) => assert_eq!(url.as_str(), "https://example.org/site/"),
            other => panic!("unexpected root {:?}", other),
        }
        assert!(ContentRoot::parse("  ").is_err());
    }

    #[test]
    fn resolve_treats_leading_slash_as_root_relative() {
        let dir = ContentRoot::parse("/srv/mandir").unwrap();
        assert_eq!(
            dir.resolve("/audio/om.mp3").unwrap(),
            Location::File(PathBuf::from("/srv/mandir/audio/om.mp3"))
        );

        let http = ContentRoot::parse("http://localhost:3000").unwrap();
        match http.resolve("/audio/jai shree.mp3").unwrap() {
            Location::Url(url) => {
                assert_eq!(url.as_str(), "http://localhost:3000/audio/jai%20shree.mp3")
            }
            other => panic!("unexpected location {:?}", other),
        }

        match dir.resolve("https://cdn.example.org/a.mp3").unwrap() {
            Location::Url(url) => assert_eq!(url.host_str(), Some("cdn.example.org")),
            other => panic!("unexpected location {:?}", other),
        }
    }

    #[tokio::test]
    async fn loads_documents_from_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("bhajans.json"),
            r#"{"Morning": [{"title": "Om", "singer": "A", "file": "/om.mp3"}]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("shloka.json"),
            r#"[{"quote": "q0", "bhaavarth": "b0"}]"#,
        )
        .unwrap();
        let root = ContentRoot::Dir(dir.path().to_path_buf());

        match load_resource(&root, Resource::Songs).await.unwrap() {
            Content::Songs(catalog) => assert_eq!(catalog.entry_count(), 1),
            other => panic!("unexpected content {:?}", other.resource()),
        }
        match load_resource(&root, Resource::Quotes).await.unwrap() {
            Content::Quotes(quotes) => assert_eq!(quotes[0].quote, "q0"),
            other => panic!("unexpected content {:?}", other.resource()),
        }
    }

    #[tokio::test]
    async fn missing_and_malformed_documents_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gallery.json"), "{ not json").unwrap();
        let root = ContentRoot::Dir(dir.path().to_path_buf());

        let missing = load_resource(&root, Resource::Lyrics).await.unwrap_err();
        assert!(matches!(missing, ContentError::Io { .. }));
        let malformed = load_resource(&root, Resource::Gallery).await.unwrap_err();
        assert!(matches!(malformed, ContentError::Serde(_)));
    }
}
