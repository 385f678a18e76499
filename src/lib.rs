//! mandir: the core of a virtual temple experience.
//!
//! The crate owns the stateful parts of the application: content loading,
//! the daily quote rotation, the bhajan playback engine and its playlist,
//! the lyrics book paginator and the gallery filter. Shells (see `ui` in the
//! binary) render snapshots and forward user intents as [`event::Command`]s.

pub mod book;
pub mod config;
pub mod content;
pub mod daily;
pub mod event;
pub mod gallery;
pub mod logging;
pub mod playback;
pub mod playlist;
pub mod session;
pub mod state;
pub mod text_utils;
pub mod timer;

pub use config::Config;
pub use event::{BackendEvent, BackendEventKind, Command, Notification, Notifier, Section};
pub use session::Session;
pub use state::{Phase, PlaybackState};
