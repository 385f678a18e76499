//! Full-screen terminal UI.
//!
//! The loop uses `tokio::select!` over two sources:
//! - notifications from the session, folded into [`ModernUIState`]
//! - keyboard input, translated into [`Command`]s for the session
//!
//! Everything shown is a snapshot taken from notifications; the UI never
//! touches session state directly. Purely visual toggles (the quote's
//! explanation, the gallery's fun fact, list cursors) live here.

use crate::ui::styles::MandirStyles;
use crossterm::{
    event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use mandir::book::BookView;
use mandir::content::{Quote, Resource};
use mandir::gallery::GalleryView;
use mandir::playlist::Playlist;
use mandir::{Command, Notification, PlaybackState, Section};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;

/// Seconds moved by the seek keys.
pub const SEEK_STEP: f64 = 10.0;

/// UI state for the modern TUI mode
pub struct ModernUIState {
    pub section: Section,
    pub quote: Quote,
    pub show_bhaavarth: bool,
    pub playback: PlaybackState,
    pub playlist: Arc<Playlist>,
    /// Highlighted row of the playlist.
    pub cursor: usize,
    pub book: BookView,
    pub gallery: GalleryView,
    /// Highlighted card among the visible gallery items.
    pub gallery_cursor: usize,
    pub show_fact: bool,
    /// Last error worth showing (failed load, rejected playback).
    pub status: Option<String>,
    pub should_exit: bool,
}

impl ModernUIState {
    pub fn new() -> Self {
        Self {
            section: Section::Home,
            quote: Quote::placeholder(),
            show_bhaavarth: false,
            playback: PlaybackState::default(),
            playlist: Arc::new(Playlist::default()),
            cursor: 0,
            book: BookView::Closed,
            gallery: GalleryView::Loading,
            gallery_cursor: 0,
            show_fact: false,
            status: None,
            should_exit: false,
        }
    }

    fn gallery_len(&self) -> usize {
        match &self.gallery {
            GalleryView::Ready(g) => g.visible().len(),
            _ => 0,
        }
    }

    fn detail_open(&self) -> bool {
        matches!(&self.gallery, GalleryView::Ready(g) if g.selected().is_some())
    }

    /// Fold one notification into the state.
    pub fn apply(&mut self, notification: Notification) {
        match notification {
            Notification::PlaybackStateChanged(state) => {
                if let Some(i) = state
                    .current_track
                    .as_ref()
                    .and_then(|t| self.playlist.position_of(&t.title))
                {
                    self.cursor = i;
                }
                if state.is_playing() {
                    self.status = None;
                }
                self.playback = state;
            }
            Notification::TimeUpdated {
                current_time,
                duration,
            } => {
                self.playback.current_time = current_time;
                self.playback.duration = duration;
            }
            Notification::TrackEnded => {}
            Notification::PlaybackRejected { reason } => {
                self.status = Some(format!("Playback failed: {} (press space to retry)", reason));
            }
            Notification::LoadFailed { resource, reason } => {
                self.status = Some(match resource {
                    Resource::Gallery => "Could not load gallery data.".to_string(),
                    other => format!("Could not load {}: {}", other, reason),
                });
            }
            Notification::DailyQuoteChanged(quote) => {
                self.quote = quote;
                self.show_bhaavarth = false;
            }
            Notification::CatalogChanged(playlist) => {
                self.cursor = self.cursor.min(playlist.len().saturating_sub(1));
                self.playlist = playlist;
            }
            Notification::BookChanged(book) => self.book = book,
            Notification::GalleryChanged(gallery) => {
                let was_open = self.detail_open();
                self.gallery = gallery;
                if !self.detail_open() || !was_open {
                    self.show_fact = false;
                }
                self.gallery_cursor = self
                    .gallery_cursor
                    .min(self.gallery_len().saturating_sub(1));
            }
            Notification::SectionChanged(section) => {
                self.section = section;
                self.gallery_cursor = 0;
                self.show_fact = false;
            }
        }
    }
}

impl Default for ModernUIState {
    fn default() -> Self {
        Self::new()
    }
}

fn cycle_filter(state: &ModernUIState, forward: bool) -> Option<Command> {
    let GalleryView::Ready(g) = &state.gallery else {
        return None;
    };
    let cats = g.categories();
    if cats.is_empty() {
        return None;
    }
    let current = g
        .filter()
        .and_then(|f| cats.iter().position(|c| c == f))
        .unwrap_or(0);
    let n = cats.len();
    let next = if forward { (current + 1) % n } else { (current + n - 1) % n };
    Some(Command::GalleryFilter(cats[next].clone()))
}

fn move_cursor(cursor: &mut usize, len: usize, down: bool) {
    if len == 0 {
        *cursor = 0;
    } else if down {
        *cursor = (*cursor + 1).min(len - 1);
    } else {
        *cursor = cursor.saturating_sub(1);
    }
}

/// Translate a key press into a session command, updating local UI state
/// along the way.
pub fn process_key(key: KeyEvent, state: &mut ModernUIState) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.should_exit = true;
            return Some(Command::Quit);
        }
        KeyCode::Char('q') => {
            state.should_exit = true;
            return Some(Command::Quit);
        }
        KeyCode::Tab => return Some(Command::SwitchSection(state.section.next())),
        KeyCode::BackTab => return Some(Command::SwitchSection(state.section.prev())),
        KeyCode::Char(c @ '1'..='3') => {
            let index = c as usize - '1' as usize;
            return Some(Command::SwitchSection(Section::ALL[index]));
        }
        _ => {}
    }

    match state.section {
        Section::Home => match key.code {
            KeyCode::Char('b') | KeyCode::Enter => {
                state.show_bhaavarth = !state.show_bhaavarth;
                None
            }
            KeyCode::Esc => {
                state.should_exit = true;
                Some(Command::Quit)
            }
            _ => None,
        },
        Section::Bhajan => {
            let book_open = !state.book.is_closed();
            match key.code {
                KeyCode::Char(' ') => Some(Command::TogglePlay),
                KeyCode::Char('n') => Some(Command::Next),
                KeyCode::Char('p') => Some(Command::Previous),
                KeyCode::Left if !book_open => {
                    Some(Command::Seek(state.playback.current_time - SEEK_STEP))
                }
                KeyCode::Right if !book_open => {
                    Some(Command::Seek(state.playback.current_time + SEEK_STEP))
                }
                KeyCode::Left | KeyCode::Char('[') | KeyCode::PageUp if book_open => {
                    Some(Command::BookPrevious)
                }
                KeyCode::Right | KeyCode::Char(']') | KeyCode::PageDown if book_open => {
                    Some(Command::BookNext)
                }
                KeyCode::Char('o') if book_open => Some(Command::CloseBook),
                KeyCode::Char('o') => Some(Command::OpenBook),
                KeyCode::Esc if book_open => Some(Command::CloseBook),
                KeyCode::Up | KeyCode::Char('k') => {
                    move_cursor(&mut state.cursor, state.playlist.len(), false);
                    None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    move_cursor(&mut state.cursor, state.playlist.len(), true);
                    None
                }
                KeyCode::Enter => state
                    .playlist
                    .get(state.cursor)
                    .cloned()
                    .map(Command::SelectTrack),
                _ => None,
            }
        }
        Section::Gallery => {
            if state.detail_open() {
                return match key.code {
                    KeyCode::Esc | KeyCode::Backspace | KeyCode::Enter => {
                        state.show_fact = false;
                        Some(Command::GalleryClose)
                    }
                    KeyCode::Char('f') => {
                        state.show_fact = !state.show_fact;
                        None
                    }
                    _ => None,
                };
            }
            match key.code {
                KeyCode::Left | KeyCode::Char('h') => {
                    state.gallery_cursor = 0;
                    cycle_filter(state, false)
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    state.gallery_cursor = 0;
                    cycle_filter(state, true)
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    let len = state.gallery_len();
                    move_cursor(&mut state.gallery_cursor, len, false);
                    None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let len = state.gallery_len();
                    move_cursor(&mut state.gallery_cursor, len, true);
                    None
                }
                KeyCode::Enter if state.gallery_len() > 0 => {
                    state.show_fact = false;
                    Some(Command::GallerySelect(state.gallery_cursor))
                }
                _ => None,
            }
        }
    }
}

/// Run the TUI until the user quits or the session goes away.
pub async fn display_modern(
    commands: mpsc::UnboundedSender<Command>,
    mut notes: mpsc::UnboundedReceiver<Notification>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    enable_raw_mode().map_err(to_boxed_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(to_boxed_err)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(to_boxed_err)?;
    let styles = MandirStyles::default();
    let mut state = ModernUIState::new();

    // One OS thread polls crossterm and forwards events; it exits once the
    // receiver is gone.
    let (event_tx, mut event_rx) = mpsc::channel(32);
    thread::spawn(move || {
        loop {
            match crossterm::event::poll(std::time::Duration::from_millis(100)) {
                Ok(true) => {
                    if let Ok(ev) = crossterm::event::read()
                        && event_tx.blocking_send(ev).is_err()
                    {
                        break;
                    }
                }
                Ok(false) => {
                    if event_tx.is_closed() {
                        break;
                    }
                }
                Err(_) => std::thread::sleep(std::time::Duration::from_millis(100)),
            }
        }
    });

    let result = async {
        crate::ui::modern_helpers::draw_ui(&mut terminal, &state, &styles)?;
        while !state.should_exit {
            tokio::select! {
                biased;

                maybe_event = event_rx.recv() => match maybe_event {
                    Some(Event::Key(key)) => {
                        if let Some(cmd) = process_key(key, &mut state)
                            && commands.send(cmd).is_err()
                        {
                            state.should_exit = true;
                        }
                    }
                    Some(_) => {}
                    None => state.should_exit = true,
                },

                note = notes.recv() => match note {
                    Some(note) => state.apply(note),
                    None => state.should_exit = true,
                },
            }
            crate::ui::modern_helpers::draw_ui(&mut terminal, &state, &styles)?;
        }
        Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
    }
    .await;

    disable_raw_mode().map_err(to_boxed_err)?;
    execute!(io::stdout(), LeaveAlternateScreen).map_err(to_boxed_err)?;
    result
}

fn to_boxed_err<E: std::error::Error + Send + Sync + 'static>(
    e: E,
) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandir::content::{GalleryItem, Sections, Track};
    use mandir::gallery::Gallery;
    use mandir::Phase;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn track(title: &str) -> Track {
        Track {
            title: title.to_string(),
            singer: "s".to_string(),
            file: format!("/{}.mp3", title),
        }
    }

    fn with_playlist() -> ModernUIState {
        let mut state = ModernUIState::new();
        let catalog = Sections::new(vec![("A".to_string(), vec![track("t1"), track("t2")])]);
        state.apply(Notification::CatalogChanged(Arc::new(Playlist::flatten(Arc::new(
            catalog,
        )))));
        state.apply(Notification::SectionChanged(Section::Bhajan));
        state
    }

    #[test]
    fn quit_and_section_keys() {
        let mut state = ModernUIState::new();
        assert_eq!(
            process_key(key(KeyCode::Tab), &mut state),
            Some(Command::SwitchSection(Section::Bhajan))
        );
        assert_eq!(
            process_key(key(KeyCode::Char('3')), &mut state),
            Some(Command::SwitchSection(Section::Gallery))
        );
        assert_eq!(process_key(key(KeyCode::Char('q')), &mut state), Some(Command::Quit));
        assert!(state.should_exit);
    }

    #[test]
    fn home_toggles_explanation_locally() {
        let mut state = ModernUIState::new();
        assert_eq!(process_key(key(KeyCode::Char('b')), &mut state), None);
        assert!(state.show_bhaavarth);
    }

    #[test]
    fn playlist_cursor_selects_tracks() {
        let mut state = with_playlist();
        process_key(key(KeyCode::Down), &mut state);
        process_key(key(KeyCode::Down), &mut state);
        assert_eq!(state.cursor, 1);
        assert_eq!(
            process_key(key(KeyCode::Enter), &mut state),
            Some(Command::SelectTrack(track("t2")))
        );
    }

    #[test]
    fn arrows_seek_or_turn_pages() {
        let mut state = with_playlist();
        state.apply(Notification::PlaybackStateChanged(PlaybackState {
            current_track: Some(track("t1")),
            phase: Phase::Playing,
            current_time: 30.0,
            duration: 100.0,
        }));
        assert_eq!(
            process_key(key(KeyCode::Right), &mut state),
            Some(Command::Seek(40.0))
        );
        state.apply(Notification::BookChanged(BookView::Loading));
        assert_eq!(
            process_key(key(KeyCode::Right), &mut state),
            Some(Command::BookNext)
        );
        assert_eq!(
            process_key(key(KeyCode::Char('o')), &mut state),
            Some(Command::CloseBook)
        );
    }

    #[test]
    fn gallery_filter_cycles_categories() {
        let mut state = ModernUIState::new();
        state.apply(Notification::SectionChanged(Section::Gallery));
        let item = |c: &str| GalleryItem {
            title: c.to_string(),
            image: String::new(),
            location: String::new(),
            category: c.to_string(),
            history: String::new(),
            mystery: None,
        };
        let gallery = Gallery::new(Arc::new(vec![item("temples"), item("gods")]));
        state.apply(Notification::GalleryChanged(GalleryView::Ready(gallery)));

        assert_eq!(
            process_key(key(KeyCode::Right), &mut state),
            Some(Command::GalleryFilter("gods".to_string()))
        );
        assert_eq!(
            process_key(key(KeyCode::Left), &mut state),
            Some(Command::GalleryFilter("gods".to_string()))
        );
        assert_eq!(
            process_key(key(KeyCode::Enter), &mut state),
            Some(Command::GallerySelect(0))
        );
    }

    #[test]
    fn rejection_sets_status_until_playing() {
        let mut state = with_playlist();
        state.apply(Notification::PlaybackRejected {
            reason: "no device".to_string(),
        });
        assert!(state.status.as_deref().unwrap().contains("no device"));
        state.apply(Notification::PlaybackStateChanged(PlaybackState {
            current_track: Some(track("t2")),
            phase: Phase::Playing,
            current_time: 0.0,
            duration: 0.0,
        }));
        assert!(state.status.is_none());
        assert_eq!(state.cursor, 1);
    }
}
