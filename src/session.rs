//! The session: the single owner of all application state.
//!
//! Everything that changes state arrives on one of four channels (shell
//! commands, audio output reports, finished content loads, midnight
//! rollovers) and is applied in arrival order by [`Session::run`]. Content
//! fetches and the rollover timer run as spawned tasks that only ever talk
//! back through those channels.

use crate::book::{BookView, LyricsBook};
use crate::content::{
    load_resource, Content, ContentError, ContentRoot, ContentStore, Quote, Resource, Track,
};
use crate::daily::{quote_for, RolloverTick, RolloverTimer};
use crate::event::{BackendEvent, Command, Notification, Notifier, Section};
use crate::gallery::{Gallery, GalleryView};
use crate::playback::{AudioOutput, BackendOutcome, PlaybackEngine, PlaybackError};
use crate::playlist::Playlist;
use crate::state::PlaybackState;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A finished fetch: the resource, its sequence number and the outcome.
type LoadResult = (Resource, u64, Result<Content, ContentError>);

pub struct Session {
    root: ContentRoot,
    store: ContentStore,
    engine: PlaybackEngine,
    playlist: Arc<Playlist>,
    book: BookView,
    gallery: GalleryView,
    section: Section,
    today: NaiveDate,
    quote: Quote,
    notifier: Notifier,
    rollover: RolloverTimer,
    backend_rx: mpsc::UnboundedReceiver<BackendEvent>,
    load_tx: mpsc::UnboundedSender<LoadResult>,
    load_rx: mpsc::UnboundedReceiver<LoadResult>,
    tick_tx: mpsc::UnboundedSender<RolloverTick>,
    tick_rx: mpsc::UnboundedReceiver<RolloverTick>,
}

impl Session {
    /// `backend_rx` must be the receiving end of the channel `output`
    /// reports on.
    pub fn new(
        root: ContentRoot,
        output: Box<dyn AudioOutput>,
        backend_rx: mpsc::UnboundedReceiver<BackendEvent>,
        notifier: Notifier,
    ) -> Self {
        let (load_tx, load_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        Self {
            root,
            store: ContentStore::new(),
            engine: PlaybackEngine::new(output, notifier.clone()),
            playlist: Arc::new(Playlist::default()),
            book: BookView::Closed,
            gallery: GalleryView::Loading,
            section: Section::Home,
            today: Local::now().date_naive(),
            quote: Quote::placeholder(),
            notifier,
            rollover: RolloverTimer::new(),
            backend_rx,
            load_tx,
            load_rx,
            tick_tx,
            tick_rx,
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn playlist(&self) -> Arc<Playlist> {
        Arc::clone(&self.playlist)
    }

    pub fn book(&self) -> &BookView {
        &self.book
    }

    pub fn gallery(&self) -> &GalleryView {
        &self.gallery
    }

    pub fn playback(&self) -> &PlaybackState {
        self.engine.state()
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Kick off the initial loads and arm the midnight timer. Must be
    /// called from within a tokio runtime.
    pub fn start(&mut self) {
        tracing::info!(root = %self.root, today = %self.today, "session starting");
        self.notifier
            .emit(Notification::SectionChanged(self.section));
        self.notifier
            .emit(Notification::DailyQuoteChanged(self.quote.clone()));
        self.fetch(Resource::Quotes);
        self.fetch(Resource::Songs);
        self.rollover.arm(self.tick_tx.clone());
    }

    /// Drive the session until `Quit` or until the shell drops its sender.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.start();
        loop {
            tokio::select! {
                biased;
                cmd = commands.recv() => match cmd {
                    Some(cmd) => {
                        if !self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => break,
                },
                Some(event) = self.backend_rx.recv() => self.handle_backend(event),
                Some((resource, seq, result)) = self.load_rx.recv() => {
                    self.apply_load(resource, seq, result)
                }
                Some(tick) = self.tick_rx.recv() => self.handle_rollover(tick),
            }
        }
        self.shutdown();
    }

    pub fn shutdown(&mut self) {
        tracing::info!("session shutting down");
        self.rollover.disarm();
        self.engine.shutdown();
    }

    fn fetch(&mut self, resource: Resource) {
        let seq = self.store.begin(resource);
        let root = self.root.clone();
        let tx = self.load_tx.clone();
        tokio::spawn(async move {
            let result = load_resource(&root, resource).await;
            let _ = tx.send((resource, seq, result));
        });
    }

    fn publish_book(&self) {
        self.notifier
            .emit(Notification::BookChanged(self.book.clone()));
    }

    fn publish_gallery(&self) {
        self.notifier
            .emit(Notification::GalleryChanged(self.gallery.clone()));
    }

    fn load_and_play(&mut self, track: Track) {
        self.engine.load_track(track);
        if let Err(e) = self.engine.play() {
            tracing::debug!(error = %e, "autoplay did not start");
        }
    }

    fn step(&mut self, forward: bool) {
        let current = self.engine.current_track();
        let target = if forward {
            self.playlist.next(current)
        } else {
            self.playlist.previous(current)
        };
        match target.cloned() {
            Some(track) => self.load_and_play(track),
            None => tracing::debug!(forward, "nothing to navigate to"),
        }
    }

    /// Apply one shell command. Returns false on `Quit`.
    pub fn handle_command(&mut self, cmd: Command) -> bool {
        tracing::debug!(?cmd, "command");
        match cmd {
            Command::SelectTrack(track) => self.load_and_play(track),
            Command::TogglePlay => match self.engine.toggle_play() {
                Err(PlaybackError::NoActiveTrack) => tracing::debug!("toggle with no track"),
                Err(PlaybackError::Rejected(_)) | Ok(()) => {}
            },
            Command::Seek(position) => {
                if let Err(e) = self.engine.seek(position) {
                    tracing::debug!(error = %e, "seek ignored");
                }
            }
            Command::Next => self.step(true),
            Command::Previous => self.step(false),
            Command::OpenBook => {
                self.book = match self.store.lyrics.snapshot() {
                    Some(catalog) => LyricsBook::open(&catalog)
                        .map(BookView::Open)
                        .unwrap_or(BookView::Empty),
                    None => BookView::Loading,
                };
                self.publish_book();
                self.fetch(Resource::Lyrics);
            }
            Command::CloseBook => {
                if !self.book.is_closed() {
                    self.book = BookView::Closed;
                    self.publish_book();
                }
            }
            Command::BookNext => self.turn_page(true),
            Command::BookPrevious => self.turn_page(false),
            Command::SwitchSection(section) => self.switch_section(section),
            Command::GalleryFilter(category) => {
                if let GalleryView::Ready(g) = &mut self.gallery {
                    if g.set_filter(&category) {
                        self.publish_gallery();
                    }
                }
            }
            Command::GallerySelect(index) => {
                if let GalleryView::Ready(g) = &mut self.gallery {
                    if g.select(index) {
                        self.publish_gallery();
                    }
                }
            }
            Command::GalleryClose => {
                if let GalleryView::Ready(g) = &mut self.gallery {
                    if g.selected().is_some() {
                        g.close_detail();
                        self.publish_gallery();
                    }
                }
            }
            Command::Quit => return false,
        }
        true
    }

    fn turn_page(&mut self, forward: bool) {
        let BookView::Open(book) = &mut self.book else {
            return;
        };
        let moved = if forward { book.next() } else { book.previous() };
        if moved {
            self.publish_book();
        }
    }

    fn switch_section(&mut self, section: Section) {
        self.engine.force_pause();
        if section == self.section {
            return;
        }
        tracing::info!(from = %self.section, to = %section, "switching section");
        self.section = section;
        if !self.book.is_closed() {
            self.book = BookView::Closed;
            self.publish_book();
        }
        self.notifier.emit(Notification::SectionChanged(section));
        if section == Section::Gallery {
            self.gallery = match self.store.gallery.snapshot() {
                Some(items) => GalleryView::Ready(Gallery::new(items)),
                None => GalleryView::Loading,
            };
            self.publish_gallery();
            self.fetch(Resource::Gallery);
        }
    }

    /// Apply a report from the audio output. A natural end advances to the
    /// next track, wrapping at the end of the playlist.
    pub fn handle_backend(&mut self, event: BackendEvent) {
        if self.engine.handle_backend(event) == BackendOutcome::Ended {
            self.step(true);
        }
    }

    /// Swap in a finished load, or record its failure. `seq` is the
    /// number the store handed out when the fetch began; completions older
    /// than one already applied are dropped.
    pub fn apply_load(
        &mut self,
        resource: Resource,
        seq: u64,
        result: Result<Content, ContentError>,
    ) {
        let content = match result {
            Ok(content) => content,
            Err(err) => {
                let Some(reason) = self.store.fail(resource, seq, &err) else {
                    tracing::debug!(%resource, seq, "dropping outdated failure");
                    return;
                };
                tracing::warn!(%resource, %reason, "content unavailable");
                self.notifier.emit(Notification::LoadFailed {
                    resource,
                    reason: reason.clone(),
                });
                self.on_load_failed(resource, reason);
                return;
            }
        };
        if !self.store.fulfil(seq, content.clone()) {
            tracing::debug!(%resource, seq, "dropping outdated load");
            return;
        }
        tracing::info!(%resource, seq, "content loaded");
        match content {
            Content::Quotes(_) => self.refresh_quote(),
            Content::Songs(catalog) => {
                self.playlist = Arc::new(Playlist::flatten(catalog));
                tracing::debug!(tracks = self.playlist.len(), "playlist rebuilt");
                self.notifier
                    .emit(Notification::CatalogChanged(Arc::clone(&self.playlist)));
            }
            Content::Lyrics(catalog) => {
                let book = match &self.book {
                    BookView::Closed => return,
                    BookView::Open(book) => book.reload(&catalog),
                    _ => LyricsBook::open(&catalog),
                };
                self.book = book.map(BookView::Open).unwrap_or(BookView::Empty);
                self.publish_book();
            }
            Content::Gallery(items) => {
                match &mut self.gallery {
                    GalleryView::Ready(g) => g.replace_items(items),
                    view => *view = GalleryView::Ready(Gallery::new(items)),
                }
                self.publish_gallery();
            }
        }
    }

    fn on_load_failed(&mut self, resource: Resource, reason: String) {
        match resource {
            Resource::Lyrics if matches!(self.book, BookView::Loading) => {
                self.book = BookView::Unavailable(reason);
                self.publish_book();
            }
            Resource::Gallery if matches!(self.gallery, GalleryView::Loading) => {
                self.gallery = GalleryView::Unavailable(reason);
                self.publish_gallery();
            }
            _ => {}
        }
    }

    fn refresh_quote(&mut self) {
        let Some(quotes) = self.store.quotes.snapshot() else {
            return;
        };
        match quote_for(&quotes, self.today) {
            Some(quote) if *quote != self.quote => {
                self.quote = quote.clone();
                self.notifier
                    .emit(Notification::DailyQuoteChanged(self.quote.clone()));
            }
            Some(_) => {}
            None => tracing::warn!(
                available = quotes.len(),
                date = %self.today,
                "no quote for today"
            ),
        }
    }

    /// A new day: show its quote from the current snapshot and fetch the
    /// document again.
    pub fn handle_rollover(&mut self, tick: RolloverTick) {
        tracing::info!(date = %tick.date, "day rolled over");
        self.today = tick.date;
        self.refresh_quote();
        self.fetch(Resource::Quotes);
    }
}
