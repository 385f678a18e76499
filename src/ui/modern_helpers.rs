use crate::ui::modern::ModernUIState;
use crate::ui::styles::MandirStyles;
use mandir::book::BookView;
use mandir::gallery::{category_label, Gallery, GalleryView};
use mandir::text_utils::format_time;
use mandir::{Phase, Section};
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use std::error::Error;

/// Draw the whole screen from the current UI state.
pub fn draw_ui<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &ModernUIState,
    styles: &MandirStyles,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    terminal
        .draw(|f| render(f, state, styles))
        .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;
    Ok(())
}

fn render(f: &mut Frame, state: &ModernUIState, styles: &MandirStyles) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let titles: Vec<&str> = Section::ALL.iter().map(|s| s.title()).collect();
    let tabs = Tabs::new(titles)
        .select(state.section.index())
        .style(styles.tab)
        .highlight_style(styles.tab_active)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" Mandir ", styles.title)),
        );
    f.render_widget(tabs, chunks[0]);

    match state.section {
        Section::Home => render_home(f, chunks[1], state, styles),
        Section::Bhajan => render_bhajan(f, chunks[1], state, styles),
        Section::Gallery => render_gallery(f, chunks[1], state, styles),
    }

    if let Some(status) = &state.status {
        f.render_widget(
            Paragraph::new(Span::styled(status.as_str(), styles.error)),
            chunks[2],
        );
    }
    f.render_widget(
        Paragraph::new(Span::styled(help_line(state), styles.dim)),
        chunks[3],
    );
}

fn help_line(state: &ModernUIState) -> &'static str {
    match state.section {
        Section::Home => "tab/1-3 sections  b explanation  q quit",
        Section::Bhajan if !state.book.is_closed() => {
            "←/→ turn page  o/esc close book  space play/pause  q quit"
        }
        Section::Bhajan => {
            "↑/↓ choose  enter play  space play/pause  n/p next/prev  ←/→ seek  o book  q quit"
        }
        Section::Gallery => "←/→ category  ↑/↓ choose  enter details  f fun fact  esc close  q quit",
    }
}

fn render_home(f: &mut Frame, area: Rect, state: &ModernUIState, styles: &MandirStyles) {
    let mut lines = vec![
        Line::from(Span::styled(state.quote.quote.as_str(), styles.title)),
        Line::from(""),
    ];
    if state.show_bhaavarth && !state.quote.bhaavarth.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("\"{}\"", state.quote.bhaavarth),
            styles.text,
        )));
    } else if !state.quote.bhaavarth.is_empty() {
        lines.push(Line::from(Span::styled("press b for the meaning", styles.dim)));
    }
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Shloka of the Day "));
    f.render_widget(paragraph, area);
}

fn render_bhajan(f: &mut Frame, area: Rect, state: &ModernUIState, styles: &MandirStyles) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);
    render_now_playing(f, chunks[0], state, styles);
    if state.book.is_closed() {
        render_playlist(f, chunks[1], state, styles);
    } else {
        render_book(f, chunks[1], &state.book, styles);
    }
}

fn render_now_playing(f: &mut Frame, area: Rect, state: &ModernUIState, styles: &MandirStyles) {
    let pb = &state.playback;
    let (title, singer) = match &pb.current_track {
        Some(t) => (t.title.as_str(), t.singer.as_str()),
        None => ("Select a bhajan", ""),
    };
    let marker = match pb.phase {
        Phase::Playing => "▶",
        Phase::Paused | Phase::Loaded => "⏸",
        Phase::Idle => " ",
    };
    let block = Block::default().borders(Borders::ALL).title(" Now Playing ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!("{} ", marker), styles.playing),
            Span::styled(title, styles.title),
            Span::styled(
                if singer.is_empty() { String::new() } else { format!("  {}", singer) },
                styles.dim,
            ),
        ])),
        rows[0],
    );
    let label = if pb.has_duration() {
        format!("{} / {}", format_time(pb.current_time), format_time(pb.duration))
    } else {
        format_time(pb.current_time)
    };
    let gauge = Gauge::default()
        .gauge_style(styles.gauge)
        .ratio(pb.progress())
        .label(label);
    f.render_widget(gauge, rows[1]);
}

fn render_playlist(f: &mut Frame, area: Rect, state: &ModernUIState, styles: &MandirStyles) {
    if state.playlist.is_empty() {
        let msg = Paragraph::new(Span::styled("Loading bhajans...", styles.dim))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Bhajans "));
        f.render_widget(msg, area);
        return;
    }
    let mut index = 0;
    let mut items = Vec::new();
    let mut row_of_cursor = 0;
    for (section, tracks) in state.playlist.catalog().iter() {
        items.push(ListItem::new(Span::styled(section.to_string(), styles.title)));
        for t in tracks {
            if index == state.cursor {
                row_of_cursor = items.len();
            }
            let style = if state.playback.is_current(t) {
                styles.playing
            } else {
                styles.text
            };
            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!("  {}", t.title), style),
                Span::styled(format!("  {}", t.singer), styles.dim),
            ])));
            index += 1;
        }
    }
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Bhajans "))
        .highlight_style(styles.highlight);
    let mut list_state = ListState::default();
    list_state.select(Some(row_of_cursor));
    f.render_stateful_widget(list, area, &mut list_state);
}

/// Text content of the book area.
pub fn book_lines<'a>(view: &'a BookView, styles: &MandirStyles) -> (String, Vec<Line<'a>>) {
    match view {
        BookView::Closed => (String::new(), Vec::new()),
        BookView::Loading => (
            " Bhajan Book ".to_string(),
            vec![Line::from(Span::styled("Loading Bhajan Book...", styles.dim))],
        ),
        BookView::Empty => (
            " Bhajan Book ".to_string(),
            vec![Line::from(Span::styled("The bhajan book is empty.", styles.dim))],
        ),
        BookView::Unavailable(reason) => (
            " Bhajan Book ".to_string(),
            vec![Line::from(Span::styled(
                format!("Could not load the bhajan book: {}", reason),
                styles.error,
            ))],
        ),
        BookView::Open(book) => {
            let page = book.current();
            let (n, total) = book.position();
            let mut lines = vec![
                Line::from(Span::styled(page.section.as_str(), styles.dim)),
                Line::from(Span::styled(page.title.as_str(), styles.title)),
                Line::from(Span::styled(page.singer.as_str(), styles.dim)),
                Line::from(""),
            ];
            lines.extend(page.lyrics_text().lines().map(Line::from));
            if let Some(meaning) = page.meaning_text() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(meaning, styles.dim)));
            }
            (format!(" Bhajan Book  {} / {} ", n, total), lines)
        }
    }
}

fn render_book(f: &mut Frame, area: Rect, view: &BookView, styles: &MandirStyles) {
    let (title, lines) = book_lines(view, styles);
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);
}

fn render_gallery(f: &mut Frame, area: Rect, state: &ModernUIState, styles: &MandirStyles) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Explore Our Gallery ");
    match &state.gallery {
        GalleryView::Loading => f.render_widget(
            Paragraph::new(Span::styled("Loading gallery...", styles.dim))
                .alignment(Alignment::Center)
                .block(block),
            area,
        ),
        GalleryView::Unavailable(_) => f.render_widget(
            Paragraph::new(Span::styled("Could not load gallery data.", styles.error))
                .alignment(Alignment::Center)
                .block(block),
            area,
        ),
        GalleryView::Ready(g) if g.selected().is_some() => {
            render_gallery_detail(f, area, g, state.show_fact, styles)
        }
        GalleryView::Ready(g) => {
            let inner = block.inner(area);
            f.render_widget(block, area);
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(1)])
                .split(inner);

            let labels: Vec<String> = g.categories().iter().map(|c| category_label(c)).collect();
            let active = g
                .filter()
                .and_then(|cur| g.categories().iter().position(|c| c == cur))
                .unwrap_or(0);
            f.render_widget(
                Tabs::new(labels)
                    .select(active)
                    .style(styles.tab)
                    .highlight_style(styles.tab_active),
                rows[0],
            );

            let items: Vec<ListItem> = g
                .visible()
                .into_iter()
                .map(|item| {
                    ListItem::new(Line::from(vec![
                        Span::styled(item.title.as_str(), styles.text),
                        Span::styled(format!("  {}", item.location), styles.dim),
                    ]))
                })
                .collect();
            let mut list_state = ListState::default();
            if !items.is_empty() {
                list_state.select(Some(state.gallery_cursor));
            }
            f.render_stateful_widget(
                List::new(items).highlight_style(styles.highlight),
                rows[1],
                &mut list_state,
            );
        }
    }
}

fn render_gallery_detail(
    f: &mut Frame,
    area: Rect,
    gallery: &Gallery,
    show_fact: bool,
    styles: &MandirStyles,
) {
    let Some(item) = gallery.selected() else {
        return;
    };
    let mut lines = vec![
        Line::from(Span::styled(item.location.as_str(), styles.dim)),
        Line::from(Span::styled(item.image.as_str(), styles.dim)),
        Line::from(""),
        Line::from(item.history.as_str()),
    ];
    if let Some(mystery) = item.mystery.as_deref() {
        lines.push(Line::from(""));
        if show_fact {
            lines.push(Line::from(Span::styled("Fun Fact", styles.title)));
            lines.push(Line::from(mystery));
        } else {
            lines.push(Line::from(Span::styled(
                "press f to show the fun fact",
                styles.dim,
            )));
        }
    }
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(format!(" {} ", item.title), styles.title)),
    );
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandir::content::{LyricsEntry, Quote, Sections};
    use mandir::book::LyricsBook;
    use mandir::Notification;
    use ratatui::backend::TestBackend;

    fn screen(state: &ModernUIState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        draw_ui(&mut terminal, state, &MandirStyles::default()).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn home_shows_quote_and_meaning_on_demand() {
        let mut state = ModernUIState::new();
        state.apply(Notification::DailyQuoteChanged(Quote {
            quote: "Karmanye vadhikaraste".to_string(),
            bhaavarth: "Act without attachment".to_string(),
        }));
        assert!(screen(&state).contains("Karmanye vadhikaraste"));
        assert!(!screen(&state).contains("Act without attachment"));
        state.show_bhaavarth = true;
        assert!(screen(&state).contains("Act without attachment"));
    }

    #[test]
    fn book_shows_page_indicator_and_placeholder() {
        let catalog = Sections::new(vec![(
            "Aarti".to_string(),
            vec![
                LyricsEntry {
                    title: "Om Jai".to_string(),
                    singer: "s".to_string(),
                    lyrics: None,
                    meaning: None,
                },
                LyricsEntry {
                    title: "Second".to_string(),
                    singer: "s".to_string(),
                    lyrics: Some("line".to_string()),
                    meaning: None,
                },
            ],
        )]);
        let mut state = ModernUIState::new();
        state.apply(Notification::SectionChanged(Section::Bhajan));
        state.apply(Notification::BookChanged(BookView::Open(
            LyricsBook::open(&catalog).unwrap(),
        )));
        let text = screen(&state);
        assert!(text.contains("1 / 2"));
        assert!(text.contains("Lyrics not added yet"));

        state.apply(Notification::BookChanged(BookView::Loading));
        assert!(screen(&state).contains("Loading Bhajan Book..."));
    }
}
