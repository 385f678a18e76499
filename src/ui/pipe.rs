//! Line-oriented mode for scripting: commands on stdin, one event per line
//! on stdout.

use mandir::book::BookView;
use mandir::gallery::{category_label, GalleryView};
use mandir::playlist::Playlist;
use mandir::text_utils::{format_time, parse_time, wrap_text};
use mandir::{Command, Notification, Phase, Section};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const WRAP_WIDTH: usize = 78;

pub const HELP: &str = "\
commands:
  list                      show the playlist
  play <n|title>            play track n (1-based) or by title
  toggle | next | prev      playback control
  seek <seconds|m:ss>       jump within the current track
  section <home|bhajan|gallery>
  book open|close|next|prev
  filter <category>         gallery category
  show <n> | close          gallery detail
  quit";

/// What one input line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum PipeInput {
    Command(Command),
    List,
    Help,
    Empty,
}

/// Parse one line of input. `playlist` resolves `play` arguments.
pub fn parse_command(line: &str, playlist: &Playlist) -> Result<PipeInput, String> {
    let line = line.trim();
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((v, a)) => (v, a.trim()),
        None => (line, ""),
    };
    let cmd = match verb.to_lowercase().as_str() {
        "" => return Ok(PipeInput::Empty),
        "help" | "?" => return Ok(PipeInput::Help),
        "list" | "ls" => return Ok(PipeInput::List),
        "quit" | "exit" => Command::Quit,
        "toggle" | "pause" | "resume" => Command::TogglePlay,
        "next" => Command::Next,
        "prev" | "previous" => Command::Previous,
        "play" => {
            let track = match arg.parse::<usize>() {
                Ok(n) if n >= 1 => playlist.get(n - 1),
                Ok(_) => None,
                Err(_) => playlist.position_of(arg).and_then(|i| playlist.get(i)),
            };
            match track {
                Some(t) => Command::SelectTrack(t.clone()),
                None if arg.is_empty() => Command::TogglePlay,
                None => return Err(format!("no such track: {}", arg)),
            }
        }
        "seek" => match parse_time(arg) {
            Some(t) => Command::Seek(t),
            None => return Err(format!("bad position: {:?}", arg)),
        },
        "section" | "go" => Command::SwitchSection(arg.parse::<Section>()?),
        "book" => match arg {
            "" | "open" => Command::OpenBook,
            "close" => Command::CloseBook,
            "next" => Command::BookNext,
            "prev" | "previous" => Command::BookPrevious,
            other => return Err(format!("unknown book action: {}", other)),
        },
        "filter" if !arg.is_empty() => Command::GalleryFilter(arg.to_string()),
        "show" => match arg.parse::<usize>() {
            Ok(n) if n >= 1 => Command::GallerySelect(n - 1),
            _ => return Err(format!("bad item number: {:?}", arg)),
        },
        "close" => Command::GalleryClose,
        other => return Err(format!("unknown command: {} (try help)", other)),
    };
    Ok(PipeInput::Command(cmd))
}

/// Render a notification as output lines. `last_second` suppresses time
/// updates that do not change the displayed second.
pub fn render_notification(note: &Notification, last_second: &mut Option<u64>) -> Vec<String> {
    match note {
        Notification::PlaybackStateChanged(state) => {
            let Some(track) = &state.current_track else {
                return Vec::new();
            };
            let verb = match state.phase {
                Phase::Playing => "playing",
                Phase::Paused => "paused",
                Phase::Loaded => "loaded",
                Phase::Idle => "idle",
            };
            vec![format!("{}: {} ({})", verb, track.title, track.singer)]
        }
        Notification::TimeUpdated {
            current_time,
            duration,
        } => {
            let second = current_time.max(0.0).floor() as u64;
            if *last_second == Some(second) {
                return Vec::new();
            }
            *last_second = Some(second);
            if *duration > 0.0 {
                vec![format!("time: {} / {}", format_time(*current_time), format_time(*duration))]
            } else {
                vec![format!("time: {}", format_time(*current_time))]
            }
        }
        Notification::TrackEnded => vec!["ended".to_string()],
        Notification::PlaybackRejected { reason } => {
            vec![format!("error: playback failed: {}", reason)]
        }
        Notification::LoadFailed { resource, reason } => {
            vec![format!("error: could not load {}: {}", resource, reason)]
        }
        Notification::DailyQuoteChanged(quote) => {
            let mut out = vec!["quote:".to_string()];
            out.extend(wrap_text(&quote.quote, WRAP_WIDTH).into_iter().map(|l| format!("  {}", l)));
            if !quote.bhaavarth.is_empty() {
                out.push("meaning:".to_string());
                out.extend(
                    wrap_text(&quote.bhaavarth, WRAP_WIDTH)
                        .into_iter()
                        .map(|l| format!("  {}", l)),
                );
            }
            out
        }
        Notification::CatalogChanged(playlist) => {
            vec![format!("catalog: {} tracks", playlist.len())]
        }
        Notification::BookChanged(view) => match view {
            BookView::Closed => vec!["book: closed".to_string()],
            BookView::Loading => vec!["book: loading".to_string()],
            BookView::Empty => vec!["book: empty".to_string()],
            BookView::Unavailable(reason) => vec![format!("book: unavailable ({})", reason)],
            BookView::Open(book) => {
                let page = book.current();
                let (n, total) = book.position();
                let mut out = vec![format!(
                    "book: page {}/{} [{}] {} ({})",
                    n, total, page.section, page.title, page.singer
                )];
                out.extend(page.lyrics_text().lines().map(|l| format!("  {}", l)));
                if let Some(meaning) = page.meaning_text() {
                    out.push(format!("  meaning: {}", meaning));
                }
                out
            }
        },
        Notification::GalleryChanged(view) => match view {
            GalleryView::Loading => vec!["gallery: loading".to_string()],
            GalleryView::Unavailable(_) => vec!["gallery: Could not load gallery data.".to_string()],
            GalleryView::Ready(g) => {
                if let Some(item) = g.selected() {
                    let mut out = vec![
                        format!("gallery: {} ({})", item.title, item.location),
                        format!("  image: {}", item.image),
                    ];
                    out.extend(wrap_text(&item.history, WRAP_WIDTH).into_iter().map(|l| format!("  {}", l)));
                    if let Some(fact) = &item.mystery {
                        out.push(format!("  fun fact: {}", fact));
                    }
                    return out;
                }
                let cats: Vec<String> = g.categories().iter().map(|c| category_label(c)).collect();
                let mut out = vec![format!(
                    "gallery: [{}] categories: {}",
                    g.filter().map(category_label).unwrap_or_default(),
                    cats.join(", ")
                )];
                for (i, item) in g.visible().iter().enumerate() {
                    out.push(format!("  {}. {} ({})", i + 1, item.title, item.location));
                }
                out
            }
        },
        Notification::SectionChanged(section) => vec![format!("section: {}", section)],
    }
}

fn playlist_lines(playlist: &Playlist) -> Vec<String> {
    let mut out = Vec::new();
    let mut n = 0;
    for (section, tracks) in playlist.catalog().iter() {
        out.push(format!("{}:", section));
        for t in tracks {
            n += 1;
            out.push(format!("  {}. {} ({})", n, t.title, t.singer));
        }
    }
    out
}

/// Run pipe mode until stdin closes, `quit` is entered or the session
/// goes away.
pub async fn display_pipe(
    commands: mpsc::UnboundedSender<Command>,
    mut notes: mpsc::UnboundedReceiver<Notification>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut playlist = Arc::new(Playlist::default());
    let mut last_second = None;
    let mut stdin_open = true;

    loop {
        tokio::select! {
            note = notes.recv() => {
                let Some(note) = note else { break };
                if let Notification::CatalogChanged(p) = &note {
                    playlist = Arc::clone(p);
                }
                for line in render_notification(&note, &mut last_second) {
                    println!("{}", line);
                }
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    let _ = commands.send(Command::Quit);
                    continue;
                };
                match parse_command(&line, &playlist) {
                    Ok(PipeInput::Command(cmd)) => {
                        let quit = cmd == Command::Quit;
                        if commands.send(cmd).is_err() || quit {
                            stdin_open = false;
                        }
                    }
                    Ok(PipeInput::List) => {
                        for l in playlist_lines(&playlist) {
                            println!("{}", l);
                        }
                    }
                    Ok(PipeInput::Help) => println!("{}", HELP),
                    Ok(PipeInput::Empty) => {}
                    Err(e) => eprintln!("{}", e),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandir::content::{Quote, Sections, Track};

    fn playlist() -> Playlist {
        let t = |title: &str| Track {
            title: title.to_string(),
            singer: "s".to_string(),
            file: format!("/{}.mp3", title),
        };
        Playlist::flatten(Arc::new(Sections::new(vec![(
            "Aarti".to_string(),
            vec![t("Om Jai Jagdish"), t("Hanuman Chalisa")],
        )])))
    }

    #[test]
    fn parses_playback_commands() {
        let p = playlist();
        assert_eq!(
            parse_command("play 2", &p),
            Ok(PipeInput::Command(Command::SelectTrack(p.get(1).unwrap().clone())))
        );
        assert_eq!(
            parse_command("play Om Jai Jagdish", &p),
            Ok(PipeInput::Command(Command::SelectTrack(p.get(0).unwrap().clone())))
        );
        assert!(parse_command("play 9", &p).is_err());
        assert_eq!(parse_command("seek 1:30", &p), Ok(PipeInput::Command(Command::Seek(90.0))));
        assert_eq!(parse_command("  ", &p), Ok(PipeInput::Empty));
        assert_eq!(parse_command("NEXT", &p), Ok(PipeInput::Command(Command::Next)));
    }

    #[test]
    fn parses_navigation_commands() {
        let p = playlist();
        assert_eq!(
            parse_command("section gallery", &p),
            Ok(PipeInput::Command(Command::SwitchSection(Section::Gallery)))
        );
        assert_eq!(parse_command("book", &p), Ok(PipeInput::Command(Command::OpenBook)));
        assert_eq!(parse_command("show 1", &p), Ok(PipeInput::Command(Command::GallerySelect(0))));
        assert_eq!(
            parse_command("filter sacred places", &p),
            Ok(PipeInput::Command(Command::GalleryFilter("sacred places".to_string())))
        );
        assert!(parse_command("section temple", &p).is_err());
        assert!(parse_command("dance", &p).is_err());
    }

    #[test]
    fn time_updates_print_once_per_second() {
        let mut last = None;
        let at = |t: f64| Notification::TimeUpdated {
            current_time: t,
            duration: 0.0,
        };
        assert_eq!(render_notification(&at(1.2), &mut last), vec!["time: 0:01"]);
        assert!(render_notification(&at(1.7), &mut last).is_empty());
        assert_eq!(render_notification(&at(2.0), &mut last), vec!["time: 0:02"]);
    }

    #[test]
    fn quote_prints_with_meaning() {
        let mut last = None;
        let out = render_notification(
            &Notification::DailyQuoteChanged(Quote {
                quote: "Yoga karmasu kaushalam".to_string(),
                bhaavarth: "Skill in action".to_string(),
            }),
            &mut last,
        );
        assert_eq!(out, vec!["quote:", "  Yoga karmasu kaushalam", "meaning:", "  Skill in action"]);
    }
}
