use mandir::content::{ContentRoot, Track};
use mandir::daily::select_index;
use mandir::playback::ClockOutput;
use mandir::{Command, Notification, Notifier, Section, Session};
use std::fs;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn write_content(dir: &std::path::Path) {
    let quotes: Vec<serde_json::Value> = (0..366)
        .map(|i| serde_json::json!({ "quote": format!("quote {}", i), "bhaavarth": "meaning" }))
        .collect();
    fs::write(dir.join("shloka.json"), serde_json::to_string(&quotes).unwrap()).unwrap();
    fs::write(
        dir.join("bhajans.json"),
        r#"{
            "Zeta": [
                {"title": "first", "singer": "a", "file": "/audio/first.mp3"},
                {"title": "second", "singer": "b", "file": "/audio/second.mp3"}
            ],
            "Alpha": [
                {"title": "last", "singer": "c", "file": "/audio/last.mp3"}
            ]
        }"#,
    )
    .unwrap();
}

async fn next_note(notes: &mut mpsc::UnboundedReceiver<Notification>) -> Notification {
    timeout(WAIT, notes.recv())
        .await
        .expect("timed out waiting for a notification")
        .expect("session closed the channel")
}

#[tokio::test]
async fn loads_plays_and_wraps_around() {
    let dir = tempfile::tempdir().unwrap();
    write_content(dir.path());

    let (backend_tx, backend_rx) = mpsc::unbounded_channel();
    let output = ClockOutput::with_tick(backend_tx, Some(0.1), Duration::from_millis(20));
    let (notifier, mut notes) = Notifier::channel();
    let (commands, command_rx) = mpsc::unbounded_channel();
    let root = ContentRoot::Dir(dir.path().to_path_buf());
    let session = Session::new(root, Box::new(output), backend_rx, notifier);
    let task = tokio::spawn(session.run(command_rx));

    let expected_quote = format!("quote {}", select_index(chrono::Local::now().date_naive()));
    let mut playlist = None;
    let mut quote_seen = false;
    while playlist.is_none() || !quote_seen {
        match next_note(&mut notes).await {
            Notification::CatalogChanged(p) => playlist = Some(p),
            Notification::DailyQuoteChanged(q) if q.quote == expected_quote => quote_seen = true,
            _ => {}
        }
    }
    let playlist = playlist.unwrap();
    let titles: Vec<&str> = playlist.tracks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "last"]);

    let last: Track = playlist.get(2).unwrap().clone();
    commands.send(Command::SelectTrack(last)).unwrap();

    let mut ended = false;
    loop {
        match next_note(&mut notes).await {
            Notification::TrackEnded => ended = true,
            Notification::PlaybackStateChanged(state) if ended && state.is_playing() => {
                assert_eq!(state.current_track.unwrap().title, "first");
                break;
            }
            _ => {}
        }
    }

    // The short tracks keep advancing; the state published right before the
    // section change must be a paused one.
    commands.send(Command::SwitchSection(Section::Bhajan)).unwrap();
    let mut last_playing = None;
    loop {
        match next_note(&mut notes).await {
            Notification::SectionChanged(Section::Bhajan) => break,
            Notification::PlaybackStateChanged(state) => last_playing = Some(state.is_playing()),
            _ => {}
        }
    }
    assert_eq!(last_playing, Some(false));

    commands.send(Command::Quit).unwrap();
    timeout(WAIT, task).await.unwrap().unwrap();
}

#[tokio::test]
async fn missing_documents_are_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (backend_tx, backend_rx) = mpsc::unbounded_channel();
    let output = ClockOutput::spawn(backend_tx, None);
    let (notifier, mut notes) = Notifier::channel();
    let (commands, command_rx) = mpsc::unbounded_channel();
    let root = ContentRoot::Dir(dir.path().to_path_buf());
    let task = tokio::spawn(Session::new(root, Box::new(output), backend_rx, notifier).run(command_rx));

    let mut failed = Vec::new();
    while failed.len() < 2 {
        if let Notification::LoadFailed { resource, .. } = next_note(&mut notes).await {
            failed.push(resource);
        }
    }
    assert!(failed.contains(&mandir::content::Resource::Quotes));
    assert!(failed.contains(&mandir::content::Resource::Songs));

    // Nothing loaded: navigation is a no-op and the session keeps running.
    commands.send(Command::Next).unwrap();
    commands.send(Command::TogglePlay).unwrap();
    commands.send(Command::SwitchSection(Section::Gallery)).unwrap();
    loop {
        if let Notification::LoadFailed { resource, .. } = next_note(&mut notes).await {
            assert_eq!(resource, mandir::content::Resource::Gallery);
            break;
        }
    }

    drop(commands);
    timeout(WAIT, task).await.unwrap().unwrap();
}
