mod app;
mod render;

use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use goalsnap_feed::backend::HttpBackend;
use goalsnap_feed::config::{Config, CHANNEL_CAPACITY};
use goalsnap_feed::error::{Result as FeedResult, VerificationFailure};
use goalsnap_feed::filter::FilterSelection;
use goalsnap_feed::payment::{run_verification, VerificationTicket};
use goalsnap_feed::session::Session;
use goalsnap_feed::{FeedAggregator, FeedRow};

use app::{Action, App};

type VerificationResult = (u64, Result<(), VerificationFailure>);
type LoadResult = FeedResult<Vec<FeedRow>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    // stdout belongs to the terminal UI.
    let log_file = File::create(&cfg.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    let session = match Session::load(&cfg.session_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Session error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = session.require_token() {
        eprintln!("Not signed in: {e}");
        std::process::exit(1);
    }
    let backend = match HttpBackend::new(&cfg, &session) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("HTTP client error: {e}");
            std::process::exit(1);
        }
    };
    info!(base_url = %cfg.api_base_url, user = %session.display_name(), "tui starting");

    let aggregator = Arc::new(FeedAggregator::new(backend.clone()));
    let selection = FilterSelection::new(cfg.feed_tab, cfg.feed_league.clone());
    let mut app = App::new(&session, selection, Duration::from_millis(cfg.verify_display_ms));
    let (verify_tx, verify_rx) = mpsc::channel::<VerificationResult>(CHANNEL_CAPACITY);
    let (load_tx, load_rx) = mpsc::channel::<LoadResult>(CHANNEL_CAPACITY);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let channels = Channels { load_tx, load_rx, verify_tx, verify_rx };
    let result = run_loop(&mut terminal, &mut app, &aggregator, &backend, channels).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    let p = aggregator.latency().percentiles();
    info!(
        samples = aggregator.latency().len(),
        p50_us = ?p.p50_us,
        p95_us = ?p.p95_us,
        p99_us = ?p.p99_us,
        "analysis latency"
    );
    result
}

struct Channels {
    load_tx: mpsc::Sender<LoadResult>,
    load_rx: mpsc::Receiver<LoadResult>,
    verify_tx: mpsc::Sender<VerificationResult>,
    verify_rx: mpsc::Receiver<VerificationResult>,
}

fn spawn_load(aggregator: &Arc<FeedAggregator<HttpBackend>>, tx: &mpsc::Sender<LoadResult>) {
    let aggregator = Arc::clone(aggregator);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = aggregator.load().await;
        if tx.send(result).await.is_err() {
            warn!("feed load dropped, ui gone");
        }
    });
}

fn spawn_verification(
    backend: &HttpBackend,
    tx: &mpsc::Sender<VerificationResult>,
    ticket: VerificationTicket,
    user_id: String,
) {
    let backend = backend.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let outcome = run_verification(&backend, &ticket, &user_id).await;
        if tx.send((ticket.attempt, outcome)).await.is_err() {
            warn!(attempt = ticket.attempt, "verification result dropped, ui gone");
        }
    });
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    aggregator: &Arc<FeedAggregator<HttpBackend>>,
    backend: &HttpBackend,
    mut ch: Channels,
) -> io::Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    // App starts in Loading.
    spawn_load(aggregator, &ch.load_tx);

    loop {
        terminal.draw(|f| render::render(f, app))?;

        tokio::select! {
            Some(result) = ch.load_rx.recv() => app.on_loaded(result),
            Some((attempt, outcome)) = ch.verify_rx.recv() => app.on_verification(attempt, outcome),
            _ = ticker.tick() => app.tick(Instant::now()),
            event = events.next() => {
                let key = match event {
                    Some(Ok(Event::Key(key))) => key,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e),
                    None => return Ok(()),
                };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.handle_key(key.code) {
                    Action::None => {}
                    Action::Quit => return Ok(()),
                    Action::Reload => spawn_load(aggregator, &ch.load_tx),
                    Action::Verify(ticket) => {
                        spawn_verification(backend, &ch.verify_tx, ticket, app.user_id.clone());
                    }
                }
            }
        }
    }
}
