use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use goalsnap_feed::backend::HttpBackend;
use goalsnap_feed::config::Config;
use goalsnap_feed::display::{format_kickoff, format_percent, prediction_cell, truncate};
use goalsnap_feed::error::{AppError, Result};
use goalsnap_feed::filter::{self, FilterSelection};
use goalsnap_feed::gate::{gate, Entitlement};
use goalsnap_feed::session::Session;
use goalsnap_feed::state::{FeedStore, LoadStatus};
use goalsnap_feed::FeedAggregator;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let outcome = match args.next().as_deref() {
        None | Some("feed") => run_feed(cfg).await,
        Some("history") => match args.next() {
            Some(date) => run_history(cfg, &date).await,
            None => Err(AppError::Config("usage: feed history <YYYY-MM-DD>".to_string())),
        },
        Some(other) => Err(AppError::Config(format!(
            "unknown command {other:?}; expected `feed` or `history <date>`"
        ))),
    };

    if let Err(e) = outcome {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

fn backend_for(cfg: &Config) -> Result<(HttpBackend, Session)> {
    let session = Session::load(&cfg.session_path)?;
    session.require_token()?;
    info!(user = %session.display_name(), lang = %session.language(), "session loaded");
    Ok((HttpBackend::new(cfg, &session)?, session))
}

/// Print one snapshot of the feed under the configured selection. A
/// one-shot process never verifies a payment, so only the free preview
/// rows carry prediction content.
async fn run_feed(cfg: Config) -> Result<()> {
    let (backend, _session) = backend_for(&cfg)?;
    let aggregator = FeedAggregator::new(backend);

    let mut store = FeedStore::new();
    store.apply_load(aggregator.load().await);
    if let LoadStatus::Failed(reason) = store.status() {
        return Err(AppError::FixtureList(reason.clone()));
    }

    let selection = FilterSelection::new(cfg.feed_tab, cfg.feed_league.clone());
    let visible = filter::apply(store.rows(), &selection);
    let entitlement = Entitlement::new();

    let leagues: Vec<&str> = store.leagues().iter().map(|l| l.label()).collect();
    println!(
        "{} · {} · showing {} of {} matches",
        selection.tab,
        selection.league.label(),
        visible.len(),
        store.rows().len()
    );
    println!("leagues: {}", leagues.join(", "));

    if visible.is_empty() {
        println!("No matches found for {}", selection.league.label());
        return Ok(());
    }

    for row in gate(&visible, &entitlement) {
        println!(
            "{:>3}  {}  {:<4}  {:<20}  {:<22} vs {:<22}  {}",
            row.index + 1,
            format_kickoff(&row.fixture.kickoff_time),
            row.fixture.status.code(),
            truncate(&row.fixture.league, 20),
            truncate(&row.fixture.home_team, 22),
            truncate(&row.fixture.away_team, 22),
            prediction_cell(&row),
        );
    }
    Ok(())
}

async fn run_history(cfg: Config, date: &str) -> Result<()> {
    let (backend, _session) = backend_for(&cfg)?;
    let report = backend.history(date).await?;

    let s = report.summary;
    let rate = s
        .hit_rate()
        .map_or("—".to_string(), format_percent);
    println!(
        "{}: {} win / {} loss / {} push of {} graded · hit rate {rate}",
        report.date, s.win, s.loss, s.draw, s.total
    );
    for pick in &report.matches {
        let score = match (pick.fixture.score_home, pick.fixture.score_away) {
            (Some(h), Some(a)) => format!("{h}-{a}"),
            _ => "—".to_string(),
        };
        println!(
            "  {:<22} {:>5} {:<22}  {:<24} {}",
            truncate(&pick.fixture.home_team, 22),
            score,
            truncate(&pick.fixture.away_team, 22),
            truncate(&pick.prediction, 24),
            pick.outcome,
        );
    }
    Ok(())
}
