use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::info;

use goalsnap_feed::error::{Result, VerificationFailure};
use goalsnap_feed::filter::{self, FilterSelection, LeagueTag};
use goalsnap_feed::gate::{is_visible, Entitlement};
use goalsnap_feed::payment::{PaymentVerificationMachine, Resolution, VerificationTicket};
use goalsnap_feed::session::{Language, Session};
use goalsnap_feed::state::FeedStore;
use goalsnap_feed::types::{FeedRow, FixtureId};

/// What the event loop should do after a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Reload,
    Verify(VerificationTicket),
}

/// Everything the dashboard shows, owned by the UI task for one session.
pub struct App {
    pub feed: FeedStore,
    pub selection: FilterSelection,
    pub entitlement: Entitlement,
    pub payment: PaymentVerificationMachine,
    pub payment_open: bool,
    /// Fixture whose full prediction is being shown.
    pub detail: Option<FixtureId>,
    /// Position within the filtered rows.
    pub cursor: usize,
    pub user_name: String,
    pub user_id: String,
    pub language: Language,
}

impl App {
    pub fn new(session: &Session, selection: FilterSelection, verify_display: Duration) -> Self {
        Self {
            feed: FeedStore::new(),
            selection,
            entitlement: Entitlement::new(),
            payment: PaymentVerificationMachine::new(verify_display),
            payment_open: false,
            detail: None,
            cursor: 0,
            user_name: session.display_name(),
            user_id: session.user_id(),
            language: session.language(),
        }
    }

    pub fn visible_rows(&self) -> Vec<&FeedRow> {
        filter::apply(self.feed.rows(), &self.selection)
    }

    pub fn detail_row(&self) -> Option<&FeedRow> {
        let id = self.detail?;
        self.feed.rows().iter().find(|r| r.fixture.id == id)
    }

    pub fn on_loaded(&mut self, result: Result<Vec<FeedRow>>) {
        self.feed.apply_load(result);
        if !self.feed.leagues().contains(&self.selection.league) {
            self.selection.league = LeagueTag::All;
        }
        if self.detail_row().is_none() {
            self.detail = None;
        }
        self.clamp_cursor();
    }

    pub fn on_verification(&mut self, attempt: u64, outcome: std::result::Result<(), VerificationFailure>) {
        let resolution = self
            .payment
            .resolve(attempt, outcome, &mut self.entitlement, Instant::now());
        if resolution == Resolution::Verified {
            info!(user = %self.user_name, "feed unlocked");
        }
    }

    /// Close the dialog once the Verified confirmation has been shown.
    pub fn tick(&mut self, now: Instant) {
        if self.payment.poll_display(now) {
            self.payment_open = false;
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Action {
        if self.payment_open {
            return self.handle_payment_key(code);
        }
        if self.detail.is_some() {
            if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace) {
                self.detail = None;
            }
            return Action::None;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return Action::Quit,
            // One load in flight at a time.
            KeyCode::Char('r') | KeyCode::Char('R') if self.feed.is_loading() => {}
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.feed.begin_load();
                return Action::Reload;
            }
            KeyCode::Tab | KeyCode::Right => self.set_tab(self.selection.tab.next()),
            KeyCode::BackTab | KeyCode::Left => self.set_tab(self.selection.tab.prev()),
            KeyCode::Char('l') => self.cycle_league(true),
            KeyCode::Char('L') | KeyCode::Char('h') => self.cycle_league(false),
            KeyCode::Down | KeyCode::Char('j') => {
                let max = self.visible_rows().len().saturating_sub(1);
                self.cursor = (self.cursor + 1).min(max);
            }
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Char('u') | KeyCode::Char('U') => self.open_payment(),
            KeyCode::Enter => self.open_selected(),
            _ => {}
        }
        Action::None
    }

    fn handle_payment_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Esc => self.close_payment(),
            KeyCode::Enter => {
                if let Some(ticket) = self.payment.retry() {
                    return Action::Verify(ticket);
                }
            }
            KeyCode::Backspace => {
                let mut tx_ref = self.payment.tx_ref().to_string();
                tx_ref.pop();
                self.payment.edit(tx_ref);
            }
            KeyCode::Char(c) => {
                let mut tx_ref = self.payment.tx_ref().to_string();
                tx_ref.push(c);
                self.payment.edit(tx_ref);
            }
            _ => {}
        }
        Action::None
    }

    /// Enter on an unlocked row shows its prediction; on a locked row it
    /// offers the unlock dialog instead.
    fn open_selected(&mut self) {
        let Some(id) = self.visible_rows().get(self.cursor).map(|r| r.fixture.id) else {
            return;
        };
        if is_visible(&self.entitlement, self.cursor) {
            self.detail = Some(id);
        } else {
            self.open_payment();
        }
    }

    fn open_payment(&mut self) {
        if !self.entitlement.is_premium() {
            self.payment_open = true;
        }
    }

    fn close_payment(&mut self) {
        self.payment.close();
        self.payment_open = false;
    }

    fn set_tab(&mut self, tab: filter::StatusTab) {
        self.selection.tab = tab;
        self.cursor = 0;
    }

    fn cycle_league(&mut self, forward: bool) {
        let leagues = self.feed.leagues();
        if leagues.is_empty() {
            return;
        }
        let current = leagues
            .iter()
            .position(|l| *l == self.selection.league)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % leagues.len()
        } else {
            (current + leagues.len() - 1) % leagues.len()
        };
        self.selection.league = leagues[next].clone();
        self.cursor = 0;
    }

    /// 1-based position of the selected league and the number of choices.
    pub fn league_position(&self) -> (usize, usize) {
        let leagues = self.feed.leagues();
        let idx = leagues
            .iter()
            .position(|l| *l == self.selection.league)
            .unwrap_or(0);
        (idx + 1, leagues.len())
    }

    fn clamp_cursor(&mut self) {
        let max = self.visible_rows().len().saturating_sub(1);
        self.cursor = self.cursor.min(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goalsnap_feed::filter::StatusTab;
    use goalsnap_feed::payment::VerificationState;

    fn feed_row(id: u64, league: &str, status: &str) -> FeedRow {
        let fixture = serde_json::from_value(serde_json::json!({
            "id": id,
            "home_team": format!("Home {id}"),
            "away_team": format!("Away {id}"),
            "league": league,
            "kickoff_time": "2026-10-14T19:00:00Z",
            "status": status,
        }))
        .unwrap();
        FeedRow::new(fixture, None)
    }

    fn loaded_app() -> App {
        let mut app = App::new(&Session::with_token("t"), FilterSelection::default(), Duration::from_millis(0));
        app.on_loaded(Ok(vec![
            feed_row(1, "La Liga", "NS"),
            feed_row(2, "Serie A", "NS"),
            feed_row(3, "La Liga", "1H"),
            feed_row(4, "Serie A", "PST"),
        ]));
        app
    }

    #[test]
    fn enter_on_locked_row_opens_the_unlock_dialog() {
        let mut app = loaded_app();
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Down);
        assert_eq!(app.cursor, 2);

        app.handle_key(KeyCode::Enter);

        assert!(app.payment_open);
        assert!(app.detail.is_none());
    }

    #[test]
    fn enter_on_free_row_shows_detail() {
        let mut app = loaded_app();
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.detail, Some(1));
        app.handle_key(KeyCode::Esc);
        assert!(app.detail.is_none());
    }

    #[test]
    fn typing_and_submitting_in_the_dialog() {
        let mut app = loaded_app();
        app.handle_key(KeyCode::Char('u'));
        assert_eq!(app.handle_key(KeyCode::Enter), Action::None);

        for c in "tx1".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        let action = app.handle_key(KeyCode::Enter);
        let Action::Verify(ticket) = action else {
            panic!("expected a verification ticket, got {action:?}");
        };
        assert_eq!(ticket.tx_ref, "tx1");
        assert_eq!(app.handle_key(KeyCode::Enter), Action::None, "one attempt in flight");

        app.on_verification(ticket.attempt, Ok(()));
        assert!(app.entitlement.is_premium());
        assert_eq!(*app.payment.state(), VerificationState::Verified);

        app.tick(Instant::now());
        assert!(!app.payment_open);
        assert_eq!(*app.payment.state(), VerificationState::Idle);
    }

    #[test]
    fn escape_abandons_the_attempt() {
        let mut app = loaded_app();
        app.handle_key(KeyCode::Char('u'));
        app.handle_key(KeyCode::Char('x'));
        let Action::Verify(ticket) = app.handle_key(KeyCode::Enter) else {
            panic!("expected a verification ticket");
        };
        app.handle_key(KeyCode::Esc);

        app.on_verification(ticket.attempt, Ok(()));

        assert!(!app.payment_open);
        assert!(!app.entitlement.is_premium());
    }

    #[test]
    fn league_cycle_uses_unfiltered_leagues() {
        let mut app = loaded_app();
        app.handle_key(KeyCode::Char('l'));
        assert_eq!(app.selection.league, LeagueTag::League("La Liga".to_string()));
        assert_eq!(app.visible_rows().len(), 1);

        app.handle_key(KeyCode::Char('l'));
        assert_eq!(app.selection.league, LeagueTag::League("Serie A".to_string()));
        assert_eq!(app.league_position(), (3, 3));

        app.handle_key(KeyCode::Char('l'));
        assert_eq!(app.selection.league, LeagueTag::All);
    }

    #[test]
    fn tab_switch_resets_cursor_and_reload_marks_loading() {
        let mut app = loaded_app();
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.selection.tab, StatusTab::Live);
        assert_eq!(app.cursor, 0);

        assert_eq!(app.handle_key(KeyCode::Char('r')), Action::Reload);
        assert!(app.feed.is_loading());
    }

    #[test]
    fn quit_works_while_loading() {
        let mut app = App::new(&Session::with_token("t"), FilterSelection::default(), Duration::from_secs(2));
        assert!(app.feed.is_loading());
        assert_eq!(app.handle_key(KeyCode::Down), Action::None);
        assert_eq!(app.handle_key(KeyCode::Char('q')), Action::Quit);
    }

    #[test]
    fn reload_is_ignored_while_a_load_is_in_flight() {
        let mut app = loaded_app();
        assert_eq!(app.handle_key(KeyCode::Char('r')), Action::Reload);
        assert_eq!(app.handle_key(KeyCode::Char('r')), Action::None);

        app.on_loaded(Ok(Vec::new()));
        assert_eq!(app.handle_key(KeyCode::Char('r')), Action::Reload);
    }

    #[test]
    fn reload_without_selected_league_falls_back_to_all() {
        let mut app = loaded_app();
        app.handle_key(KeyCode::Char('l'));
        app.on_loaded(Ok(vec![feed_row(9, "Eredivisie", "NS")]));
        assert_eq!(app.selection.league, LeagueTag::All);
    }
}
