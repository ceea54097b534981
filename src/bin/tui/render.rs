use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

use goalsnap_feed::display::{format_kickoff, format_percent, prediction_cell, truncate};
use goalsnap_feed::filter::StatusTab;
use goalsnap_feed::gate::gate;
use goalsnap_feed::payment::VerificationState;
use goalsnap_feed::state::LoadStatus;
use goalsnap_feed::types::{FeedRow, MatchContext, Prediction};

use crate::app::App;

fn title(text: &str) -> Span<'static> {
    Span::styled(
        format!(" {text} "),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )
}

fn framed(text: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title(text))
}

fn key(k: &str) -> Span<'static> {
    Span::styled(format!("[{k}] "), Style::default().fg(Color::Yellow))
}

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(3), // tabs
            Constraint::Length(1), // league
            Constraint::Min(0),    // feed
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_tabs(f, app, chunks[1]);
    render_league(f, app, chunks[2]);
    render_feed(f, app, chunks[3]);
    render_footer(f, app, chunks[4]);

    if let Some(row) = app.detail_row() {
        render_detail(f, row);
    }
    if app.payment_open {
        render_payment(f, app);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let (status_text, status_color) = match app.feed.status() {
        LoadStatus::Ready => (format!("● {} matches", app.feed.rows().len()), Color::Green),
        LoadStatus::Loading => ("◌ loading".to_string(), Color::Yellow),
        LoadStatus::Failed(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let plan = if app.entitlement.is_premium() {
        Span::styled("★ PREMIUM", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("free preview  [u] upgrade", Style::default().fg(Color::Yellow))
    };

    let line = Line::from(vec![
        Span::styled(
            " GoalSnap  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(app.user_name.clone(), Style::default().fg(Color::White)),
        Span::raw("  │  "),
        plan,
        Span::raw("  │  "),
        Span::styled(app.language.to_string(), Style::default().fg(Color::DarkGray)),
    ]);

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = StatusTab::ALL.iter().map(|t| Line::from(t.label())).collect();
    let tabs = Tabs::new(titles)
        .select(app.selection.tab.position())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn render_league(f: &mut Frame, app: &App, area: Rect) {
    let (pos, total) = app.league_position();
    let line = Line::from(vec![
        Span::styled(" League: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.selection.league.label().to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  ({pos}/{total})"), Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_feed(f: &mut Frame, app: &App, area: Rect) {
    let block = framed("MATCHES");

    if let LoadStatus::Failed(reason) = app.feed.status() {
        let text = vec![
            Line::from(Span::styled(reason.clone(), Style::default().fg(Color::Red))),
            Line::from(Span::styled("press r to retry", Style::default().fg(Color::DarkGray))),
        ];
        f.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let visible = app.visible_rows();
    if visible.is_empty() {
        let msg = if app.feed.is_loading() {
            "Loading matches…".to_string()
        } else {
            format!("No matches found for {}", app.selection.league.label())
        };
        let p = Paragraph::new(Span::styled(msg, Style::default().fg(Color::DarkGray))).block(block);
        f.render_widget(p, area);
        return;
    }

    let header_cells = ["#", "Kickoff", "St", "League", "Match", "Prediction"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = gate(&visible, &app.entitlement)
        .iter()
        .map(|g| {
            let status_color = if g.fixture.status.is_in_play() {
                Color::Green
            } else {
                Color::DarkGray
            };
            let cell_style = if g.is_locked() {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            Row::new(vec![
                Cell::from(format!("{}", g.index + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(format_kickoff(&g.fixture.kickoff_time)),
                Cell::from(g.fixture.status.code().to_string()).style(Style::default().fg(status_color)),
                Cell::from(truncate(&g.fixture.league, 18)).style(Style::default().fg(Color::Cyan)),
                Cell::from(truncate(&format!("{} vs {}", g.fixture.home_team, g.fixture.away_team), 36)),
                Cell::from(prediction_cell(g)).style(cell_style),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(12),
            Constraint::Length(4),
            Constraint::Length(18),
            Constraint::Length(36),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut state = TableState::default();
    state.select(Some(app.cursor));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let spans = if app.payment_open {
        vec![key("Enter"), Span::raw("verify  "), key("Esc"), Span::raw("close  ")]
    } else if app.detail.is_some() {
        vec![key("Esc"), Span::raw("back  ")]
    } else {
        vec![
            Span::raw(" "),
            key("q"),
            Span::raw("quit  "),
            key("r"),
            Span::raw("reload  "),
            key("Tab ←→"),
            Span::raw("category  "),
            key("l/L"),
            Span::raw("league  "),
            key("↑↓ / j k"),
            Span::raw("scroll  "),
            key("Enter"),
            Span::raw("details  "),
        ]
    };
    f.render_widget(Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::White)), area);
}

fn render_detail(f: &mut Frame, row: &FeedRow) {
    let area = centered_rect(80, 85, f.area());
    let fx = &row.fixture;
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} vs {}", fx.home_team, fx.away_team),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{} · {} · {}", fx.league, format_kickoff(&fx.kickoff_time), fx.status),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];

    match &row.prediction {
        None => lines.push(Line::from(Span::styled(
            goalsnap_feed::display::NO_PREDICTION_LABEL,
            Style::default().fg(Color::DarkGray),
        ))),
        Some(p) => lines.extend(prediction_lines(p)),
    }
    lines.extend(context_lines(&row.context));

    let p = Paragraph::new(lines).block(framed("MATCH")).wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

fn prediction_lines(p: &Prediction) -> Vec<Line<'static>> {
    let label = |s: &str| Span::styled(format!("{s:<14}"), Style::default().fg(Color::Yellow));
    let pr = &p.probabilities;
    let mut lines = vec![
        Line::from(vec![label("Advice"), Span::raw(p.advice().to_string())]),
        Line::from(vec![
            label("1X2"),
            Span::raw(format!(
                "{} / {} / {}",
                format_percent(pr.home_win),
                format_percent(pr.draw),
                format_percent(pr.away_win)
            )),
        ]),
        Line::from(vec![
            label("Goals"),
            Span::raw(format!(
                "line {} · {}",
                p.goals_market.real_line,
                format_percent(p.goals_market.probability)
            )),
        ]),
    ];
    if !p.goals_market.analysis.is_empty() {
        lines.push(Line::from(vec![label(""), Span::raw(p.goals_market.analysis.clone())]));
    }
    if let Some(h) = &p.first_half_analysis {
        let marker = if h.has_value { " ✓" } else { "" };
        lines.push(Line::from(vec![
            label("First half"),
            Span::raw(format!("{}{marker} {}", format_percent(h.probability), h.text)),
        ]));
    }
    if let Some(score) = &p.expected_score {
        lines.push(Line::from(vec![label("Score"), Span::raw(score.clone())]));
    }
    if let Some(hc) = &p.handicap_market {
        lines.push(Line::from(vec![label("Handicap"), Span::raw(hc.suggested_line.clone())]));
    }
    if let Some(form) = &p.form_analysis {
        lines.push(Line::from(vec![label("Form"), Span::raw(format!("{} | {}", form.home, form.away))]));
    }
    if let Some(insight) = &p.ai_insight {
        lines.push(Line::from(vec![
            label("Insight"),
            Span::raw(format!("{} ({})", insight.main_pick, insight.confidence)),
        ]));
        for note in [&insight.momentum_analysis, &insight.lineup_analysis].into_iter().flatten() {
            lines.push(Line::from(vec![label(""), Span::raw(note.clone())]));
        }
    }
    lines
}

pub const NO_LINEUPS: &str = "Available 60m before kickoff";
pub const NO_INJURIES: &str = "No confirmed injuries";
pub const NO_HEAD_TO_HEAD: &str = "No recent H2H data";

fn section(heading: &str) -> [Line<'static>; 2] {
    [
        Line::from(""),
        Line::from(Span::styled(
            heading.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
    ]
}

fn empty_note(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ))
}

/// Lineups, injuries and head-to-head, each with its own empty state.
fn context_lines(ctx: &MatchContext) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    lines.extend(section("Lineups"));
    if ctx.lineups.is_empty() {
        lines.push(empty_note(NO_LINEUPS));
    }
    for team in &ctx.lineups {
        lines.push(Line::from(Span::styled(
            team.formation.clone().unwrap_or_else(|| "-".to_string()),
            Style::default().fg(Color::Green),
        )));
        let players: Vec<String> = team
            .start_xi
            .iter()
            .map(|e| match e.player.number {
                Some(n) => format!("{n} {}", e.player.name),
                None => e.player.name.clone(),
            })
            .collect();
        lines.push(Line::from(players.join(", ")));
    }

    lines.extend(section("Injuries"));
    if ctx.injuries.is_empty() {
        lines.push(empty_note(NO_INJURIES));
    }
    for inj in &ctx.injuries {
        lines.push(Line::from(vec![
            Span::raw(format!("{} ({}) ", inj.player.name, inj.team.name)),
            Span::styled(inj.kind.clone(), Style::default().fg(Color::Red)),
        ]));
    }

    lines.extend(section("H2H"));
    if ctx.history.is_empty() {
        lines.push(empty_note(NO_HEAD_TO_HEAD));
    }
    for m in &ctx.history {
        lines.push(Line::from(vec![
            Span::styled(format!("{}  ", m.date), Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{} {} {}", m.home_team, m.score, m.away_team)),
        ]));
    }
    lines
}

fn render_payment(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 40, f.area());
    let machine = &app.payment;

    let (status, color) = match machine.state() {
        VerificationState::Idle => ("Enter the payment transaction reference".to_string(), Color::DarkGray),
        VerificationState::Verifying => ("Verifying…".to_string(), Color::Yellow),
        VerificationState::Verified => ("✓ Verified, premium unlocked".to_string(), Color::Green),
        VerificationState::Failed { reason } => (format!("✗ {reason}"), Color::Red),
    };
    let cursor = if machine.is_verifying() { "" } else { "▏" };

    let lines = vec![
        Line::from(Span::styled(
            "Unlock every prediction in the feed.",
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Tx ref: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{}{cursor}", machine.tx_ref()),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(status, Style::default().fg(color))),
    ];

    let p = Paragraph::new(lines).block(framed("UPGRADE")).wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

/// A rectangle of `pct_x` by `pct_y` percent centred in `r`.
fn centered_rect(pct_x: u16, pct_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .split(vertical[1])[1]
}
