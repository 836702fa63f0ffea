//! Ratatui rendering of the dashboard: status header, results panel, key hints

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::display::{Panel, ViewState};
use super::normalize::format_votes;
use super::status::ConnectionState;
use super::types::RankedCandidate;

const C_OK: Color = Color::Rgb(100, 220, 100);
const C_ERR: Color = Color::Rgb(220, 100, 100);
const C_LOADING: Color = Color::Rgb(255, 152, 0);
const C_DIM: Color = Color::Rgb(120, 120, 120);
const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
const C_ACCENT: Color = Color::Rgb(100, 180, 220);

/// Draw the whole dashboard into `area`
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &ViewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, chunks[0], state);
    render_results_panel(f, chunks[1], state);
    render_key_hints(f, chunks[2]);
}

fn render_header(f: &mut Frame, area: Rect, state: &ViewState) {
    let color = status_color(state.status);
    let block = Block::default()
        .title(" VOTE TALLY ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let label = if state.status_label.is_empty() {
        state.status.label()
    } else {
        state.status_label.as_str()
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", state.status.icon()), Style::default().fg(color)),
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled("   Next refresh in ", Style::default().fg(C_DIM)),
            Span::styled(format!("{}s", state.countdown), Style::default().fg(C_ACCENT)),
        ]),
        Line::from(vec![
            Span::styled("Updated ", Style::default().fg(C_DIM)),
            Span::styled(
                state.last_updated.clone().unwrap_or_else(|| "--:--:--".to_string()),
                Style::default().fg(C_BRIGHT),
            ),
            Span::styled("   Total votes ", Style::default().fg(C_DIM)),
            Span::styled(
                state.total_votes.map(format_votes).unwrap_or_else(|| "--".to_string()),
                Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_results_panel(f: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default()
        .title(" RESULTS ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_ACCENT));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = match &state.panel {
        Panel::Loading => vec![Line::from(Span::styled(
            "Loading results...",
            Style::default().fg(C_LOADING),
        ))],
        Panel::Error(message) => vec![
            Line::from(Span::styled(
                "⚠ Error loading data",
                Style::default().fg(C_ERR).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(message.as_str(), Style::default().fg(C_BRIGHT))),
            Line::from(""),
            Line::from(Span::styled("Press r to retry", Style::default().fg(C_DIM))),
        ],
        Panel::NoData => vec![
            Line::from(Span::styled(
                "⚠ No data available",
                Style::default().fg(C_LOADING).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "No candidates found to display",
                Style::default().fg(C_DIM),
            )),
        ],
        Panel::Results(candidates) => {
            let bar_width = (inner.width as usize).saturating_sub(2).max(10);
            candidates
                .iter()
                .flat_map(|c| candidate_lines(c, bar_width))
                .collect()
        }
    };

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn candidate_lines(candidate: &RankedCandidate, bar_width: usize) -> Vec<Line<'static>> {
    let color = parse_hex_color(&candidate.color).unwrap_or(C_ACCENT);

    vec![
        Line::from(vec![
            Span::styled(
                candidate.name.clone(),
                Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {} votes", format_votes(u128::from(candidate.votes))),
                Style::default().fg(C_DIM),
            ),
        ]),
        Line::from(Span::styled(
            percentage_bar(candidate.percentage_f64(), bar_width),
            Style::default().fg(color),
        )),
        Line::from(Span::styled(
            format!("{}% of total", candidate.percentage_label()),
            Style::default().fg(color),
        )),
        Line::from(""),
    ]
}

fn render_key_hints(f: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::styled(" r", Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)),
        Span::styled(" refresh  ", Style::default().fg(C_DIM)),
        Span::styled("q", Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)),
        Span::styled(" quit", Style::default().fg(C_DIM)),
    ]);
    f.render_widget(Paragraph::new(hints), area);
}

fn status_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Connected => C_OK,
        ConnectionState::Error => C_ERR,
        ConnectionState::Loading => C_LOADING,
        ConnectionState::Idle => C_DIM,
    }
}

/// Horizontal bar filled to `pct` percent of `width`
fn percentage_bar(pct: f64, width: usize) -> String {
    let filled = ((pct.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Parse "#rrggbb" or "#rgb" into a terminal colour
fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.trim().strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();

    match digits.len() {
        6 => Some(Color::Rgb(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        3 => {
            let expand = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
            Some(Color::Rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}
