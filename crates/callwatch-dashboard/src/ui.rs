use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use callwatch_core::format::{Badge, Severity};
use callwatch_core::time::Timestamp;
use callwatch_core::view::ViewMode;

use crate::app::App;
use crate::composer::{DashboardView, ErrorBanner, SUBTITLE, TITLE};
use crate::panels::{CarrierPanel, FeedPanel, SessionOption};

/// Lines each feed entry takes.
const ENTRY_LINES: usize = 2;

/// Render the full TUI frame.
pub fn render(f: &mut Frame, app: &mut App, now: Timestamp) {
    let view = app.view(now);
    let banner_height = if view.error.is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),             // header
            Constraint::Length(banner_height), // error banner
            Constraint::Min(5),                // main area
            Constraint::Length(1),             // status bar
        ])
        .split(f.area());

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(chunks[2]);

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(3)])
        .split(main_chunks[0]);

    render_header(f, &view, chunks[0]);
    if let Some(banner) = &view.error {
        render_error(f, banner, chunks[1]);
    }
    render_carrier(f, &view.carrier, left_chunks[0]);
    render_sessions(f, app, &view, left_chunks[1]);
    render_feed(f, app, &view.feed, main_chunks[1]);
    render_status_bar(f, app, &view, chunks[3]);
}

fn badge_style(severity: Severity) -> Style {
    let color = match severity {
        Severity::Positive => Color::Green,
        Severity::Negative => Color::Red,
        Severity::Neutral => Color::Blue,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn badge_span(badge: &Badge) -> Span<'static> {
    Span::styled(format!("[{}]", badge.text), badge_style(badge.severity))
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn render_header(f: &mut Frame, view: &DashboardView, area: Rect) {
    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {TITLE}"),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  |  "),
            Span::raw(view.selection_label().to_string()),
        ]),
        Line::from(Span::styled(format!(" {SUBTITLE}"), dim())),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_error(f: &mut Frame, banner: &ErrorBanner, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ", banner.heading))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    let text = Paragraph::new(banner.message.as_str())
        .style(Style::default().fg(Color::Red))
        .block(block);
    f.render_widget(text, area);
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), dim()),
        Span::raw(value),
    ])
}

fn render_carrier(f: &mut Frame, carrier: &CarrierPanel, area: Rect) {
    let block = Block::default()
        .title(" Carrier Information ")
        .borders(Borders::ALL)
        .border_style(dim());

    let lines = match carrier {
        CarrierPanel::Loading => vec![Line::from(Span::styled("Loading...", dim()))],
        CarrierPanel::Waiting => vec![
            Line::from(Span::styled(
                "Waiting for Verification",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Carrier details will appear after MC verification",
                dim(),
            )),
        ],
        CarrierPanel::Failed { mc_number, reason } => vec![
            Line::from(badge_span(&Badge {
                text: "Failed".into(),
                severity: Severity::Negative,
            })),
            field("MC Number", format!("MC #{mc_number}")),
            Line::from(Span::styled(reason.clone(), Style::default().fg(Color::Red))),
        ],
        CarrierPanel::Verified {
            carrier_name,
            mc_number,
            status,
            address,
        } => {
            let mut lines = vec![
                Line::from(badge_span(&Badge {
                    text: "Verified".into(),
                    severity: Severity::Positive,
                })),
                field("Company Name", carrier_name.clone()),
                field("MC Number", format!("MC #{mc_number}")),
            ];
            if !status.is_empty() {
                lines.push(field("Status", status.clone()));
            }
            if let Some(address) = address {
                lines.push(field("Address", address.clone()));
            }
            lines
        },
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_sessions(f: &mut Frame, app: &App, view: &DashboardView, area: Rect) {
    let title = if view.sessions_loading {
        " Sessions (loading) ".to_string()
    } else if app.sessions.error.is_some() {
        " Sessions (stale) ".to_string()
    } else {
        format!(" Sessions ({}) ", app.sessions.sessions.len())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(dim());

    let items: Vec<ListItem> = view
        .sessions
        .iter()
        .enumerate()
        .map(|(i, option)| session_item(option, i == app.highlighted))
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn session_item(option: &SessionOption, highlighted: bool) -> ListItem<'static> {
    let marker = if option.selected { "> " } else { "  " };
    let mut style = Style::default();
    if option.selected {
        style = style.add_modifier(Modifier::BOLD);
    }
    if highlighted {
        style = style.add_modifier(Modifier::REVERSED);
    }
    let mut spans = vec![Span::styled(format!("{marker}{}", option.label), style)];
    if option.live {
        spans.push(Span::styled(
            " LIVE",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn render_feed(f: &mut Frame, app: &mut App, feed: &FeedPanel, area: Rect) {
    let title = match feed.count_label() {
        Some(count) => format!(" Activity Feed ({count}) "),
        None => " Activity Feed ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let lines: Vec<Line> = match feed {
        FeedPanel::Loading => vec![Line::from(Span::styled("Loading activities...", dim()))],
        FeedPanel::Empty => vec![
            Line::from(Span::styled(
                "Ready to Capture Call Events",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "After MC verification, events will appear here live",
                dim(),
            )),
        ],
        FeedPanel::Entries(entries) => entries
            .iter()
            .flat_map(|entry| {
                let mut head = vec![
                    Span::styled(
                        entry.event.title.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" "),
                ];
                if let Some(badge) = &entry.event.badge {
                    head.push(badge_span(badge));
                    head.push(Span::raw(" "));
                }
                head.push(Span::styled(
                    format!("{} ({})", entry.relative_time, entry.timestamp),
                    dim(),
                ));
                [
                    Line::from(head),
                    Line::from(format!("  {}", entry.event.description)),
                ]
            })
            .collect(),
    };

    let visible = usize::from(area.height.saturating_sub(2));
    let total = match feed {
        FeedPanel::Entries(entries) => entries.len() * ENTRY_LINES,
        _ => lines.len(),
    };
    let max = u16::try_from(total.saturating_sub(visible)).unwrap_or(u16::MAX);
    let offset = app.feed_offset(max);

    let paragraph = Paragraph::new(lines).block(block).scroll((offset, 0));
    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, app: &App, view: &DashboardView, area: Rect) {
    let mode = match view.selection.mode {
        ViewMode::Waitroom => "wait room",
        ViewMode::History => "history",
        ViewMode::Session => "session",
    };
    let pause_indicator = if app.follow { "" } else { " [PAUSED]" };
    let text = format!(
        " callwatch | {mode}{pause_indicator} | w:wait room  a:history  j/k:move  Enter:select  r:refresh  p:pause  q:quit"
    );
    let bar = Paragraph::new(text).style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(bar, area);
}
