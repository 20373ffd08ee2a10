use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::game::GameKind;
use crate::ui::layout::{HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::App;

pub fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(GameKind::ALL.len() as u16),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new("mindgames")
        .block(Block::default().borders(Borders::ALL))
        .style(bold.fg(Color::Cyan))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let lines: Vec<Line> = GameKind::ALL
        .iter()
        .enumerate()
        .map(|(idx, &kind)| {
            let selected = idx == app.menu_index;
            let marker = if selected { "> " } else { "  " };
            let style = if selected {
                bold.fg(Color::Yellow)
            } else {
                Style::default()
            };
            let best = app
                .store
                .best(kind)
                .map(|v| kind.format_score(v))
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(format!("{marker}{} {:<18}", idx + 1, kind.name()), style),
                Span::styled(format!("{:<12}", kind.category()), Style::default().fg(Color::Gray)),
                Span::styled(format!("{best:<12}"), Style::default().fg(Color::Green)),
                Span::styled(
                    if selected { kind.description() } else { "" },
                    Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
                ),
            ])
        })
        .collect();
    Paragraph::new(lines).render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(enter) play / (1-9) pick / (s)cores / (p)rivacy / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[2], buf);
}

pub fn render_consent(_app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([Constraint::Min(6), Constraint::Length(1)])
        .split(area);

    let text = vec![
        Line::from(Span::styled(
            "Storage preferences",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from("Necessary storage keeps this choice. Functional storage keeps your best"),
        Line::from("scores and a history of finished sessions on this machine."),
        Line::from("Declining functional storage removes any scores already saved."),
        Line::default(),
        Line::from("(a) accept all   (f) functional only   (n) necessary only"),
    ];
    Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Privacy"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        "(esc) decide later",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[1], buf);
}
