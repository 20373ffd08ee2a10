use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::game::{GameKind, ScoreOrdering};
use crate::App;

pub struct ScoreRowData {
    pub kind: GameKind,
    pub best: Option<u64>,
}

/// Pure presenter for a single scoreboard row
pub fn present_row(data: &ScoreRowData) -> Row<'static> {
    let (best_display, best_style) = match data.best {
        Some(value) => (
            data.kind.format_score(value),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        None => ("—".to_string(), Style::default().add_modifier(Modifier::DIM)),
    };

    let better = match data.kind.ordering() {
        ScoreOrdering::LowerIsBetter => "lower",
        ScoreOrdering::HigherIsBetter => "higher",
    };

    Row::new(vec![
        Cell::from(data.kind.name()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(data.kind.category()),
        Cell::from(best_display).style(best_style),
        Cell::from(better),
    ])
}

pub fn render_scoreboard(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Table
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let storage = if app.store.functional_allowed() {
        "scores are saved"
    } else {
        "functional storage declined, scores are not saved"
    };
    Paragraph::new(format!("Best Scores ({storage})"))
        .block(Block::default().borders(Borders::ALL).title("Scores"))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let rows: Vec<Row> = GameKind::ALL
        .iter()
        .map(|&kind| {
            present_row(&ScoreRowData {
                kind,
                best: app.store.best(kind),
            })
        })
        .collect();

    let header = Row::new(vec!["Game", "Category", "Best", "Better"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    Table::new(
        rows,
        [
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL))
    .column_spacing(2)
    .render(chunks[1], buf);

    Paragraph::new("(c)lear scores / (p)rivacy settings / (b)ack")
        .style(Style::default().add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
}
