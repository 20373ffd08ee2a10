use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget},
};

use crate::game::{GameKind, NBACK_PASS_ACCURACY};
use crate::metrics::{self, TypingReport};
use crate::score_store::SaveOutcome;
use crate::session::Session;
use crate::ui::charting::{compute_chart_params, format_label};
use crate::ui::layout::{HORIZONTAL_MARGIN, VERTICAL_MARGIN};
use crate::App;

/// Result lines for a finished session
pub fn result_lines(session: &Session) -> Vec<String> {
    match session.kind() {
        GameKind::Reaction => match metrics::reaction_stats(session.trials()) {
            Some(stats) => vec![
                format!("{:.0} ms average", stats.mean_ms),
                format!(
                    "best {} ms   {:.1} sd   {} too early",
                    stats.best_ms,
                    stats.std_dev_ms,
                    session.counters().too_early
                ),
            ],
            None => vec!["No valid attempts".to_string()],
        },
        GameKind::AimTrainer => {
            let report = metrics::aim_report(session);
            let mut lines = vec![format!(
                "{} hits   {} misses   {:.0}% accuracy",
                report.hits, report.misses, report.accuracy
            )];
            if let Some(ms) = report.mean_hit_ms {
                lines.push(format!("{ms:.0} ms per target"));
            }
            lines
        }
        GameKind::NBack => {
            let report = metrics::nback_report(session);
            let verdict = if report.total_matches > 0 && report.accuracy >= NBACK_PASS_ACCURACY {
                "passed"
            } else {
                "keep practicing"
            };
            vec![
                format!(
                    "{} of {} matches   {} missed   {} false alarms",
                    report.hits, report.total_matches, report.misses, report.false_positives
                ),
                format!("{:.0}% accuracy, {verdict}", report.accuracy),
            ]
        }
        GameKind::ColorBlind => {
            let report = metrics::colorblind_report(session);
            vec![
                format!("{} of {} plates read correctly", report.correct, report.total),
                format!("{:.0}%   {}", report.percent, report.classification),
            ]
        }
        GameKind::Typing => match metrics::typing_report(session) {
            Some(report) => vec![format!(
                "{} wpm   {}% acc   {} errors",
                report.wpm, report.accuracy, report.errors
            )],
            None => vec!["Nothing typed".to_string()],
        },
        GameKind::Simon | GameKind::VisualMemory | GameKind::NumberMemory => {
            vec![format!("Reached level {}", session.level())]
        }
        GameKind::PrecisionClick => vec![format!(
            "Completed {} of {} levels",
            session.levels_completed(),
            session.config().max_level.unwrap_or(0)
        )],
    }
}

fn score_line(app: &App, kind: GameKind) -> String {
    let shown = |v: Option<u64>| v.map(|v| kind.format_score(v));
    match (app.last_save, shown(app.last_score), shown(app.previous_best)) {
        (Some(SaveOutcome::Stored), Some(score), Some(was)) => format!("New best: {score} (was {was})"),
        (Some(SaveOutcome::Stored), Some(score), None) => format!("New best: {score}"),
        (Some(SaveOutcome::ConsentWithheld), _, _) => {
            "Scores are not saved without functional storage".to_string()
        }
        _ => shown(app.store.best(kind))
            .map(|best| format!("Best: {best}"))
            .unwrap_or_default(),
    }
}

fn render_chart(report: &TypingReport, time_limit: Option<f64>, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let (duration, highest) = compute_chart_params(&report.series, time_limit);
    let tuples: Vec<(f64, f64)> = report.series.iter().copied().map(Into::into).collect();
    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, duration])
                .labels(vec![
                    Span::styled("1", bold),
                    Span::styled(format_label(duration), bold),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest])
                .labels(vec![
                    Span::styled("0", bold),
                    Span::styled(format_label(highest), bold),
                ]),
        )
        .render(area, buf);
}

pub fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session.as_ref() else {
        return;
    };
    let kind = session.kind();
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart or padding
            Constraint::Length(3), // results
            Constraint::Length(1), // best score
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let report = (kind == GameKind::Typing)
        .then(|| metrics::typing_report(session))
        .flatten();
    match report {
        Some(report) => render_chart(
            &report,
            session.config().time_limit_secs.map(f64::from),
            chunks[0],
            buf,
        ),
        None => {
            let title_area = Rect {
                y: chunks[0].bottom().saturating_sub(1),
                height: chunks[0].height.min(1),
                ..chunks[0]
            };
            Paragraph::new(Span::styled(kind.name(), bold.fg(Color::Cyan)))
                .alignment(Alignment::Center)
                .render(title_area, buf);
        }
    }

    let lines: Vec<Line> = result_lines(session)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, bold)))
        .collect();
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        score_line(app, kind),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        "(r)etry / (m)enu / (s)cores / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);
}
