use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle},
        Block, Borders, Paragraph, Widget, Wrap,
    },
};
use std::collections::BTreeSet;
use unicode_width::UnicodeWidthStr;

use crate::game::{GameKind, NBACK_SHOW_MS, SIMON_ELEMENT_MS};
use crate::metrics::{live_wpm, typing_errors};
use crate::session::{Session, SessionState};
use crate::stimulus::{
    DualBallTrack, Plate, Response, SimonColor, Stimulus, Target, BALL_RADIUS, CANVAS_CENTER,
    CANVAS_SIZE, NBACK_GRID_CELLS,
};
use crate::timers::Millis;
use crate::ui::layout::play_layout;
use crate::App;

/// Part of each Simon slot during which the color is lit
const SIMON_LIT_MS: u64 = 500;
/// How long a pressed Simon pad stays lit
const SIMON_PRESS_FLASH_MS: u64 = 200;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn centered(text: impl Into<String>, style: Style) -> Paragraph<'static> {
    Paragraph::new(Span::styled(text.into(), style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

/// Vertically center `height` rows inside `area`
fn middle(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect::new(area.x, area.y + (area.height - height) / 2, area.width, height)
}

pub fn render_play(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session.as_ref() else {
        return;
    };
    let layout = play_layout(area);
    render_header(session, app.now, layout.header, buf);

    let arena = layout.arena;
    match session.kind() {
        GameKind::Reaction => render_reaction(session, arena, buf),
        GameKind::AimTrainer => render_aim(app, session, arena, buf),
        GameKind::NBack => render_nback(session, app.now, arena, buf),
        GameKind::Simon => render_simon(session, app.now, arena, buf),
        GameKind::ColorBlind => render_colorblind(app, session, arena, buf),
        GameKind::VisualMemory => render_visual_memory(app, session, arena, buf),
        GameKind::Typing => render_typing(session, app.now, arena, buf),
        GameKind::NumberMemory => render_number_memory(app, session, arena, buf),
        GameKind::PrecisionClick => render_precision(session, arena, buf),
    }

    Paragraph::new(Span::styled(
        controls(session.kind()),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(layout.footer, buf);
}

fn controls(kind: GameKind) -> &'static str {
    match kind {
        GameKind::Reaction | GameKind::PrecisionClick => "(space) press / (esc)ape",
        GameKind::NBack => "(space) match / (esc)ape",
        GameKind::AimTrainer => "(click) shoot / (esc)ape",
        GameKind::Simon => "(1-4 or r b g y) repeat / (esc)ape",
        GameKind::ColorBlind => "(digits) answer / (enter) submit / (tab) skip / (esc)ape",
        GameKind::VisualMemory => "(arrows) move / (space or click) pick / (enter) submit / (esc)ape",
        GameKind::Typing => "type the passage / (esc)ape",
        GameKind::NumberMemory => "(digits) answer / (enter) submit / (esc)ape",
    }
}

fn render_header(session: &Session, now: Millis, area: Rect, buf: &mut Buffer) {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let mut title = vec![Span::styled(session.kind().name(), bold().fg(Color::Cyan))];
    match session.kind() {
        GameKind::NBack => title.push(Span::styled(format!("   {}-Back", session.config().level), bold())),
        GameKind::Simon
        | GameKind::VisualMemory
        | GameKind::NumberMemory
        | GameKind::PrecisionClick => {
            title.push(Span::styled(format!("   Level {}", session.level()), bold()))
        }
        _ => {}
    }
    if let Some(lives) = session.lives() {
        title.push(Span::styled(
            format!("   {}", "♥".repeat(lives as usize)),
            Style::default().fg(Color::Red),
        ));
    }
    if let Some(remaining) = session.time_remaining_ms(now) {
        title.push(Span::styled(
            format!("   {:.1}", remaining as f64 / 1000.0),
            dim.patch(bold()),
        ));
    }

    let counters = session.counters();
    let tally = match session.kind() {
        GameKind::ColorBlind => format!(
            "plate {} of {}",
            (session.counted_trials() + 1).min(session.config().length.unwrap_or(0)),
            session.config().length.unwrap_or(0)
        ),
        GameKind::NBack => format!(
            "hits {}   misses {}   false alarms {}",
            counters.hits, counters.misses, counters.false_positives
        ),
        GameKind::AimTrainer => format!("hits {}   misses {}", counters.hits, counters.misses),
        GameKind::Reaction => format!(
            "attempt {} of {}",
            (counters.hits + 1).min(session.config().length.unwrap_or(0)),
            session.config().length.unwrap_or(0)
        ),
        _ => String::new(),
    };

    Paragraph::new(vec![Line::from(title), Line::from(Span::styled(tally, dim))])
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_reaction(session: &Session, area: Rect, buf: &mut Buffer) {
    let last = session.trials().last();
    let (bg, message) = match session.state() {
        SessionState::Active => (Color::Green, "CLICK!".to_string()),
        _ => {
            let message = match last {
                Some(t) if t.presented_at.is_none() => "Too early! Wait for green...".to_string(),
                Some(t) => match t.latency_ms() {
                    Some(ms) => format!("{ms} ms   Wait for green..."),
                    None => "Wait for green...".to_string(),
                },
                None => "Wait for green...".to_string(),
            };
            (Color::Red, message)
        }
    };

    Block::default().style(Style::default().bg(bg)).render(area, buf);
    centered(message, bold().fg(Color::White).bg(bg)).render(middle(area, 1), buf);
}

fn render_aim(app: &App, session: &Session, area: Rect, buf: &mut Buffer) {
    let arena = app.config.game_config(GameKind::AimTrainer).arena;
    let target: Option<Target> = match (session.state(), session.current_stimulus()) {
        (SessionState::Active, Some(Stimulus::Target(t))) => Some(*t),
        _ => None,
    };

    Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, arena.width])
        .y_bounds([0.0, arena.height])
        .paint(|ctx| {
            if let Some(target) = target {
                let (cx, cy) = target.center();
                for ring in 0..3 {
                    ctx.draw(&Circle {
                        x: cx,
                        y: arena.height - cy,
                        radius: target.radius() * (1.0 - ring as f64 * 0.3),
                        color: if ring == 1 { Color::White } else { Color::Red },
                    });
                }
            }
        })
        .render(area, buf);
}

fn render_nback(session: &Session, now: Millis, area: Rect, buf: &mut Buffer) {
    let lit = match (session.state(), session.current_stimulus(), session.presented_at()) {
        (SessionState::Active, Some(Stimulus::GridCell(cell)), Some(at))
            if now.saturating_sub(at) < NBACK_SHOW_MS =>
        {
            Some(*cell)
        }
        _ => None,
    };
    let pressed = session
        .current_inputs()
        .iter()
        .any(|i| i.response == Response::Press);

    let side = (NBACK_GRID_CELLS as f64).sqrt() as usize;
    let border = if pressed { Color::Yellow } else { Color::Gray };
    render_grid(area, side, buf, |cell| {
        let style = if lit == Some(cell) {
            Style::default().bg(Color::Blue)
        } else {
            Style::default()
        };
        (style, Style::default().fg(border))
    });
}

/// Split `area` into a `side` x `side` grid and draw each cell with the
/// (fill, border) styles returned by `style_of`
fn render_grid(area: Rect, side: usize, buf: &mut Buffer, style_of: impl Fn(usize) -> (Style, Style)) {
    let ratio = vec![Constraint::Ratio(1, side as u32); side];
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(ratio.clone())
        .split(area);
    for (r, row) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(ratio.clone())
            .split(*row);
        for (c, cell_area) in cols.iter().enumerate() {
            let (fill, border) = style_of(r * side + c);
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .style(fill)
                .render(*cell_area, buf);
        }
    }
}

fn simon_color(color: SimonColor) -> Color {
    match color {
        SimonColor::Red => Color::Red,
        SimonColor::Blue => Color::Blue,
        SimonColor::Green => Color::Green,
        SimonColor::Yellow => Color::Yellow,
    }
}

/// Color being played back at `now`, if any
pub fn simon_playback(session: &Session, now: Millis) -> Option<SimonColor> {
    let (SessionState::Priming, Some(Stimulus::Colors(seq)), Some(ready)) =
        (session.state(), session.current_stimulus(), session.next_deadline())
    else {
        return None;
    };
    let start = ready.checked_sub(seq.len() as u64 * SIMON_ELEMENT_MS)?;
    let offset = now.checked_sub(start)?;
    let slot = (offset / SIMON_ELEMENT_MS) as usize;
    (offset % SIMON_ELEMENT_MS < SIMON_LIT_MS)
        .then(|| seq.get(slot).copied())
        .flatten()
}

fn render_simon(session: &Session, now: Millis, area: Rect, buf: &mut Buffer) {
    let pressed = session
        .current_inputs()
        .last()
        .filter(|i| now.saturating_sub(i.at) < SIMON_PRESS_FLASH_MS)
        .and_then(|i| match i.response {
            Response::Color(c) => Some(c),
            _ => None,
        });
    let lit = simon_playback(session, now).or(pressed);

    render_grid(area, 2, buf, |cell| {
        let Some(color) = SimonColor::from_index(cell) else {
            return (Style::default(), Style::default());
        };
        let fill = if lit == Some(color) {
            Style::default().bg(simon_color(color))
        } else {
            Style::default()
        };
        (fill, Style::default().fg(simon_color(color)))
    });

    if session.state() == SessionState::Evaluating {
        centered("Wrong! Watch again...", bold().fg(Color::Red)).render(middle(area, 1), buf);
    }
}

const DIGIT_FONT: [[&str; 5]; 10] = [
    ["###", "#.#", "#.#", "#.#", "###"],
    [".#.", "##.", ".#.", ".#.", "###"],
    ["###", "..#", "###", "#..", "###"],
    ["###", "..#", "###", "..#", "###"],
    ["#.#", "#.#", "###", "..#", "..#"],
    ["###", "#..", "###", "..#", "###"],
    ["###", "#..", "###", "#.#", "###"],
    ["###", "..#", "..#", "..#", "..#"],
    ["###", "#.#", "###", "#.#", "###"],
    ["###", "#.#", "###", "..#", "###"],
];

/// Dot pattern of a plate: the answer's digits in warm dots on a field of
/// green ones, each dot's shade picked from the plate index and position
pub fn plate_lines(plate: &Plate) -> Vec<Line<'static>> {
    const SCALE: usize = 2;
    let digits: Vec<usize> = plate
        .answer
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| d as usize)
        .collect();
    let width = 2 + digits.len() * 4 * SCALE;
    let height = 2 + 5 * SCALE;

    let is_ink = |x: usize, y: usize| -> bool {
        if x < 1 || y < 1 || y >= 1 + 5 * SCALE {
            return false;
        }
        let (gx, gy) = ((x - 1) / SCALE, (y - 1) / SCALE);
        let (digit, col) = (gx / 4, gx % 4);
        col < 3
            && digits
                .get(digit)
                .is_some_and(|&d| DIGIT_FONT[d][gy].as_bytes()[col] == b'#')
    };

    (0..height)
        .map(|y| {
            let spans: Vec<Span> = (0..width)
                .map(|x| {
                    let shade = (plate.index * 31 + x * 7 + y * 13) % 3;
                    let color = match (is_ink(x, y), shade) {
                        (true, 0) => Color::Rgb(230, 120, 40),
                        (true, 1) => Color::Rgb(210, 80, 50),
                        (true, _) => Color::Rgb(240, 160, 60),
                        (false, 0) => Color::Rgb(110, 160, 70),
                        (false, 1) => Color::Rgb(140, 170, 80),
                        (false, _) => Color::Rgb(90, 140, 90),
                    };
                    Span::styled("● ", Style::default().fg(color))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn render_colorblind(app: &App, session: &Session, area: Rect, buf: &mut Buffer) {
    let Some(Stimulus::Plate(plate)) = session.current_stimulus() else {
        return;
    };
    let mut lines = plate_lines(plate);
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::raw("What number do you see? "),
        Span::styled(format!("{}_", app.entry), bold()),
    ]));
    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(middle(area, height), buf);
}

fn render_visual_memory(app: &App, session: &Session, area: Rect, buf: &mut Buffer) {
    let state = session.state();
    let (grid_size, shown): (usize, BTreeSet<usize>) = match (state, session.current_stimulus()) {
        (_, Some(Stimulus::Cells { grid_size, cells })) => (*grid_size, cells.clone()),
        _ => match session.trials().last().map(|t| &t.stimulus) {
            Some(Stimulus::Cells { grid_size, cells }) => (*grid_size, cells.clone()),
            _ => return,
        },
    };

    render_grid(area, grid_size, buf, |cell| {
        let fill = match state {
            SessionState::Priming if shown.contains(&cell) => Style::default().bg(Color::White),
            SessionState::Evaluating if shown.contains(&cell) => Style::default().bg(Color::Red),
            SessionState::Active if app.selection.contains(&cell) => Style::default().bg(Color::Cyan),
            _ => Style::default(),
        };
        let border = if state == SessionState::Active && cell == app.cursor {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        (fill, border)
    });
}

fn render_typing(session: &Session, now: Millis, area: Rect, buf: &mut Buffer) {
    let Some(Stimulus::Passage(passage)) = session.current_stimulus() else {
        return;
    };
    let typed: Vec<char> = session
        .current_inputs()
        .iter()
        .filter_map(|i| match i.response {
            Response::Key(c) => Some(c),
            _ => None,
        })
        .collect();

    let green_bold = bold().fg(Color::Green);
    let red_bold = bold().fg(Color::Red);
    let dim_bold = bold().add_modifier(Modifier::DIM);

    let mut spans: Vec<Span> = passage
        .chars()
        .zip(typed.iter())
        .map(|(expected, &got)| {
            if expected == got {
                Span::styled(expected.to_string(), green_bold)
            } else {
                Span::styled(
                    match got {
                        ' ' => "·".to_owned(),
                        c => c.to_string(),
                    },
                    red_bold,
                )
            }
        })
        .collect();
    let mut rest = passage.chars().skip(typed.len());
    if let Some(cursor) = rest.next() {
        spans.push(Span::styled(
            cursor.to_string(),
            dim_bold.add_modifier(Modifier::UNDERLINED),
        ));
    }
    spans.push(Span::styled(rest.collect::<String>(), dim_bold));

    let elapsed = session
        .presented_at()
        .map_or(0, |at| now.saturating_sub(at));
    let stats = format!(
        "{} wpm   {} errors",
        live_wpm(passage, &typed, elapsed),
        typing_errors(passage, &typed)
    );

    let prompt_lines = passage_lines(passage, area.width);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(area.height.saturating_sub(prompt_lines + 2) / 2),
            Constraint::Min(prompt_lines),
        ])
        .split(area);
    centered(stats, dim_bold).render(chunks[0], buf);
    Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);
}

/// Terminal rows the passage needs when wrapped to `width` columns
pub fn passage_lines(passage: &str, width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let cols = passage.width();
    if cols <= width as usize {
        return 1;
    }
    (cols as f64 / width as f64).ceil() as u16 + 1
}

fn render_number_memory(app: &App, session: &Session, area: Rect, buf: &mut Buffer) {
    let (text, style) = match (session.state(), session.current_stimulus()) {
        (SessionState::Priming, Some(Stimulus::Digits(digits))) => {
            (digits.clone(), bold().fg(Color::Cyan))
        }
        (SessionState::Active, _) => (format!("What was the number? {}_", app.entry), bold()),
        (SessionState::Evaluating, _) => match session.trials().last().map(|t| &t.stimulus) {
            Some(Stimulus::Digits(digits)) => (format!("Wrong! It was {digits}"), bold().fg(Color::Red)),
            _ => (String::new(), bold()),
        },
        _ => (String::new(), bold()),
    };
    centered(text, style).render(middle(area, 1), buf);
}

fn render_precision(session: &Session, area: Rect, buf: &mut Buffer) {
    let track: Option<DualBallTrack> = match session.current_stimulus() {
        Some(Stimulus::Orbit(track)) => Some(track.clone()),
        _ => None,
    };
    let Some(track) = track else {
        if session.state() == SessionState::Evaluating {
            centered("Missed! Try again...", bold().fg(Color::Red)).render(middle(area, 1), buf);
        }
        return;
    };

    Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, CANVAS_SIZE])
        .y_bounds([0.0, CANVAS_SIZE])
        .paint(|ctx| {
            let inside = track.both_inside();
            ctx.draw(&Circle {
                x: CANVAS_CENTER,
                y: CANVAS_CENTER,
                radius: track.target_radius,
                color: if inside { Color::Green } else { Color::White },
            });
            for (ball, color) in [(&track.horizontal, Color::Red), (&track.vertical, Color::Blue)] {
                ctx.draw(&Circle {
                    x: ball.x,
                    y: CANVAS_SIZE - ball.y,
                    radius: BALL_RADIUS,
                    color,
                });
            }
        })
        .render(area, buf);
}
