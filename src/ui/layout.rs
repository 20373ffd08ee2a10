use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub const HORIZONTAL_MARGIN: u16 = 5;
pub const VERTICAL_MARGIN: u16 = 1;

/// Regions of the play screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayLayout {
    /// Game name, level, lives and timer
    pub header: Rect,
    /// Where the stimulus is drawn and clicks are mapped from
    pub arena: Rect,
    pub footer: Rect,
}

/// Split the terminal area into the play screen regions. The same split is
/// used to draw and to map mouse clicks, so the two always agree.
pub fn play_layout(area: Rect) -> PlayLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    PlayLayout {
        header: chunks[0],
        arena: chunks[1],
        footer: chunks[2],
    }
}
