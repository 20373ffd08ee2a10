use ratatui::{buffer::Buffer, layout::Rect};

use crate::ui::{
    menu::{render_consent, render_menu},
    play::render_play,
    scoreboard::render_scoreboard,
    summary::render_summary,
};
use crate::{App, AppState};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

pub struct ConsentScreen;

impl Screen for ConsentScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_consent(app, area, buf);
    }
}

pub struct MenuScreen;

impl Screen for MenuScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_menu(app, area, buf);
    }
}

/// Play screen - header, stimulus arena and controls of the running game
pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_play(app, area, buf);
    }
}

pub struct SummaryScreen;

impl Screen for SummaryScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_summary(app, area, buf);
    }
}

pub struct ScoreboardScreen;

impl Screen for ScoreboardScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_scoreboard(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Consent => Box::new(ConsentScreen),
        AppState::Menu => Box::new(MenuScreen),
        AppState::Playing => Box::new(PlayScreen),
        AppState::Summary => Box::new(SummaryScreen),
        AppState::Scoreboard => Box::new(ScoreboardScreen),
    }
}
