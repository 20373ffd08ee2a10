//! Terminal host state: menu, consent prompt, play, summary and scoreboard.
//! Input arrives as crossterm events stamped with the host clock and is
//! translated into session responses here.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::config::Config;
use crate::consent::ConsentPreferences;
use crate::game::GameKind;
use crate::history::{self, SessionLog};
use crate::score_store::{SaveOutcome, ScoreStore};
use crate::session::{Session, SessionState};
use crate::stimulus::{Response, SimonColor, Stimulus, CANVAS_SIZE};
use crate::timers::Millis;
use crate::ui::layout::play_layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Consent,
    Menu,
    Playing,
    Summary,
    Scoreboard,
}

#[derive(Debug)]
pub struct App {
    pub state: AppState,
    pub config: Config,
    pub store: ScoreStore,
    pub log: Option<SessionLog>,
    pub session: Option<Session>,
    pub menu_index: usize,
    /// Last known terminal area, used to map mouse clicks onto the arena
    pub viewport: Rect,
    /// Text typed for recall games before it is submitted
    pub entry: String,
    /// Visual memory grid selection and keyboard cursor
    pub selection: BTreeSet<usize>,
    pub cursor: usize,
    pub now: Millis,
    pub last_score: Option<u64>,
    pub previous_best: Option<u64>,
    pub last_save: Option<SaveOutcome>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, store: ScoreStore, log: Option<SessionLog>) -> Self {
        let state = if store.consent().is_none() {
            AppState::Consent
        } else {
            AppState::Menu
        };
        Self {
            state,
            config,
            store,
            log,
            session: None,
            menu_index: 0,
            viewport: Rect::new(0, 0, 80, 24),
            entry: String::new(),
            selection: BTreeSet::new(),
            cursor: 0,
            now: 0,
            last_score: None,
            previous_best: None,
            last_save: None,
            should_quit: false,
        }
    }

    pub fn selected_game(&self) -> GameKind {
        GameKind::ALL[self.menu_index.min(GameKind::ALL.len() - 1)]
    }

    pub fn start_game(&mut self, kind: GameKind, now: Millis) {
        self.now = now;
        let mut session = Session::new(kind);
        let cfg = self.config.game_config(kind);
        if let Err(e) = session.start(cfg, now) {
            warn!(game = %kind, "cannot start session: {e}");
            self.state = AppState::Menu;
            return;
        }
        self.clear_inputs();
        self.last_score = None;
        self.last_save = None;
        self.previous_best = self.store.best(kind);
        self.session = Some(session);
        self.state = AppState::Playing;
    }

    pub fn on_tick(&mut self, now: Millis) {
        self.now = now;
        if let Some(session) = self.session.as_mut() {
            session.frame(now);
        }
        self.check_finished();
    }

    pub fn on_resize(&mut self, area: Rect) {
        self.viewport = area;
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Millis) {
        self.now = now;
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.state {
            AppState::Consent => self.consent_key(key),
            AppState::Menu => self.menu_key(key, now),
            AppState::Playing => self.play_key(key, now),
            AppState::Summary => match key.code {
                KeyCode::Char('r') | KeyCode::Enter => {
                    if let Some(kind) = self.session.as_ref().map(Session::kind) {
                        self.start_game(kind, now);
                    }
                }
                KeyCode::Char('m') | KeyCode::Backspace => self.state = AppState::Menu,
                KeyCode::Char('s') => self.state = AppState::Scoreboard,
                KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
            AppState::Scoreboard => match key.code {
                KeyCode::Char('c') => {
                    if let Err(e) = self.store.clear_all() {
                        warn!("cannot clear scores: {e}");
                    }
                }
                KeyCode::Char('p') => self.state = AppState::Consent,
                KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace | KeyCode::Char('m') => {
                    self.state = AppState::Menu
                }
                _ => {}
            },
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent, now: Millis) {
        self.now = now;
        if self.state != AppState::Playing || mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let Some(kind) = self.session.as_ref().map(Session::kind) else {
            return;
        };
        let arena = play_layout(self.viewport).arena;
        let Some((fx, fy)) = relative_position(arena, mouse.column, mouse.row) else {
            return;
        };

        match kind {
            GameKind::AimTrainer => {
                let size = self.config.game_config(kind).arena;
                self.respond(
                    Response::Point {
                        x: fx * size.width,
                        y: fy * size.height,
                    },
                    now,
                );
            }
            GameKind::PrecisionClick => self.respond(
                Response::Point {
                    x: fx * CANVAS_SIZE,
                    y: fy * CANVAS_SIZE,
                },
                now,
            ),
            GameKind::Reaction | GameKind::NBack => self.respond(Response::Press, now),
            GameKind::Simon => {
                let quadrant = usize::from(fx >= 0.5) + 2 * usize::from(fy >= 0.5);
                if let Some(color) = SimonColor::from_index(quadrant) {
                    self.respond(Response::Color(color), now);
                }
            }
            GameKind::VisualMemory => {
                if let Some(Stimulus::Cells { grid_size, .. }) = self.current_stimulus() {
                    let grid_size = *grid_size;
                    let col = ((fx * grid_size as f64) as usize).min(grid_size - 1);
                    let row = ((fy * grid_size as f64) as usize).min(grid_size - 1);
                    self.cursor = row * grid_size + col;
                    self.toggle_cell(now);
                }
            }
            _ => {}
        }
    }

    fn current_stimulus(&self) -> Option<&Stimulus> {
        self.session.as_ref().and_then(Session::current_stimulus)
    }

    fn clear_inputs(&mut self) {
        self.entry.clear();
        self.selection.clear();
        self.cursor = 0;
    }

    fn consent_key(&mut self, key: KeyEvent) {
        let prefs = match key.code {
            KeyCode::Char('a') | KeyCode::Enter => ConsentPreferences::all(),
            KeyCode::Char('n') => ConsentPreferences::necessary_only(),
            KeyCode::Char('f') => ConsentPreferences::custom(true, false, false),
            KeyCode::Esc => {
                self.state = AppState::Menu;
                return;
            }
            _ => return,
        };
        if let Err(e) = history::apply_consent(&mut self.store, self.log.as_ref(), &prefs) {
            warn!("cannot store consent: {e}");
        }
        self.state = AppState::Menu;
    }

    fn menu_key(&mut self, key: KeyEvent, now: Millis) {
        let count = GameKind::ALL.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.menu_index = (self.menu_index + count - 1) % count,
            KeyCode::Down | KeyCode::Char('j') => self.menu_index = (self.menu_index + 1) % count,
            KeyCode::Enter | KeyCode::Char(' ') => self.start_game(self.selected_game(), now),
            KeyCode::Char(c @ '1'..='9') => {
                self.menu_index = c as usize - '1' as usize;
                self.start_game(self.selected_game(), now);
            }
            KeyCode::Char('s') => self.state = AppState::Scoreboard,
            KeyCode::Char('p') => self.state = AppState::Consent,
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn play_key(&mut self, key: KeyEvent, now: Millis) {
        let Some(kind) = self.session.as_ref().map(Session::kind) else {
            self.state = AppState::Menu;
            return;
        };
        if key.code == KeyCode::Esc {
            if let Some(session) = self.session.as_mut() {
                session.abort(now);
            }
            self.state = AppState::Menu;
            return;
        }

        match (kind, key.code) {
            (
                GameKind::Reaction | GameKind::NBack | GameKind::PrecisionClick,
                KeyCode::Char(' ') | KeyCode::Enter,
            ) => self.respond(Response::Press, now),
            (GameKind::Simon, KeyCode::Char(c)) => {
                let color = match c {
                    '1' | 'r' => Some(SimonColor::Red),
                    '2' | 'b' => Some(SimonColor::Blue),
                    '3' | 'g' => Some(SimonColor::Green),
                    '4' | 'y' => Some(SimonColor::Yellow),
                    _ => None,
                };
                if let Some(color) = color {
                    self.respond(Response::Color(color), now);
                }
            }
            (GameKind::Typing, KeyCode::Char(c)) => self.respond(Response::Key(c), now),
            (GameKind::Typing, KeyCode::Backspace) => self.respond(Response::Backspace, now),
            (GameKind::NumberMemory | GameKind::ColorBlind, KeyCode::Char(c)) if c.is_ascii_digit() => {
                self.entry.push(c)
            }
            (GameKind::NumberMemory | GameKind::ColorBlind, KeyCode::Backspace) => {
                self.entry.pop();
            }
            (GameKind::NumberMemory | GameKind::ColorBlind, KeyCode::Enter) => {
                let text = std::mem::take(&mut self.entry);
                self.respond(Response::Text(text), now);
            }
            (GameKind::ColorBlind, KeyCode::Tab) => {
                self.entry.clear();
                self.respond(Response::Skip, now);
            }
            (GameKind::VisualMemory, code) => self.grid_key(code, now),
            _ => {}
        }
    }

    fn grid_key(&mut self, code: KeyCode, now: Millis) {
        let Some(Stimulus::Cells { grid_size, .. }) = self.current_stimulus() else {
            return;
        };
        let r = *grid_size;
        let (row, col) = (self.cursor / r, self.cursor % r);
        match code {
            KeyCode::Left if col > 0 => self.cursor -= 1,
            KeyCode::Right if col + 1 < r => self.cursor += 1,
            KeyCode::Up if row > 0 => self.cursor -= r,
            KeyCode::Down if row + 1 < r => self.cursor += r,
            KeyCode::Char(' ') => self.toggle_cell(now),
            KeyCode::Enter => self.submit_selection(now),
            _ => {}
        }
    }

    fn toggle_cell(&mut self, now: Millis) {
        if self.session.as_ref().map(Session::state) != Some(SessionState::Active) {
            return;
        }
        if !self.selection.remove(&self.cursor) {
            self.selection.insert(self.cursor);
        }
        let target = match self.current_stimulus() {
            Some(Stimulus::Cells { cells, .. }) => cells.len(),
            _ => return,
        };
        if self.selection.len() == target {
            self.submit_selection(now);
        }
    }

    fn submit_selection(&mut self, now: Millis) {
        let picked = std::mem::take(&mut self.selection);
        self.respond(Response::Cells(picked), now);
    }

    /// Hand a response to the session. Input outside Active is dropped.
    fn respond(&mut self, response: Response, now: Millis) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(e) = session.record_response(response, now) {
            debug!("ignored input: {e}");
        }
        self.check_finished();
    }

    fn check_finished(&mut self) {
        if self.state != AppState::Playing {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !session.is_finished() {
            return;
        }
        if !session.is_completed() {
            self.state = AppState::Menu;
            return;
        }

        let kind = session.kind();
        self.last_score = kind.final_score(session);
        self.last_save = self.last_score.and_then(|value| match self.store.save_score(kind, value) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(game = %kind, "cannot save score: {e}");
                None
            }
        });
        if let Some(log) = &self.log {
            if let Err(e) = history::record_session(log, &self.store, session) {
                warn!("cannot append session history: {e}");
            }
        }
        self.state = AppState::Summary;
    }
}

/// Position of a terminal cell inside `area` as fractions in [0, 1)
pub fn relative_position(area: Rect, column: u16, row: u16) -> Option<(f64, f64)> {
    if area.width == 0
        || area.height == 0
        || column < area.x
        || row < area.y
        || column >= area.x + area.width
        || row >= area.y + area.height
    {
        return None;
    }
    Some((
        (f64::from(column - area.x) + 0.5) / f64::from(area.width),
        (f64::from(row - area.y) + 0.5) / f64::from(area.height),
    ))
}
