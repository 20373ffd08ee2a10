pub mod charting;
pub mod layout;
pub mod menu;
pub mod play;
pub mod scoreboard;
pub mod screen;
pub mod summary;

use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use crate::{ui::screen::current_screen, App};

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        current_screen(&self.state).render(self, area, buf);
    }
}
