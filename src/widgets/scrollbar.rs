use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget},
};

/// Thin scrollbar drawn along the right edge of a table
#[derive(Debug, Default)]
pub struct RightScrollbar {
    items: usize,
    header: u16,
    selected: usize,
}

impl RightScrollbar {
    pub fn items(mut self, items: usize) -> Self {
        self.items = items;
        self
    }

    /// Number of header rows the scrollbar should not overlap
    pub fn header(mut self, header: u16) -> Self {
        self.header = header;
        self
    }

    pub fn selected(mut self, idx: Option<usize>) -> Self {
        self.selected = idx.unwrap_or_default();
        self
    }

    /// Renders the scrollbar and returns the area left for the table
    pub fn render(self, area: Rect, buf: &mut Buffer) -> Rect {
        let [table, bar] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(2)])
            .areas(area);

        let [_, bar] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(self.header), Constraint::Fill(1)])
            .areas(bar);

        let mut state = ScrollbarState::default()
            .content_length(self.items)
            .position(self.selected);

        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None)
            .track_symbol(None)
            .thumb_symbol("▐")
            .render(bar, buf, &mut state);

        table
    }
}
