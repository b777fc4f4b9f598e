use std::fmt::Display;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Color,
    text::Text,
    widgets::TableState,
};

use crate::slurm::Status;

pub const COLUMN_SPACING: u16 = 2;

/// Moves the selection by `delta` rows, clamped to the available rows
pub fn scroll(state: &mut TableState, items: usize, delta: isize) -> Option<usize> {
    let selection = if items == 0 {
        None
    } else {
        let current = state.selected().unwrap_or_default() as isize;
        Some(current.saturating_add(delta).clamp(0, items as isize - 1) as usize)
    };

    state.select(selection);
    selection
}

/// Right aligns displayable value
pub fn right_align_text<'a, T: Display>(v: T) -> Text<'a> {
    Text::from(v.to_string()).alignment(Alignment::Right)
}

/// Creates a `height`/`width` Rect centered in the specified `area`
pub fn center_layout(area: Rect, width: u16, height: u16) -> Option<Rect> {
    if width > area.width || height > area.height {
        return None;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length((area.height - height) / 2),
            Constraint::Length(height),
        ])
        .split(area);

    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Length((area.width - width) / 2),
            Constraint::Length(width),
        ])
        .split(layout[1]);

    Some(layout[1])
}

/// Colour used for jobs in each status bucket
pub fn status_color(status: Status) -> Color {
    match status {
        Status::Running => Color::Rgb(0x98, 0xd8, 0xa8),
        Status::Pending => Color::Rgb(0xf8, 0xb9, 0x8f),
        Status::Completed => Color::Rgb(0x7a, 0xa2, 0xf7),
        Status::Failed => Color::Rgb(0xf0, 0x8b, 0xa0),
    }
}
