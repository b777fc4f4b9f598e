use std::{fmt::Display, marker::PhantomData};

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::Stylize,
    text::Text,
    widgets::{Row, StatefulWidget, StatefulWidgetRef, Table, TableState},
};

use super::{misc::COLUMN_SPACING, RightScrollbar};

/// User selected sort order of columns
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggle(self) -> SortOrder {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    fn marker(self) -> &'static str {
        match self {
            SortOrder::Ascending => " ▲",
            SortOrder::Descending => " ▼",
        }
    }
}

/// Rows and columns displayed by a [`GenericTable`]
pub trait GenericTableState<C>
where
    C: Copy + Display + PartialEq + Sized,
{
    fn focus(&self) -> bool;

    fn nrows(&self) -> usize;

    fn columns(&self) -> &[C];

    /// Column the rows are sorted by, if any
    fn sort_column(&self) -> Option<C>;

    fn sort_order(&self) -> SortOrder;

    /// Returns the (styled) text for a given row and column
    fn text<'a>(&self, row: usize, column: C) -> Text<'a>;

    /// Returns true if a column should grow to consume available space
    fn variable_width(&self, column: C) -> bool;

    /// Returns TableState object used by the actual table
    fn inner_state(&mut self) -> &mut TableState;

    /// Returns the currently selected item
    fn selected(&self) -> Option<usize>;
}

/// Table with a header, a scrollbar, and columns sized to fit their contents
#[derive(Debug, Default)]
pub struct GenericTable<C, S>
where
    C: Copy + Display + PartialEq + Sized,
    S: GenericTableState<C>,
{
    c: PhantomData<C>,
    s: PhantomData<S>,
}

impl<C, S> GenericTable<C, S>
where
    C: Copy + Display + PartialEq + Sized,
    S: GenericTableState<C>,
{
    pub fn new() -> Self {
        Self {
            c: PhantomData,
            s: PhantomData,
        }
    }

    fn header(state: &S, column: C) -> String {
        let mut label = column.to_string();
        if state.sort_column() == Some(column) {
            label.push_str(state.sort_order().marker());
        }

        label
    }

    /// Width of the widest cell in a fixed-width column
    fn width(state: &S, column: C) -> Option<u16> {
        if state.variable_width(column) {
            return None;
        }

        let header = Self::header(state, column).chars().count();
        let width = (0..state.nrows())
            .map(|row| state.text(row, column).width())
            .fold(header, usize::max);

        Some(width.min(u16::MAX as usize) as u16)
    }

    fn constraints(state: &S, area: Rect) -> Vec<Constraint> {
        let widths = state
            .columns()
            .iter()
            .map(|&c| Self::width(state, c))
            .collect::<Vec<_>>();

        let variable_columns = widths.iter().filter(|v| v.is_none()).count() as u16;
        let fixed_width = widths.iter().flatten().sum::<u16>()
            + (widths.len().saturating_sub(1)) as u16 * COLUMN_SPACING;
        let shared_width = area.width.saturating_sub(fixed_width) / variable_columns.max(1);

        widths
            .into_iter()
            .map(|v| Constraint::Length(v.unwrap_or(shared_width)))
            .collect()
    }
}

impl<C, S> StatefulWidgetRef for GenericTable<C, S>
where
    C: Copy + Display + PartialEq + Sized,
    S: GenericTableState<C>,
{
    type State = S;

    fn render_ref(&self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let area = RightScrollbar::default()
            .header(1)
            .items(state.nrows())
            .selected(state.selected())
            .render(area, buf);

        let constraints = Self::constraints(state, area);

        let mut rows = Vec::with_capacity(state.nrows());
        for idx in 0..state.nrows() {
            let mut row = Row::new(state.columns().iter().map(|&c| state.text(idx, c)));

            // Reversing the row rather than using Table::highlight_style keeps the per-cell colours
            if state.selected() == Some(idx) && state.focus() {
                row = row.reversed();
            }

            rows.push(row);
        }

        let header = Row::new(
            state
                .columns()
                .iter()
                .map(|&c| Self::header(state, c))
                .collect::<Vec<_>>(),
        )
        .bold();

        let table = Table::new(rows, constraints)
            .column_spacing(COLUMN_SPACING)
            .header(header);

        table.render(area, buf, state.inner_state());
    }
}
