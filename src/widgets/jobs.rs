use std::{cmp::Ordering, fmt, rc::Rc};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Stylize,
    symbols::border,
    text::Text,
    widgets::{Block, Borders, StatefulWidgetRef, TableState, Widget},
};

use crate::slurm::JobRecord;

use super::{
    misc::{center_layout, right_align_text, scroll, status_color},
    table::{GenericTable, GenericTableState, SortOrder},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    JobID,
    Name,
    State,
    Time,
    Nodes,
    CPUs,
    Memory,
}

impl Column {
    const ALL: [Column; 7] = [
        Column::JobID,
        Column::Name,
        Column::State,
        Column::Time,
        Column::Nodes,
        Column::CPUs,
        Column::Memory,
    ];

    fn compare(self, a: &JobRecord, b: &JobRecord) -> Ordering {
        match self {
            Column::JobID => (a.id.parse::<u64>().ok(), &a.id).cmp(&(b.id.parse().ok(), &b.id)),
            Column::Name => a.name.cmp(&b.name),
            Column::State => a.state.cmp(&b.state),
            Column::Time => a.elapsed().cmp(&b.elapsed()),
            Column::Nodes => a.nodes.cmp(&b.nodes),
            Column::CPUs => a.cpus.cmp(&b.cpus),
            Column::Memory => a
                .memory_mb()
                .partial_cmp(&b.memory_mb())
                .unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Column::JobID => "JOBID",
            Column::Name => "NAME",
            Column::State => "STATE",
            Column::Time => "TIME",
            Column::Nodes => "NODES",
            Column::CPUs => "CPUS",
            Column::Memory => "MEMORY",
        };

        f.write_str(label)
    }
}

#[derive(Debug)]
pub struct JobTableState {
    table: TableState,
    /// Jobs in the order reported by `squeue`
    received: Rc<Vec<JobRecord>>,
    /// Jobs in display order
    jobs: Vec<JobRecord>,
    columns: Vec<Column>,
    sort_column: Option<Column>,
    sort_order: SortOrder,
    /// Shown instead of the table when there are no jobs
    placeholder: String,
}

impl JobTableState {
    pub fn update(&mut self, jobs: Rc<Vec<JobRecord>>) {
        self.received = jobs;
        self.sort();

        // Update/clear job selection depending on the new contents
        self.scroll(0);
    }

    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    pub fn jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    pub fn scroll(&mut self, delta: isize) {
        scroll(&mut self.table, self.jobs.len(), delta);
    }

    /// Selects the row at `row` lines below the header
    pub fn click(&mut self, row: usize) {
        if row > 0 && !self.jobs.is_empty() {
            let idx = self.table.offset().saturating_add(row - 1);
            self.table.select(Some(idx.min(self.jobs.len() - 1)));
        }
    }

    /// Cycles through columns to sort by; one step past the last column
    /// restores the order reported by `squeue`
    pub fn set_sort_column(&mut self, delta: isize) {
        let positions = self.columns.len() as isize + 1;
        let current = self
            .sort_column
            .and_then(|c| self.columns.iter().position(|&v| v == c))
            .map_or(0, |idx| idx as isize + 1);

        let next = (current + delta).rem_euclid(positions);
        self.sort_column = match next {
            0 => None,
            idx => self.columns.get(idx as usize - 1).copied(),
        };

        self.sort();
    }

    pub fn toggle_sort_order(&mut self) {
        self.sort_order = self.sort_order.toggle();
        self.sort();
    }

    fn sort(&mut self) {
        self.jobs.clear();
        self.jobs.extend_from_slice(&self.received);

        if let Some(column) = self.sort_column {
            // Stable sort, so ties keep the order reported by squeue
            self.jobs.sort_by(|a, b| match self.sort_order {
                SortOrder::Ascending => column.compare(a, b),
                SortOrder::Descending => column.compare(b, a),
            });
        }
    }
}

impl Default for JobTableState {
    fn default() -> Self {
        Self {
            table: TableState::default(),
            received: Rc::default(),
            jobs: Vec::default(),
            columns: Column::ALL.to_vec(),
            sort_column: None,
            sort_order: SortOrder::default(),
            placeholder: "No jobs found".into(),
        }
    }
}

impl GenericTableState<Column> for JobTableState {
    fn focus(&self) -> bool {
        true
    }

    fn nrows(&self) -> usize {
        self.jobs.len()
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn sort_column(&self) -> Option<Column> {
        self.sort_column
    }

    fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    fn selected(&self) -> Option<usize> {
        self.table.selected()
    }

    fn variable_width(&self, column: Column) -> bool {
        matches!(column, Column::Name)
    }

    fn text<'a>(&self, row: usize, column: Column) -> Text<'a> {
        let job = &self.jobs[row];
        let text = match column {
            Column::JobID => job.id.clone().into(),
            Column::Name => job.name.clone().into(),
            Column::State => job.state.clone().into(),
            Column::Time => right_align_text(&job.time),
            Column::Nodes => right_align_text(job.nodes),
            Column::CPUs => right_align_text(job.cpus),
            Column::Memory => right_align_text(&job.memory),
        };

        text.fg(status_color(job.status))
    }

    fn inner_state(&mut self) -> &mut TableState {
        &mut self.table
    }
}

#[derive(Debug, Default)]
pub struct JobTable {}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    // Renders a simple notification that there are no displayable jobs
    fn render_empty_table(label: &str, area: Rect, buf: &mut Buffer) {
        // Size of label + surrounding border
        let width = label.chars().count() as u16 + 2;
        let height = 3;

        if let Some(area) = center_layout(area, width, height) {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_set(border::PLAIN);

            Text::from(label).render(block.inner(area), buf);
            block.render(area, buf);
        } else {
            Text::from(label).render(area, buf);
        }
    }
}

impl StatefulWidgetRef for JobTable {
    type State = JobTableState;

    fn render_ref(&self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        if state.jobs.is_empty() {
            Self::render_empty_table(&state.placeholder, area, buf)
        } else {
            let table = GenericTable::<Column, JobTableState>::new();

            table.render_ref(area, buf, state);
        }
    }
}
