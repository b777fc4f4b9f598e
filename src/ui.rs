use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, StatefulWidgetRef, Widget},
};

use crate::{
    app::{interval_label, App, Connection, Message},
    slurm::Status,
    widgets::{status_color, JobTable, JobTableState, LoginDialog},
};

#[derive(Debug, Default)]
pub struct UI {
    jobs: JobTable,
    job_state: JobTableState,
    /// The last used table area; used to determine mouse-click targets
    table_area: Rect,
    login: LoginDialog,
}

impl UI {
    pub fn new(app: &App) -> Self {
        let mut ui = Self::default();
        ui.update(app);
        ui
    }

    /// Copies the latest job list from `app`
    pub fn update(&mut self, app: &App) {
        let placeholder = match &app.connection {
            Connection::LoggedOut => "Not logged in".to_string(),
            Connection::Connecting(target) => format!("Connecting to {}", target),
            Connection::LoggedIn(_) if app.updated.is_none() => "Loading jobs".to_string(),
            Connection::LoggedIn(_) => match &app.message {
                Some(Message::Error(_)) => "Job list unavailable".to_string(),
                _ => "No jobs found".to_string(),
            },
        };

        self.job_state.set_placeholder(placeholder);
        self.job_state.update(app.jobs.clone());
    }

    pub fn scroll(&mut self, delta: isize) {
        self.job_state.scroll(delta)
    }

    pub fn set_sort_column(&mut self, delta: isize) {
        self.job_state.set_sort_column(delta);
    }

    pub fn toggle_sort_order(&mut self) {
        self.job_state.toggle_sort_order();
    }

    /// Selects the job at screen row `row`; returns false if `row` is outside the table
    pub fn mouse_click(&mut self, row: u16) -> bool {
        match self.table_row(row) {
            Some(row) => {
                self.job_state.click(row as usize);
                true
            }
            None => false,
        }
    }

    pub fn mouse_wheel(&mut self, row: u16, delta: isize) -> bool {
        if self.table_row(row).is_some() {
            self.job_state.scroll(delta);
            true
        } else {
            false
        }
    }

    pub fn render(&mut self, app: &App, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title_top(UI::title(app))
            .title_top(UI::updated(app))
            .title_bottom(UI::instructions(app))
            .borders(Borders::ALL)
            .border_set(border::ROUNDED);

        let [legend, table, summary, message] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(block.inner(area));

        UI::legend(app).render(legend, buf);
        self.jobs.render_ref(table, buf, &mut self.job_state);
        UI::summary(app).render(summary, buf);
        if let Some(line) = UI::message(app) {
            line.render(message, buf);
        }

        block.render(area, buf);
        self.table_area = table;

        if let Some(form) = &app.login {
            let mut form = form.clone();
            self.login.render_ref(area, buf, &mut form);
        }
    }

    /// Row relative to the top of the table, where 0 is the header
    fn table_row(&self, row: u16) -> Option<u16> {
        if !self.table_area.is_empty()
            && row >= self.table_area.y
            && row < self.table_area.bottom()
        {
            Some(row - self.table_area.y)
        } else {
            None
        }
    }

    fn title(app: &App) -> Line<'static> {
        let target = match &app.connection {
            Connection::LoggedOut => String::new(),
            Connection::Connecting(target) | Connection::LoggedIn(target) => target.clone(),
        };

        let mut spans = vec![" slurmwatch ".bold()];
        if !target.is_empty() {
            spans.push(Span::raw(format!("{} ", target)));
        }

        if app.args.test {
            spans.push("[offline] ".fg(Color::Yellow));
        }

        Line::from(spans)
    }

    fn updated(app: &App) -> Line<'static> {
        match app.updated {
            Some(timestamp) => Line::from(format!(" Updated: {} ", timestamp.format("%H:%M:%S"))),
            None => Line::default(),
        }
        .right_aligned()
    }

    fn legend(app: &App) -> Line<'static> {
        let mut spans = Vec::new();
        for status in Status::ALL {
            spans.push("■ ".fg(status_color(status)));
            spans.push(Span::raw(format!("{}  ", status.label())));
        }

        let auto = if app.auto_refresh {
            format!("Auto-refresh: every {}", interval_label(app.interval))
        } else {
            "Auto-refresh: off".to_string()
        };
        spans.push(Span::raw(auto).dim());

        Line::from(spans)
    }

    fn summary(app: &App) -> Line<'static> {
        let mut spans = vec![Span::raw(app.tally.to_string())];
        if app.busy() {
            spans.push(Span::raw(format!(" {}", app.spinner())).fg(Color::Cyan));
        }

        Line::from(spans)
    }

    fn message(app: &App) -> Option<Line<'static>> {
        let line = match app.message.as_ref()? {
            Message::Info(msg) => Line::from(msg.clone()),
            Message::Warning(msg) => Line::from(msg.clone()).fg(Color::Yellow),
            Message::Error(msg) => Line::from(msg.clone()).fg(Color::LightRed),
        };

        Some(line)
    }

    fn instructions(app: &App) -> Line<'static> {
        let session = match app.connection {
            Connection::LoggedOut => vec![" <L> ".bold(), "Login".into()],
            _ => vec![" <O> ".bold(), "Logout".into()],
        };

        let mut spans = vec![
            " <R> ".bold(),
            "Refresh".into(),
            " <A> ".bold(),
            "Auto".into(),
            " <+/-> ".bold(),
            "Interval".into(),
            " <S> ".bold(),
            "Sort order".into(),
        ];
        spans.extend(session);
        spans.extend([" <Q> ".bold(), "Quit ".into()]);

        Line::from(spans).centered()
    }
}
