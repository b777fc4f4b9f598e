use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, StatefulWidgetRef, Widget},
};

use crate::config::{Credentials, DEFAULT_PORT};

use super::misc::center_layout;

const LABEL_WIDTH: usize = 10;
const DIALOG_WIDTH: u16 = 50;
const DIALOG_HEIGHT: u16 = 11;

/// Input fields of the login form, in tab order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Field {
    #[default]
    Username,
    Password,
    Hostname,
    Remember,
}

impl Field {
    const ORDER: [Field; 4] = [
        Field::Username,
        Field::Password,
        Field::Hostname,
        Field::Remember,
    ];

    fn offset(self, delta: isize) -> Field {
        let idx = Self::ORDER.iter().position(|&f| f == self).unwrap_or(0) as isize;
        let len = Self::ORDER.len() as isize;

        Self::ORDER[(idx + delta).rem_euclid(len) as usize]
    }
}

/// Contents of the login form
#[derive(Clone, Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Host name, optionally followed by `:port`
    pub hostname: String,
    pub remember: bool,
    pub focus: Field,
    /// Reason the previous attempt failed
    pub error: Option<String>,
}

impl LoginForm {
    /// Creates a form pre-filled from `credentials`; the password is never pre-filled
    pub fn new(credentials: &Credentials) -> Self {
        let hostname = if credentials.port == DEFAULT_PORT || credentials.hostname.is_empty() {
            credentials.hostname.clone()
        } else if credentials.hostname.contains(':') {
            format!("[{}]:{}", credentials.hostname, credentials.port)
        } else {
            format!("{}:{}", credentials.hostname, credentials.port)
        };

        let focus = if credentials.username.is_empty() {
            Field::Username
        } else if credentials.hostname.is_empty() {
            Field::Hostname
        } else {
            Field::Password
        };

        Self {
            username: credentials.username.clone(),
            password: String::new(),
            hostname,
            remember: credentials.remember,
            focus,
            error: None,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.offset(1);
    }

    pub fn prev_field(&mut self) {
        self.focus = self.focus.offset(-1);
    }

    pub fn input(&mut self, c: char) {
        match self.focus {
            Field::Username => self.username.push(c),
            Field::Password => self.password.push(c),
            Field::Hostname => self.hostname.push(c),
            Field::Remember => {
                if c == ' ' {
                    self.toggle_remember()
                }
            }
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            Field::Username => self.username.pop(),
            Field::Password => self.password.pop(),
            Field::Hostname => self.hostname.pop(),
            Field::Remember => None,
        };
    }

    pub fn toggle_remember(&mut self) {
        self.remember = !self.remember;
    }

    /// Validates the form, returning the credentials to log in with
    pub fn credentials(&self) -> Result<Credentials, String> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err("Username is required".into());
        }

        let (hostname, port) = split_port(self.hostname.trim())?;
        if hostname.is_empty() {
            return Err("Hostname is required".into());
        }

        Ok(Credentials {
            username: username.to_string(),
            hostname: hostname.to_string(),
            port,
            password: (!self.password.is_empty()).then(|| self.password.clone()),
            remember: self.remember,
        })
    }

    fn field_line(&self, field: Field, width: usize) -> Line<'static> {
        let (label, value) = match field {
            Field::Username => ("Username", self.username.clone()),
            Field::Password => ("Password", "•".repeat(self.password.chars().count())),
            Field::Hostname => ("Hostname", self.hostname.clone()),
            Field::Remember => {
                let mark = if self.remember { "x" } else { " " };
                let span = Span::raw(format!("[{}] Remember login", mark));
                let span = if self.focus == field {
                    span.reversed()
                } else {
                    span
                };

                return Line::from(span);
            }
        };

        // Show the end of values that are too long to fit
        let width = width.saturating_sub(LABEL_WIDTH + 1);
        let skip = value.chars().count().saturating_sub(width);
        let value: String = value.chars().skip(skip).collect();

        let input = if self.focus == field {
            Span::styled(format!("{:<width$}", value), Style::default().reversed())
        } else {
            Span::styled(format!("{:<width$}", value), Style::default().underlined())
        };

        Line::from(vec![
            Span::raw(format!("{:<w$}", label, w = LABEL_WIDTH)).bold(),
            input,
        ])
    }
}

/// Splits `host:port`, `[ipv6]:port` or a bare host / IPv6 address
fn split_port(value: &str) -> Result<(&str, u16), String> {
    let parse_port = |port: &str| match port.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(format!("Invalid port {:?}", port)),
    };

    if let Some(rest) = value.strip_prefix('[') {
        let Some((host, rest)) = rest.split_once(']') else {
            return Err(format!("Invalid address {:?}", value));
        };

        return match rest {
            "" => Ok((host, DEFAULT_PORT)),
            _ => match rest.strip_prefix(':') {
                Some(port) => Ok((host, parse_port(port)?)),
                None => Err(format!("Invalid address {:?}", value)),
            },
        };
    }

    match value.split_once(':') {
        // More than one colon: an IPv6 address without a port
        Some((_, rest)) if rest.contains(':') => Ok((value, DEFAULT_PORT)),
        Some((host, port)) => Ok((host, parse_port(port)?)),
        None => Ok((value, DEFAULT_PORT)),
    }
}

/// Modal dialog rendering a [`LoginForm`]
#[derive(Debug, Default)]
pub struct LoginDialog {}

impl StatefulWidgetRef for LoginDialog {
    type State = LoginForm;

    fn render_ref(&self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let width = DIALOG_WIDTH.min(area.width);
        let height = DIALOG_HEIGHT.min(area.height);
        let Some(area) = center_layout(area, width, height) else {
            return;
        };

        let block = Block::default()
            .title_top(Line::from(" Cluster login ").bold().centered())
            .title_bottom(
                Line::from(vec![
                    " <Tab> ".bold(),
                    "Next".into(),
                    " <Enter> ".bold(),
                    "Login".into(),
                    " <Esc> ".bold(),
                    "Cancel ".into(),
                ])
                .centered(),
            )
            .borders(Borders::ALL)
            .border_set(border::ROUNDED);

        let inner = block.inner(area).inner(ratatui::layout::Margin::new(1, 1));
        let width = inner.width as usize;

        let mut lines: Vec<Line> = [Field::Username, Field::Password, Field::Hostname]
            .into_iter()
            .map(|field| state.field_line(field, width))
            .collect();
        lines.push(Line::default());
        lines.push(state.field_line(Field::Remember, width));

        if let Some(error) = &state.error {
            lines.push(Line::default());
            lines.push(Line::from(error.clone()).fg(Color::LightRed));
        }

        Clear.render(area, buf);
        block.render(area, buf);
        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefill() {
        let form = LoginForm::new(&Credentials::new("", ""));
        assert_eq!(form.focus, Field::Username);

        let mut credentials = Credentials::new("alice", "hpc").password("secret");
        credentials.port = 2222;
        let form = LoginForm::new(&credentials);
        assert_eq!(form.focus, Field::Password);
        assert_eq!(form.hostname, "hpc:2222");
        assert!(form.password.is_empty());
    }

    #[test]
    fn test_editing() {
        let mut form = LoginForm::default();
        for c in "bob".chars() {
            form.input(c);
        }

        form.next_field();
        form.input('p');
        form.input('w');
        form.backspace();

        form.next_field();
        form.input('h');

        form.next_field();
        form.input(' ');
        form.input('x');

        assert_eq!(form.username, "bob");
        assert_eq!(form.password, "p");
        assert_eq!(form.hostname, "h");
        assert!(form.remember);

        form.next_field();
        assert_eq!(form.focus, Field::Username);
        form.prev_field();
        assert_eq!(form.focus, Field::Remember);
    }

    #[test]
    fn test_credentials() {
        let form = LoginForm {
            username: " alice ".into(),
            password: "secret".into(),
            hostname: "login.hpc.example.org:2222".into(),
            remember: true,
            ..Default::default()
        };

        let credentials = form.credentials().unwrap();
        assert_eq!(credentials.username, "alice");
        assert_eq!(credentials.hostname, "login.hpc.example.org");
        assert_eq!(credentials.port, 2222);
        assert_eq!(credentials.password.as_deref(), Some("secret"));
        assert!(credentials.remember);
    }

    #[test]
    fn test_invalid_credentials() {
        let form = |username: &str, hostname: &str| LoginForm {
            username: username.into(),
            hostname: hostname.into(),
            ..Default::default()
        };

        assert!(form("", "hpc").credentials().is_err());
        assert!(form("alice", "").credentials().is_err());
        assert!(form("alice", "hpc:ssh").credentials().is_err());
        assert!(form("alice", "hpc:0").credentials().is_err());
        assert_eq!(form("alice", "hpc").credentials().unwrap().password, None);
    }

    #[test]
    fn test_ipv6_hostnames() {
        let host = |hostname: &str| {
            let form = LoginForm {
                username: "alice".into(),
                hostname: hostname.into(),
                ..Default::default()
            };

            form.credentials().map(|c| (c.hostname, c.port))
        };

        assert_eq!(host("fe80::1"), Ok(("fe80::1".into(), DEFAULT_PORT)));
        assert_eq!(host("[fe80::1]"), Ok(("fe80::1".into(), DEFAULT_PORT)));
        assert_eq!(host("[fe80::1]:2222"), Ok(("fe80::1".into(), 2222)));
        assert_eq!(host("10.0.0.1:2222"), Ok(("10.0.0.1".into(), 2222)));
        assert!(host("[fe80::1").is_err());
        assert!(host("[fe80::1]2222").is_err());
        assert!(host("[]:22").is_err());

        let mut credentials = Credentials::new("alice", "fe80::1");
        credentials.port = 2222;
        let form = LoginForm::new(&credentials);
        assert_eq!(form.hostname, "[fe80::1]:2222");
        assert_eq!(form.credentials().unwrap().hostname, "fe80::1");
    }

    #[test]
    fn test_render_masks_password() {
        let mut form = LoginForm {
            username: "alice".into(),
            password: "hunter2".into(),
            hostname: "hpc".into(),
            ..Default::default()
        };

        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        LoginDialog::default().render_ref(area, &mut buf, &mut form);

        let contents: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(contents.contains("alice"));
        assert!(contents.contains("•••••••"));
        assert!(!contents.contains("hunter2"));
    }
}
