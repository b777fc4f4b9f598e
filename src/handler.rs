use color_eyre::Result;

use crate::{app::App, ui::UI};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Handles the key events and updates the state of [`App`].
pub fn handle_key_events(key_event: KeyEvent, app: &mut App, ui: &mut UI) -> Result<bool> {
    // Exit application on `Ctrl-C`, even while the login dialog is open
    if key_event.modifiers == KeyModifiers::CONTROL
        && matches!(key_event.code, KeyCode::Char('c') | KeyCode::Char('C'))
    {
        app.quit();
        return Ok(true);
    }

    if app.login.is_some() {
        return handle_login_keys(key_event, app);
    }

    let mut processed = true;

    match key_event.code {
        // Exit application on `ESC` or `q`
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
            app.quit();
        }
        // Force refresh of job list
        KeyCode::Char('r') | KeyCode::Char('R') => app.refresh(),
        // Toggle automatic refreshes
        KeyCode::Char('a') | KeyCode::Char('A') => app.toggle_auto_refresh(),
        // Refresh interval
        KeyCode::Char('+') | KeyCode::Char('i') | KeyCode::Char('I') => app.cycle_interval(1),
        KeyCode::Char('-') => app.cycle_interval(-1),
        // Session
        KeyCode::Char('l') | KeyCode::Char('L') => app.open_login(),
        KeyCode::Char('o') | KeyCode::Char('O') => app.logout(),
        // Scrolling
        KeyCode::Home => ui.scroll(isize::MIN),
        KeyCode::PageUp => ui.scroll(-10),
        KeyCode::Up => ui.scroll(-1),
        KeyCode::Down => ui.scroll(1),
        KeyCode::PageDown => ui.scroll(10),
        KeyCode::End => ui.scroll(isize::MAX),
        // Sorting
        KeyCode::Left => ui.set_sort_column(-1),
        KeyCode::Right => ui.set_sort_column(1),
        KeyCode::Char('s') | KeyCode::Char('S') => {
            ui.toggle_sort_order();
        }
        _ => processed = false,
    }

    Ok(processed)
}

fn handle_login_keys(key_event: KeyEvent, app: &mut App) -> Result<bool> {
    match key_event.code {
        KeyCode::Esc => app.cancel_login(),
        KeyCode::Enter => app.submit_login(),
        _ => {
            let Some(form) = &mut app.login else {
                return Ok(false);
            };

            match key_event.code {
                KeyCode::Tab | KeyCode::Down => form.next_field(),
                KeyCode::BackTab | KeyCode::Up => form.prev_field(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(c) => form.input(c),
                _ => return Ok(false),
            }
        }
    }

    Ok(true)
}

pub fn handle_mouse_events(event: MouseEvent, app: &App, ui: &mut UI) -> Result<bool> {
    if app.login.is_some() {
        return Ok(false);
    }

    let processed = match event.kind {
        MouseEventKind::Down(MouseButton::Left) => ui.mouse_click(event.row),
        MouseEventKind::ScrollUp => ui.mouse_wheel(event.row, -1),
        MouseEventKind::ScrollDown => ui.mouse_wheel(event.row, 1),
        _ => false,
    };

    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::args::Args;
    use crate::config::DEFAULT_PORT;
    use crate::poller::Poller;
    use crate::session::offline::OfflineConnector;
    use crate::widgets::Field;
    use crate::worker::Worker;

    fn app() -> App {
        let args = Args {
            test: false,
            interval: 30,
            manual: false,
            host: None,
            user: None,
            port: DEFAULT_PORT,
            timeout: 5,
            config: None,
            log: None,
            version: false,
        };

        let poller = Poller::new(Box::new(OfflineConnector), Duration::from_secs(5));
        let worker = Worker::spawn(poller, None, false, |_| {});
        App::new(args, worker, None)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_login_dialog_captures_keys() {
        let mut app = app();
        let mut ui = UI::new(&app);
        assert_eq!(app.login.as_ref().unwrap().focus, Field::Username);

        for c in "qa".chars() {
            handle_key_events(key(KeyCode::Char(c)), &mut app, &mut ui).unwrap();
        }

        assert!(app.running);
        assert_eq!(app.login.as_ref().unwrap().username, "qa");

        handle_key_events(key(KeyCode::Tab), &mut app, &mut ui).unwrap();
        assert_eq!(app.login.as_ref().unwrap().focus, Field::Password);

        handle_key_events(key(KeyCode::Esc), &mut app, &mut ui).unwrap();
        assert!(app.login.is_none());
        assert!(app.running);

        handle_key_events(key(KeyCode::Char('q')), &mut app, &mut ui).unwrap();
        assert!(!app.running);
    }

    #[test]
    fn test_ctrl_c_quits_from_dialog() {
        let mut app = app();
        let mut ui = UI::new(&app);

        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(handle_key_events(event, &mut app, &mut ui).unwrap());
        assert!(!app.running);
    }

    #[test]
    fn test_unhandled_keys() {
        let mut app = app();
        let mut ui = UI::new(&app);
        app.cancel_login();

        assert!(!handle_key_events(key(KeyCode::Char('z')), &mut app, &mut ui).unwrap());
        assert!(handle_key_events(key(KeyCode::Char('l')), &mut app, &mut ui).unwrap());
        assert!(app.login.is_some());
    }
}
