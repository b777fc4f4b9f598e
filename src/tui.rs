use std::error::Error;
use std::io;
use std::panic;

use color_eyre::{config::HookBuilder, eyre, Result};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use log::error;
use ratatui::backend::Backend;
use ratatui::Terminal;

use crate::app::App;
use crate::event::EventHandler;
use crate::ui::UI;

/// The terminal plus the queue of events that drive redraws.
///
/// While active, the terminal is in raw mode on the alternate screen with
/// mouse capture enabled. It is put back when [`Tui::exit`] is called, when
/// the `Tui` is dropped, and before panics or errors are reported.
#[derive(Debug)]
pub struct Tui<B: Backend>
where
    <B as Backend>::Error: 'static,
{
    terminal: Terminal<B>,
    pub events: EventHandler,
    /// Has the terminal been switched away from its normal mode?
    active: bool,
}

impl<B: Backend> Tui<B>
where
    <B as Backend>::Error: 'static,
{
    pub fn new(terminal: Terminal<B>, events: EventHandler) -> Self {
        Self {
            terminal,
            events,
            active: false,
        }
    }

    pub fn init(&mut self) -> Result<(), Box<dyn Error>> {
        install_hooks()?;

        terminal::enable_raw_mode()?;
        self.active = true;
        crossterm::execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;

        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn draw(&mut self, app: &App, ui: &mut UI) -> Result<(), Box<dyn Error>> {
        self.terminal
            .draw(|frame| ui.render(app, frame.area(), frame.buffer_mut()))?;

        Ok(())
    }

    pub fn exit(&mut self) -> Result<(), Box<dyn Error>> {
        if self.active {
            self.active = false;
            restore()?;
            self.terminal.show_cursor()?;
        }

        Ok(())
    }
}

impl<B: Backend> Drop for Tui<B>
where
    <B as Backend>::Error: 'static,
{
    fn drop(&mut self) {
        if self.active {
            restore_or_log();
            let _ = self.terminal.show_cursor();
        }
    }
}

/// Chains terminal restoration in front of color-eyre's panic and error reports
fn install_hooks() -> Result<()> {
    let (panic_hook, eyre_hook) = HookBuilder::default().into_hooks();

    let panic_hook = panic_hook.into_panic_hook();
    panic::set_hook(Box::new(move |info| {
        restore_or_log();
        panic_hook(info);
    }));

    let eyre_hook = eyre_hook.into_eyre_hook();
    eyre::set_hook(Box::new(move |err: &(dyn Error + 'static)| {
        restore_or_log();
        eyre_hook(err)
    }))?;

    Ok(())
}

fn restore() -> io::Result<()> {
    terminal::disable_raw_mode()?;
    crossterm::execute!(io::stderr(), LeaveAlternateScreen, DisableMouseCapture)
}

fn restore_or_log() {
    if let Err(err) = restore() {
        error!("failed to reset the terminal: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use ratatui::backend::TestBackend;

    use crate::args::Args;
    use crate::config::DEFAULT_PORT;
    use crate::poller::Poller;
    use crate::session::offline::OfflineConnector;
    use crate::worker::Worker;

    #[test]
    fn test_draw_without_init() {
        let args = Args {
            test: true,
            interval: 30,
            manual: false,
            host: None,
            user: Some("demo".into()),
            port: DEFAULT_PORT,
            timeout: 5,
            config: None,
            log: None,
            version: false,
        };

        let poller = Poller::new(Box::new(OfflineConnector), Duration::from_secs(5));
        let worker = Worker::spawn(poller, None, false, |_| {});
        let app = App::new(args, worker, None);
        let mut ui = UI::new(&app);

        let terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        let mut tui = Tui::new(terminal, EventHandler::new(250));
        tui.draw(&app, &mut ui).unwrap();

        let contents: String = tui
            .terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(contents.contains("slurmwatch"));
        assert!(contents.contains("demo@offline"));

        // Never switched to raw mode, so there is nothing to restore
        tui.exit().unwrap();
        assert!(!tui.active);
    }
}
