use log::{info, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};

use slurmwatch::app::App;
use slurmwatch::args::Args;
use slurmwatch::config::ConfigStore;
use slurmwatch::event::{Event, EventHandler};
use slurmwatch::handler::{handle_key_events, handle_mouse_events};
use slurmwatch::logging;
use slurmwatch::poller::Poller;
use slurmwatch::session::offline::OfflineConnector;
use slurmwatch::session::ssh::SshConnector;
use slurmwatch::session::Connector;
use slurmwatch::tui::Tui;
use slurmwatch::ui::UI;
use slurmwatch::worker::Worker;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Args = argh::from_env();
    if args.version {
        println!("slurmwatch v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let store = match &args.config {
        Some(path) => Some(ConfigStore::new(path)),
        None => match ConfigStore::default_path() {
            Ok(path) => Some(ConfigStore::new(path)),
            Err(err) => {
                eprintln!("warning: {}", err);
                None
            }
        },
    };

    let log_dir = store.as_ref().and_then(|s| s.path().parent());
    match logging::init(args.log.as_deref(), log_dir) {
        Ok(Some(path)) => info!("slurmwatch v{} logging to {:?}", env!("CARGO_PKG_VERSION"), path),
        Ok(None) => {}
        Err(err) => eprintln!("warning: could not open log file: {}", err),
    }

    let config = match &store {
        Some(store) => store.load().unwrap_or_else(|err| {
            warn!("{}", err);
            None
        }),
        None => None,
    };

    let connector: Box<dyn Connector> = if args.test {
        info!("running offline with sample data");
        Box::new(OfflineConnector)
    } else {
        Box::new(SshConnector::new()?)
    };

    let mut poller = Poller::new(connector, Duration::from_secs(args.timeout));
    poller.set_interval(args.interval, Instant::now())?;

    // Offline sessions are never saved
    let store = if args.test { None } else { store };

    let events = EventHandler::new(250);
    let sender = events.sender();
    let worker = Worker::spawn(poller, store, !args.manual, move |update| {
        let _ = sender.send(Event::Poll(update));
    });

    let mut app = App::new(args, worker, config);
    let mut ui = UI::new(&app);

    // Initialize the terminal user interface
    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;
    let mut tui = Tui::new(terminal, events);
    tui.init()?;
    tui.draw(&app, &mut ui)?;

    // Main loop
    while app.running {
        let redraw = match tui.events.next()? {
            Event::Tick => app.tick(),
            Event::Key(key_event) => {
                let redraw = handle_key_events(key_event, &mut app, &mut ui)?;
                if redraw {
                    ui.update(&app);
                }
                redraw
            }
            Event::Mouse(mouse_event) => handle_mouse_events(mouse_event, &app, &mut ui)?,
            Event::Resize(_, _) => true,
            Event::Poll(update) => {
                let redraw = app.apply(update);
                ui.update(&app);
                redraw
            }
        };

        if redraw {
            tui.draw(&app, &mut ui)?;
        }
    }

    tui.exit()?;
    info!("exiting");
    Ok(())
}
