//! Plate Archive - terminal client for license-plate archive requests.
//!
//! Reads its configuration from the environment (and `.env`), logs to a
//! file, and runs the request workflow against the archive backend.

use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing_subscriber::EnvFilter;

use plate_archive::application::{App, AppMode, ArchiveGateway};
use plate_archive::infrastructure::{Config, HttpArchiveGateway};
use plate_archive::presentation::{render_ui, InputHandler};

/// Longest the event loop blocks waiting for input.
const MAX_POLL: Duration = Duration::from_millis(250);

/// Filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "plate_archive=info";

fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_tracing(config: &Config) -> Result<()> {
    let log_file = File::create(&config.log_file)
        .with_context(|| format!("creating log file {}", config.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Entry point: sets up logging, the backend gateway and the terminal, then
/// runs the event loop until the user quits.
fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config)?;

    let gateway = HttpArchiveGateway::new(&config.api_url, config.http_timeout)?;
    tracing::info!(api = %gateway.base_url(), "Starting plate archive client");

    let mut app = App::new(gateway, config.workflow_settings());
    app.bootstrap();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "Event loop failed");
        println!("{err:?}");
    }

    Ok(())
}

/// Main event loop.
///
/// Waits for input at most until the pending search debounce is due, so a
/// search fires once typing pauses even without further key presses.
fn run_app<B: Backend, G: ArchiveGateway>(terminal: &mut Terminal<B>, app: &mut App<G>) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        if event::poll(app.poll_timeout(Instant::now(), MAX_POLL))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if matches!(app.mode, AppMode::Normal) => return Ok(()),
                        _ => InputHandler::handle_key_event(app, key.code, key.modifiers),
                    }
                }
            }
        }

        app.tick(Instant::now());
    }
}
