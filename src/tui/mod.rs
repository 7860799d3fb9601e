//! Terminal timeline browser for chronicle.
//!
//! Provides a three-panel TUI with the story timeline, a detail view,
//! and a filter input, using ratatui for rendering and crossterm for
//! terminal management. All reads flow through the app's caches; the
//! event loop is the only place that talks to the service.

use std::io;
use std::panic;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::service::JournalService;

mod app;
pub mod event;
mod ui;

pub use app::{App, Focus};

/// Number of stories fetched per timeline page.
const PAGE_SIZE: u64 = 50;

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// This should always be called before exiting the TUI, even in error
/// cases, to prevent terminal corruption.
///
/// # Errors
///
/// Returns an error if terminal restoration fails.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic handler.
///
/// Does not require a Terminal reference, making it safe to call from a
/// panic hook. Ignores errors since we are likely already in a bad state.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal before panicking.
///
/// The original panic hook is preserved and called after restoration.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Loads the first timeline page, the tag cache, and the total count.
///
/// # Errors
///
/// Returns an error if any of the reads fail.
fn load_initial(app: &mut App, service: &JournalService) -> Result<()> {
    let tags = service.all_tags().context("failed to load tags")?;
    app.apply_tags(tags);

    let total = service
        .count_stories(app.query())
        .context("failed to count stories")?;
    app.set_total_count(total);

    let page = service
        .fetch_story_page(app.query(), 0, PAGE_SIZE)
        .context("failed to load timeline page")?;
    app.apply_page(page);

    Ok(())
}

/// Fetches the next timeline page and refreshes the total count.
///
/// The count is re-read alongside the page so the loaded/total indicator
/// stays honest if rows were added since the last fetch.
///
/// # Errors
///
/// Returns an error if the page fetch or count fails.
fn load_next_page(app: &mut App, service: &JournalService) -> Result<()> {
    let offset = app.loaded_count();
    let page = service
        .fetch_story_page(app.query(), offset, PAGE_SIZE)
        .context("failed to load timeline page")?;
    app.apply_page(page);

    let total = service
        .count_stories(app.query())
        .context("failed to count stories")?;
    app.set_total_count(total);

    Ok(())
}

/// Runs the main event loop for the TUI.
///
/// Polls for keyboard events, updates app state, serves load-more
/// requests, and re-renders. Exits when the user presses 'q'.
///
/// # Errors
///
/// Returns an error if event polling, rendering, or terminal operations
/// fail. Terminal state is always restored, even on error.
pub fn run_event_loop(app: &mut App, service: &JournalService) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, service, &mut terminal);

    // Always restore terminal state
    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

/// Internal event loop implementation.
///
/// Separated from `run_event_loop` to ensure terminal restoration happens
/// in the outer function.
fn run_event_loop_internal(
    app: &mut App,
    service: &JournalService,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
        {
            let should_quit = event::handle_key_event(app, key);
            if should_quit {
                break;
            }
        }

        // The app never touches the service itself; it raises a flag and
        // the loop serves it here.
        if app.take_load_more_request() {
            load_next_page(app, service)?;
        }
    }

    Ok(())
}

/// Entry point for the TUI application.
///
/// Opens the database, resolves the UI language from settings, loads the
/// first timeline page, and starts the event loop.
///
/// # Errors
///
/// Returns an error if:
/// - Database path cannot be determined
/// - Database directory creation fails
/// - Database connection or migration fails
/// - Initial loading fails
/// - Terminal initialization or the event loop fails
pub fn run() -> Result<()> {
    // Install panic hook to restore terminal on panic
    init_panic_hook();

    let db_path = crate::utils::get_database_path().context("Failed to get database path")?;
    crate::utils::ensure_database_directory(&db_path)
        .context("Failed to ensure database directory")?;

    let db = crate::Database::open(&db_path).context("Failed to open database")?;
    let service = JournalService::new(db);

    let settings = service
        .ensure_settings()
        .context("Failed to load settings")?;
    let messages = crate::i18n::messages(settings.lang);

    let mut app = App::new(messages, settings.theme);
    load_initial(&mut app, &service).context("Failed to load timeline from database")?;

    run_event_loop(&mut app, &service).context("TUI event loop failed")?;

    Ok(())
}
