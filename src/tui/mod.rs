pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::{App, Tab};
pub use theme::{resolve_theme, Theme, ThemeColors};

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler};

use crate::data::{DataStore, Dataset};
use crate::error::DataError;
use crate::model::Indicator;

/// `Some` when a new snapshot was installed.
type ReloadResult = Result<Option<Arc<Dataset>>, DataError>;

fn spawn_reload(store: &Arc<DataStore>, force: bool) -> tokio::task::JoinHandle<ReloadResult> {
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || {
        if force {
            store.reload().map(Some)
        } else {
            store
                .refresh_if_stale()
                .map(|changed| changed.then(|| store.dataset()))
        }
    })
}

pub async fn run_tui(mut app: App, store: Arc<DataStore>) -> anyhow::Result<()> {
    // Buffer stderr while TUI is active to prevent output corrupting the display
    crate::stderr_buffer::activate();

    // Init terminal (sets up panic hooks automatically)
    let mut terminal = ratatui::init();

    let mut events = EventHandler::new(
        Duration::from_millis(250),
        Duration::from_secs(app.config.auto_refresh_interval),
    );

    let mut pending_reload: Option<tokio::task::JoinHandle<ReloadResult>> = None;

    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::draw(frame, &mut app)) {
            break Err(e.into());
        }

        match events.next().await {
            Event::Key(key) => {
                app.last_interaction = std::time::Instant::now();
                handle_key_event(&mut app, key);
            }
            Event::Tick => {
                app.update_flash();
                app.advance_spinner();
            }
            Event::Resize => {}
            Event::StaleCheck => {
                app.needs_refresh = true;
            }
        }

        // Check if background reload has completed
        if let Some(handle) = pending_reload.take_if(|h| h.is_finished()) {
            match handle.await {
                Ok(Ok(Some(dataset))) => app.update_dataset(dataset),
                Ok(Ok(None)) => app.last_refresh = std::time::Instant::now(),
                Ok(Err(e)) => {
                    app.show_flash(format!("Failed to reload, keeping previous data: {}", e))
                }
                Err(e) => app.show_flash(format!("Error: reload task panicked: {}", e)),
            }
            app.is_loading = false;
        }

        // Spawn new reload if needed and none is pending
        if app.needs_refresh && pending_reload.is_none() {
            let is_manual = app.force_refresh;
            let modal_open = app.input_mode != app::InputMode::Normal;
            let recent_interaction = app.last_interaction.elapsed() < Duration::from_secs(2);

            // Automatic checks wait until the user is idle and no modal is open.
            // When suppressed, needs_refresh stays true so it retries on the next tick.
            if is_manual || (!modal_open && !recent_interaction) {
                app.needs_refresh = false;
                app.force_refresh = false;
                app.is_loading = is_manual;
                pending_reload = Some(spawn_reload(&store, is_manual));
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    ratatui::restore();

    // Flush buffered stderr messages now that the terminal is restored
    for msg in crate::stderr_buffer::drain() {
        eprintln!("{}", msg);
    }

    result
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    match app.input_mode {
        app::InputMode::Normal => {
            match key.code {
                // Quit
                KeyCode::Char('q') => app.should_quit = true,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.should_quit = true
                }

                // Navigation
                KeyCode::Char('j') | KeyCode::Down => app.next_row(),
                KeyCode::Char('k') | KeyCode::Up => app.previous_row(),
                KeyCode::Tab | KeyCode::Right => app.next_tab(),
                KeyCode::BackTab | KeyCode::Left => app.previous_tab(),
                KeyCode::F(n @ 1..=5) => app.select_tab(Tab::ALL[(n - 1) as usize]),

                // Reload (manual = always reread the files)
                KeyCode::Char('r') => {
                    app.needs_refresh = true;
                    app.force_refresh = true;
                }

                // Help
                KeyCode::Char('?') => app.show_help(),

                _ => handle_tab_key(app, key.code),
            }
        }
        app::InputMode::Filter => {
            match key.code {
                KeyCode::Enter => app.confirm_filter(),
                KeyCode::Esc => app.cancel_filter(),
                KeyCode::Backspace => app.pop_filter_char(),
                KeyCode::Char(c) if !c.is_control() => app.push_filter_char(c),
                // Ignore all other keys (don't propagate to Normal mode)
                _ => {}
            }
        }
        app::InputMode::Help => {
            // Any key exits help
            app.dismiss_help();
        }
    }
}

/// Keys that only mean something on one tab.
fn handle_tab_key(app: &mut App, code: KeyCode) {
    match (app.tab, code) {
        (Tab::Comparator, KeyCode::Char(' ') | KeyCode::Enter) => app.toggle_compared(),
        (Tab::Comparator, KeyCode::Char('/')) => app.start_filter(),
        (Tab::Comparator, KeyCode::Char('v')) => app.toggle_value_view(),
        (Tab::Comparator, KeyCode::Char('c')) => app.clear_compared(),
        (Tab::Map, KeyCode::Char('m')) => app.cycle_metric(),
        (Tab::Centers, KeyCode::Char('g')) => app.cycle_regime(),
        (Tab::Centers, KeyCode::Char('d')) => app.toggle_center_detail(),
        (Tab::Search, KeyCode::Char('1')) => app.focus_threshold(Indicator::Education),
        (Tab::Search, KeyCode::Char('2')) => app.focus_threshold(Indicator::Housing),
        (Tab::Search, KeyCode::Char('3')) => app.focus_threshold(Indicator::Employment),
        (Tab::Search, KeyCode::Char('+') | KeyCode::Char('=')) => app.adjust_threshold(1.0),
        (Tab::Search, KeyCode::Char('-')) => app.adjust_threshold(-1.0),
        (Tab::Search, KeyCode::Char('x')) => app.clear_threshold(),
        _ => {}
    }
}
