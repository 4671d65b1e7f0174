//! Abfahrt — terminal departures board for Berlin public transit

mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{unbounded, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;

use abfahrt::app::{AppCommand, AppSnapshot, Controller};
use abfahrt::config;
use abfahrt::data::{storage, Favorites, SearchHistory, Settings};
use abfahrt::providers::{BvgProvider, TransitProvider};

#[derive(Parser)]
#[command(
    name = "abfahrt",
    about = "Terminal departures board for Berlin public transit",
    version
)]
struct Cli {
    /// Station name to search for on startup
    query: Option<String>,

    /// Departures backend base URL (overrides the saved setting)
    #[arg(long)]
    api_url: Option<String>,

    /// Directory for log files (defaults to the abfahrt data directory)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

/// Which pane keystrokes act on
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Radar,
}

/// Overlay listing persisted data in place of the search results
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Favorites,
    History,
}

pub struct UiState {
    pub input: String,
    pub selected: usize,
    pub focus: Focus,
    pub overlay: Overlay,
    running: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Keep the handle alive for the whole run; dropping it stops logging
    let _logger = init_logging(cli.log_dir.clone());

    let settings = Settings::load().unwrap_or_else(|e| {
        log::warn!("could not load settings: {e}");
        Settings::default()
    });
    let favorites = Favorites::load().unwrap_or_else(|e| {
        log::warn!("could not load favorites: {e}");
        Favorites::new()
    });
    let history = SearchHistory::load().unwrap_or_else(|e| {
        log::warn!("could not load search history: {e}");
        SearchHistory::new()
    });

    let base_url = cli
        .api_url
        .clone()
        .or_else(|| settings.api_base_url.clone())
        .unwrap_or_else(|| config::api::DEFAULT_BASE_URL.to_string());
    log::info!("using departures backend at {base_url}");

    let provider = Arc::new(BvgProvider::with_base_url(&base_url)?) as Arc<dyn TransitProvider>;

    let (tx, rx) = unbounded();
    let shared = Arc::new(Mutex::new(AppSnapshot::default()));
    let mut controller = Controller::new(
        rx,
        tx.clone(),
        Arc::clone(&shared),
        provider,
        favorites,
        history,
        settings,
    );
    let controller_handle = thread::spawn(move || controller.run());

    let mut ui_state = UiState {
        input: cli.query.clone().unwrap_or_default(),
        selected: 0,
        focus: Focus::Search,
        overlay: Overlay::None,
        running: true,
    };
    match cli.query {
        Some(query) => {
            let _ = tx.send(AppCommand::SubmitQuery(query));
        }
        None => {
            let _ = tx.send(AppCommand::ShowFeatured);
        }
    }

    // Enter TUI
    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    while ui_state.running {
        let snapshot = shared.lock().unwrap_or_else(|e| e.into_inner()).clone();
        clamp_selection(&mut ui_state, &snapshot);
        terminal.draw(|f| ui::draw(f, &snapshot, &ui_state))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(key, &mut ui_state, &snapshot, &tx);
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }

    let _ = tx.send(AppCommand::Shutdown);
    let _ = controller_handle.join();

    // Restore terminal
    terminal::disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

fn init_logging(log_dir: Option<PathBuf>) -> Option<flexi_logger::LoggerHandle> {
    let directory = match log_dir {
        Some(dir) => dir,
        None => storage::data_dir().ok()?.join("logs"),
    };
    flexi_logger::Logger::try_with_env_or_str("info")
        .ok()?
        .log_to_file(
            flexi_logger::FileSpec::default()
                .directory(directory)
                .basename(config::app::NAME),
        )
        .start()
        .ok()
}

/// Keep the selection inside whichever list the left pane is showing
fn clamp_selection(ui: &mut UiState, snapshot: &AppSnapshot) {
    let len = match ui.overlay {
        Overlay::None => snapshot.results.len(),
        Overlay::Favorites => snapshot.favorites.len(),
        Overlay::History => snapshot.history.len(),
    };
    if len == 0 {
        ui.selected = 0;
    } else if ui.selected >= len {
        ui.selected = len - 1;
    }
}

fn handle_key(key: KeyEvent, ui: &mut UiState, snapshot: &AppSnapshot, tx: &Sender<AppCommand>) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        ui.running = false;
        return;
    }

    match key.code {
        KeyCode::F(10) => ui.running = false,

        KeyCode::F(8) => {
            let _ = tx.send(AppCommand::ToggleTheme);
        }

        KeyCode::F(6) => {
            // Snapshot still holds the pre-toggle value
            ui.focus = if snapshot.radar_active {
                Focus::Search
            } else {
                Focus::Radar
            };
            let _ = tx.send(AppCommand::ToggleRadar);
        }

        KeyCode::F(5) => {
            let _ = tx.send(AppCommand::RefreshBoard);
        }

        KeyCode::F(3) => {
            ui.overlay = if ui.overlay == Overlay::Favorites {
                Overlay::None
            } else {
                Overlay::Favorites
            };
            ui.selected = 0;
        }

        KeyCode::F(4) => {
            ui.overlay = if ui.overlay == Overlay::History {
                Overlay::None
            } else {
                Overlay::History
            };
            ui.selected = 0;
        }

        KeyCode::F(2) => match ui.overlay {
            Overlay::None => {
                if let Some(station) = snapshot.results.get(ui.selected) {
                    let _ = tx.send(AppCommand::ToggleFavorite(station.clone()));
                }
            }
            Overlay::Favorites => {
                if let Some(favorite) = snapshot.favorites.get(ui.selected) {
                    let _ = tx.send(AppCommand::ToggleFavorite(favorite.to_station()));
                }
            }
            Overlay::History => {}
        },

        KeyCode::Esc => {
            if ui.overlay != Overlay::None {
                ui.overlay = Overlay::None;
            } else if ui.focus == Focus::Radar {
                ui.focus = Focus::Search;
            } else if snapshot.board.is_some() {
                let _ = tx.send(AppCommand::CloseBoard);
            } else {
                ui.running = false;
            }
        }

        KeyCode::Tab => {
            if snapshot.radar_active {
                ui.focus = if ui.focus == Focus::Radar {
                    Focus::Search
                } else {
                    Focus::Radar
                };
            }
        }

        // Radar viewport controls
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right
            if ui.focus == Focus::Radar =>
        {
            let (north, east) = match key.code {
                KeyCode::Up => (1, 0),
                KeyCode::Down => (-1, 0),
                KeyCode::Left => (0, -1),
                KeyCode::Right => (0, 1),
                _ => (0, 0),
            };
            let _ = tx.send(AppCommand::SetViewport(snapshot.viewport.panned(north, east)));
        }
        KeyCode::Char('+') | KeyCode::Char('=') if ui.focus == Focus::Radar => {
            let _ = tx.send(AppCommand::SetViewport(snapshot.viewport.zoomed(0.7)));
        }
        KeyCode::Char('-') if ui.focus == Focus::Radar => {
            let _ = tx.send(AppCommand::SetViewport(snapshot.viewport.zoomed(1.43)));
        }

        // List navigation
        KeyCode::Up => ui.selected = ui.selected.saturating_sub(1),
        KeyCode::Down => ui.selected = ui.selected.saturating_add(1),

        KeyCode::Enter => match ui.overlay {
            Overlay::None => {
                if let Some(station) = snapshot.results.get(ui.selected) {
                    let _ = tx.send(AppCommand::OpenStation(station.clone()));
                } else if !ui.input.trim().is_empty() {
                    let _ = tx.send(AppCommand::SubmitQuery(ui.input.clone()));
                }
            }
            Overlay::Favorites => {
                if let Some(favorite) = snapshot.favorites.get(ui.selected) {
                    let _ = tx.send(AppCommand::OpenStation(favorite.to_station()));
                    ui.overlay = Overlay::None;
                }
            }
            Overlay::History => {
                if let Some(term) = snapshot.history.get(ui.selected) {
                    ui.input = term.clone();
                    ui.overlay = Overlay::None;
                    let _ = tx.send(AppCommand::SubmitQuery(term.clone()));
                }
            }
        },

        KeyCode::Delete if ui.overlay == Overlay::Favorites => {
            if let Some(favorite) = snapshot.favorites.get(ui.selected) {
                let _ = tx.send(AppCommand::ToggleFavorite(favorite.to_station()));
            }
        }
        KeyCode::Delete if ui.overlay == Overlay::History => {
            let _ = tx.send(AppCommand::ClearHistory);
        }

        // Search input
        KeyCode::Backspace if ui.overlay == Overlay::None => {
            ui.input.pop();
            ui.selected = 0;
            let _ = tx.send(AppCommand::QueryEdited(ui.input.clone()));
        }
        KeyCode::Char(c) if ui.overlay == Overlay::None && ui.focus == Focus::Search => {
            ui.input.push(c);
            ui.selected = 0;
            let _ = tx.send(AppCommand::QueryEdited(ui.input.clone()));
        }

        _ => {}
    }
}
