//! Application controller
//!
//! Owns the transit provider and the persisted data, and processes commands
//! from the UI through a single crossbeam channel. Network calls run on
//! short-lived worker threads that report back as `Internal*` commands;
//! generation counters discard results that a newer request has outrun.

use std::borrow::Cow;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::config::api::MIN_QUERY_LEN;
use crate::config::ui::SEARCH_DEBOUNCE_MS;
use crate::data::{Favorites, SearchHistory, Settings};
use crate::providers::types::{BoundingBox, Station};
use crate::providers::TransitProvider;

use super::state::{AppCommand, AppSnapshot};

/// Command poll interval; also bounds timer resolution
const TICK: Duration = Duration::from_millis(50);

/// A search waiting out the debounce window
struct PendingQuery {
    query: String,
    fire_at: Instant,
}

pub struct Controller {
    cmd_rx: Receiver<AppCommand>,
    cmd_tx: Sender<AppCommand>,
    shared: Arc<Mutex<AppSnapshot>>,
    provider: Arc<dyn TransitProvider>,

    favorites: Favorites,
    history: SearchHistory,
    settings: Settings,

    // Search
    pending_query: Option<PendingQuery>,
    debounce: Duration,
    /// Monotonically increasing counter to discard stale search results
    search_generation: u64,

    // Departures
    open_station: Option<Station>,
    board_refresh_at: Option<Instant>,
    /// Counter to discard stale board results (also bumped on close)
    board_generation: u64,

    // Radar
    radar_active: bool,
    radar_due_at: Option<Instant>,
    radar_in_flight: bool,
    viewport: BoundingBox,
}

impl Controller {
    pub fn new(
        cmd_rx: Receiver<AppCommand>,
        cmd_tx: Sender<AppCommand>,
        shared: Arc<Mutex<AppSnapshot>>,
        provider: Arc<dyn TransitProvider>,
        favorites: Favorites,
        history: SearchHistory,
        settings: Settings,
    ) -> Self {
        // Seed the snapshot so the first frame shows persisted data
        {
            let mut state = shared.lock().unwrap_or_else(|e| e.into_inner());
            state.favorites = favorites.all().to_vec();
            state.history = history.entries().to_vec();
            state.theme = settings.theme;
            state.viewport = BoundingBox::home();
        }

        Self {
            cmd_rx,
            cmd_tx,
            shared,
            provider,
            favorites,
            history,
            settings,
            pending_query: None,
            debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            search_generation: 0,
            open_station: None,
            board_refresh_at: None,
            board_generation: 0,
            radar_active: false,
            radar_due_at: None,
            radar_in_flight: false,
            viewport: BoundingBox::home(),
        }
    }

    /// Run the controller event loop (blocking, call from a dedicated thread)
    pub fn run(&mut self) {
        loop {
            match self.cmd_rx.recv_timeout(TICK) {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            self.on_tick(Instant::now());
        }

        // Flush unsaved state on the way out
        if let Err(e) = self.favorites.save() {
            log::warn!("failed to save favorites: {e}");
        }
        if let Err(e) = self.history.save() {
            log::warn!("failed to save search history: {e}");
        }
    }

    fn state(&self) -> MutexGuard<'_, AppSnapshot> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Handle a single command. Returns true if the loop should exit.
    fn handle_command(&mut self, cmd: AppCommand) -> bool {
        match cmd {
            AppCommand::Shutdown => return true,

            AppCommand::QueryEdited(query) => {
                let trimmed = query.trim().to_string();
                let long_enough = trimmed.chars().count() >= MIN_QUERY_LEN;

                if long_enough {
                    self.pending_query = Some(PendingQuery {
                        query: trimmed.clone(),
                        fire_at: Instant::now() + self.debounce,
                    });
                } else {
                    self.pending_query = None;
                }

                let mut state = self.state();
                state.query = query;
                if !long_enough {
                    state.searching = false;
                    if trimmed.is_empty() {
                        state.results.clear();
                        state.status_text = "Ready".into();
                        state.is_error = false;
                    }
                }
            }

            AppCommand::SubmitQuery(query) => {
                let trimmed = query.trim().to_string();
                if trimmed.chars().count() >= MIN_QUERY_LEN {
                    self.pending_query = None;
                    self.state().query = trimmed.clone();
                    self.fire_search(trimmed);
                } else {
                    log::debug!("ignoring submit of short query {trimmed:?}");
                }
            }

            AppCommand::ShowFeatured => {
                self.pending_query = None;
                self.fire_featured();
            }

            AppCommand::OpenStation(station) => {
                self.open_station = Some(station.clone());
                self.board_refresh_at = None;
                self.fire_board(station);
            }

            AppCommand::RefreshBoard => {
                if let Some(station) = self.open_station.clone() {
                    self.board_refresh_at = None;
                    self.fire_board(station);
                }
            }

            AppCommand::CloseBoard => {
                self.open_station = None;
                self.board_refresh_at = None;
                // A fetch still in flight must not resurrect the board
                self.board_generation += 1;
                let mut state = self.state();
                state.board = None;
                state.board_loading = false;
            }

            AppCommand::ToggleFavorite(station) => {
                let pinned = self.favorites.toggle(&station);
                if let Err(e) = self.favorites.save() {
                    log::warn!("failed to save favorites: {e}");
                }
                let favorites = self.favorites.all().to_vec();
                let mut state = self.state();
                state.favorites = favorites;
                state.is_error = false;
                state.status_text = if pinned {
                    Cow::Owned(format!("Pinned {}", station.name))
                } else {
                    Cow::Owned(format!("Unpinned {}", station.name))
                };
            }

            AppCommand::ClearFavorites => {
                let removed = self.favorites.clear();
                if let Err(e) = self.favorites.save() {
                    log::warn!("failed to save favorites: {e}");
                }
                let mut state = self.state();
                state.favorites.clear();
                state.status_text = Cow::Owned(format!("Removed {removed} favorites"));
                state.is_error = false;
            }

            AppCommand::ClearHistory => {
                self.history.clear();
                if let Err(e) = self.history.save() {
                    log::warn!("failed to save search history: {e}");
                }
                let mut state = self.state();
                state.history.clear();
                state.status_text = "Search history cleared".into();
                state.is_error = false;
            }

            AppCommand::ToggleRadar => {
                self.radar_active = !self.radar_active;
                self.radar_due_at = if self.radar_active {
                    Some(Instant::now())
                } else {
                    None
                };
                let mut state = self.state();
                state.radar_active = self.radar_active;
                if self.radar_active {
                    state.status_text = "Radar on".into();
                } else {
                    state.vehicles.clear();
                    state.radar_swept_at = None;
                    state.status_text = "Radar off".into();
                }
                state.is_error = false;
            }

            AppCommand::SetViewport(bbox) => {
                self.viewport = bbox;
                self.state().viewport = bbox;
            }

            AppCommand::ToggleTheme => {
                self.settings.toggle_theme();
                if let Err(e) = self.settings.save() {
                    log::warn!("failed to save settings: {e}");
                }
                self.state().theme = self.settings.theme;
            }

            AppCommand::InternalSearchDone {
                generation,
                query,
                result,
            } => self.on_search_done(generation, query, result),

            AppCommand::InternalBoardDone { generation, result } => {
                self.on_board_done(generation, result)
            }

            AppCommand::InternalRadarDone { result } => self.on_radar_done(result),
        }
        false
    }

    /// Timer pass: fire the debounced search and the pollers that are due
    fn on_tick(&mut self, now: Instant) {
        if self
            .pending_query
            .as_ref()
            .is_some_and(|p| now >= p.fire_at)
        {
            let query = self.pending_query.take().map(|p| p.query).unwrap_or_default();
            self.fire_search(query);
        }

        if self
            .board_refresh_at
            .is_some_and(|due| now >= due)
        {
            if let Some(station) = self.open_station.clone() {
                self.board_refresh_at = None;
                self.fire_board(station);
            } else {
                self.board_refresh_at = None;
            }
        }

        if self.radar_active
            && !self.radar_in_flight
            && self.radar_due_at.is_some_and(|due| now >= due)
        {
            self.radar_due_at = None;
            self.fire_radar();
        }
    }

    // =========================================================================
    // Worker launches
    // =========================================================================

    fn fire_search(&mut self, query: String) {
        self.search_generation += 1;
        let generation = self.search_generation;
        {
            let mut state = self.state();
            state.searching = true;
            state.status_text = "Searching...".into();
            state.is_error = false;
        }

        let provider = Arc::clone(&self.provider);
        let tx = self.cmd_tx.clone();
        let limit = self.settings.search_limit;
        thread::spawn(move || {
            let result = provider
                .search_stations(&query, limit)
                .map_err(|e| e.to_string());
            let _ = tx.send(AppCommand::InternalSearchDone {
                generation,
                query,
                result,
            });
        });
    }

    fn fire_featured(&mut self) {
        self.search_generation += 1;
        let generation = self.search_generation;
        {
            let mut state = self.state();
            state.searching = true;
            state.status_text = "Loading featured stations...".into();
            state.is_error = false;
        }

        let provider = Arc::clone(&self.provider);
        let tx = self.cmd_tx.clone();
        thread::spawn(move || {
            let result = provider.featured_stations().map_err(|e| e.to_string());
            let _ = tx.send(AppCommand::InternalSearchDone {
                generation,
                query: String::new(),
                result,
            });
        });
    }

    fn fire_board(&mut self, station: Station) {
        self.board_generation += 1;
        let generation = self.board_generation;
        {
            let mut state = self.state();
            state.board_loading = true;
            state.status_text = Cow::Owned(format!("Loading departures for {}...", station.name));
            state.is_error = false;
        }

        let provider = Arc::clone(&self.provider);
        let tx = self.cmd_tx.clone();
        let duration = self.settings.board_duration_min;
        thread::spawn(move || {
            let result = provider
                .departures(&station.id, duration)
                .map_err(|e| e.to_string());
            let _ = tx.send(AppCommand::InternalBoardDone { generation, result });
        });
    }

    fn fire_radar(&mut self) {
        self.radar_in_flight = true;

        let provider = Arc::clone(&self.provider);
        let tx = self.cmd_tx.clone();
        let bbox = self.viewport;
        let duration = self.settings.radar_duration_secs;
        let results = self.settings.radar_results;
        thread::spawn(move || {
            let result = provider
                .radar(&bbox, duration, results)
                .map_err(|e| e.to_string());
            let _ = tx.send(AppCommand::InternalRadarDone { result });
        });
    }

    // =========================================================================
    // Worker completions
    // =========================================================================

    fn on_search_done(
        &mut self,
        generation: u64,
        query: String,
        result: Result<Vec<Station>, String>,
    ) {
        if generation != self.search_generation {
            log::debug!("discarding stale search result for {query:?}");
            return;
        }

        match result {
            Ok(stations) => {
                // Only successful, non-empty searches enter the history
                if !query.is_empty() && !stations.is_empty() && self.history.record(&query) {
                    if let Err(e) = self.history.save() {
                        log::warn!("failed to save search history: {e}");
                    }
                }
                let history = self.history.entries().to_vec();

                let mut state = self.state();
                state.searching = false;
                state.is_error = false;
                state.history = history;
                state.status_text = if stations.is_empty() {
                    "No stations found".into()
                } else if query.is_empty() {
                    Cow::Owned(format!("{} featured stations", stations.len()))
                } else {
                    Cow::Owned(format!("{} stations", stations.len()))
                };
                state.results = stations;
            }
            Err(message) => {
                log::warn!("search for {query:?} failed: {message}");
                let mut state = self.state();
                state.searching = false;
                state.is_error = true;
                state.status_text = "Search failed".into();
                state.last_error = Some(message);
            }
        }
    }

    fn on_board_done(
        &mut self,
        generation: u64,
        result: Result<crate::providers::types::DepartureBoard, String>,
    ) {
        if generation != self.board_generation {
            log::debug!("discarding stale departure board");
            return;
        }

        // Auto-refresh keeps its cadence whether the fetch worked or not
        self.board_refresh_at =
            Some(Instant::now() + Duration::from_secs(self.settings.board_refresh_secs));

        match result {
            Ok(board) => {
                let mut state = self.state();
                state.board_loading = false;
                state.is_error = false;
                state.status_text = Cow::Owned(format!(
                    "{} departures at {}",
                    board.departures.len(),
                    board.station.name
                ));
                state.board = Some(board);
            }
            Err(message) => {
                log::warn!("departure board fetch failed: {message}");
                let mut state = self.state();
                state.board_loading = false;
                state.is_error = true;
                state.status_text = "Departures unavailable".into();
                state.last_error = Some(message);
            }
        }
    }

    fn on_radar_done(&mut self, result: Result<crate::providers::types::RadarSweep, String>) {
        self.radar_in_flight = false;
        if !self.radar_active {
            return;
        }

        self.radar_due_at =
            Some(Instant::now() + Duration::from_secs(self.settings.radar_interval_secs));

        match result {
            Ok(sweep) => {
                let mut state = self.state();
                state.is_error = false;
                state.radar_swept_at = Some(sweep.swept_at);
                state.status_text = Cow::Owned(format!("{} vehicles in view", sweep.vehicles.len()));
                state.vehicles = sweep.vehicles;
            }
            Err(message) => {
                log::warn!("radar sweep failed: {message}");
                let mut state = self.state();
                state.is_error = true;
                state.status_text = "Radar sweep failed".into();
                state.last_error = Some(message);
            }
        }
    }
}
