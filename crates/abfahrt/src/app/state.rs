//! Shared application state and commands
//!
//! `AppCommand` is the command type sent by the UI thread. `AppSnapshot` is
//! the shared state the UI renders from.

use std::borrow::Cow;

use chrono::{DateTime, Utc};

use crate::data::settings::Theme;
use crate::data::types::FavoriteStation;
use crate::providers::types::{BoundingBox, DepartureBoard, RadarSweep, Station, Vehicle};

/// Commands sent by the UI thread (and workers, for the `Internal*` ones)
pub enum AppCommand {
    // Search
    /// The search input changed; fires a debounced search when long enough
    QueryEdited(String),
    /// Fire a search immediately (Enter, history selection)
    SubmitQuery(String),
    /// Load the backend's curated major hubs into the results list
    ShowFeatured,

    // Departures
    OpenStation(Station),
    RefreshBoard,
    CloseBoard,

    // Favorites & history
    ToggleFavorite(Station),
    ClearFavorites,
    ClearHistory,

    // Radar
    ToggleRadar,
    SetViewport(BoundingBox),

    // Appearance
    ToggleTheme,

    // Shutdown the controller loop
    Shutdown,

    // Internal: worker-thread completions (not sent by frontends)
    InternalSearchDone {
        generation: u64,
        query: String,
        result: Result<Vec<Station>, String>,
    },
    InternalBoardDone {
        generation: u64,
        result: Result<DepartureBoard, String>,
    },
    InternalRadarDone {
        result: Result<RadarSweep, String>,
    },
}

/// Snapshot of app state, shared between the controller and the UI
#[derive(Clone, Debug)]
pub struct AppSnapshot {
    // Search
    pub query: String,
    pub searching: bool,
    pub results: Vec<Station>,

    // Departures
    pub board: Option<DepartureBoard>,
    pub board_loading: bool,

    // Radar
    pub radar_active: bool,
    pub vehicles: Vec<Vehicle>,
    pub radar_swept_at: Option<DateTime<Utc>>,
    pub viewport: BoundingBox,

    // Persisted data, mirrored for rendering
    pub favorites: Vec<FavoriteStation>,
    pub history: Vec<String>,
    pub theme: Theme,

    // Status line
    pub status_text: Cow<'static, str>,
    /// True when `status_text` reports a failure (for red rendering)
    pub is_error: bool,
    /// Last failure detail, kept for the status pane
    pub last_error: Option<String>,
}

impl Default for AppSnapshot {
    fn default() -> Self {
        Self {
            query: String::new(),
            searching: false,
            results: Vec::new(),
            board: None,
            board_loading: false,
            radar_active: false,
            vehicles: Vec::new(),
            radar_swept_at: None,
            viewport: BoundingBox::home(),
            favorites: Vec::new(),
            history: Vec::new(),
            theme: Theme::System,
            status_text: Cow::Borrowed("Ready"),
            is_error: false,
            last_error: None,
        }
    }
}
