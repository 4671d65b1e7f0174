//! Configuration constants for the abfahrt client

/// Application metadata
pub mod app {
    /// Application name (used for the data directory, user agent, log files)
    pub const NAME: &str = "abfahrt";
}

/// Departures backend configuration
pub mod api {
    /// Default backend base URL
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

    /// Shortest query that is allowed to reach the backend
    pub const MIN_QUERY_LEN: usize = 2;

    /// Default number of stations returned per search
    pub const DEFAULT_SEARCH_LIMIT: u32 = 15;

    /// Default departures window in minutes
    pub const DEFAULT_BOARD_DURATION_MIN: u32 = 60;
}

/// Network-related configuration
pub mod network {
    /// User agent for HTTP requests
    pub const USER_AGENT: &str = concat!("abfahrt/", env!("CARGO_PKG_VERSION"));

    /// Connection timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Read timeout in seconds
    pub const READ_TIMEOUT_SECS: u64 = 30;
}

/// Vehicle radar configuration
pub mod radar {
    /// Default lookahead passed to the radar endpoint, in seconds
    pub const DEFAULT_DURATION_SECS: u32 = 30;

    /// Default vehicle cap per sweep
    pub const DEFAULT_RESULTS: u32 = 100;

    /// Seconds between sweeps while the radar is active
    pub const SWEEP_INTERVAL_SECS: u64 = 15;

    /// Initial viewport center: Berlin Mitte
    pub const HOME_LATITUDE: f64 = 52.52;
    pub const HOME_LONGITUDE: f64 = 13.405;

    /// Initial viewport half-span in degrees
    pub const HOME_SPAN: f64 = 0.07;
}

/// UI timing configuration
pub mod ui {
    /// Pause after the last keystroke before a search fires, in milliseconds
    pub const SEARCH_DEBOUNCE_MS: u64 = 400;

    /// Seconds between departure-board refreshes while a station is open
    pub const BOARD_REFRESH_SECS: u64 = 30;
}
