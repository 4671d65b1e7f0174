//! Client-local persisted data
//!
//! Favorites, search history and settings, stored as JSON files in the
//! per-user data directory.

pub mod favorites;
pub mod history;
pub mod settings;
pub mod storage;
pub mod types;

pub use favorites::Favorites;
pub use history::SearchHistory;
pub use settings::{Settings, Theme};
pub use types::FavoriteStation;
