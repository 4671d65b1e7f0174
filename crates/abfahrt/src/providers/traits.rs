//! Transit provider trait
//!
//! Defines the interface the application controller talks to, so the
//! concrete backend can be swapped (or mocked in tests).

use crate::error::Result;

use super::types::{BoundingBox, DepartureBoard, RadarSweep, Station};

/// A source of live transit data
pub trait TransitProvider: Send + Sync {
    /// Display name for the provider (e.g. "Berlin Transport")
    fn name(&self) -> &'static str;

    /// Machine-readable identifier (e.g. "bvg")
    fn id(&self) -> &'static str;

    /// Search stations by name
    fn search_stations(&self, query: &str, limit: u32) -> Result<Vec<Station>>;

    /// Fetch upcoming departures for a station over the next
    /// `duration_min` minutes
    fn departures(&self, station_id: &str, duration_min: u32) -> Result<DepartureBoard>;

    /// Fetch vehicles currently moving inside the viewport
    fn radar(&self, bbox: &BoundingBox, duration_secs: u32, max_results: u32)
        -> Result<RadarSweep>;

    /// The backend's curated list of major hubs
    fn featured_stations(&self) -> Result<Vec<Station>> {
        Ok(Vec::new())
    }
}
