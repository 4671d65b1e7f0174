//! Persisted data types

use crate::providers::types::Station;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A station pinned by the user, as stored on disk
///
/// Keeps only what the dashboard needs to list and reopen the station;
/// everything else is refetched from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteStation {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Unix timestamp of when the station was pinned
    #[serde(default)]
    pub added_at: u64,
}

impl FavoriteStation {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude: None,
            longitude: None,
            added_at: unix_now(),
        }
    }

    /// Rebuild a `Station` for reopening the departures board
    pub fn to_station(&self) -> Station {
        let station = Station::new(self.id.clone(), self.name.clone());
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => station.with_location(lat, lon),
            _ => station,
        }
    }
}

impl From<&Station> for FavoriteStation {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            latitude: station.location.map(|l| l.latitude),
            longitude: station.location.map(|l| l.longitude),
            added_at: unix_now(),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_station_with_location() {
        let station =
            Station::new("900000100003", "S+U Alexanderplatz").with_location(52.5215, 13.4113);
        let fav = FavoriteStation::from(&station);
        assert_eq!(fav.id, "900000100003");
        assert_eq!(fav.name, "S+U Alexanderplatz");
        assert_eq!(fav.latitude, Some(52.5215));
        assert_eq!(fav.longitude, Some(13.4113));
        assert!(fav.added_at > 0);
    }

    #[test]
    fn test_from_station_without_location() {
        let station = Station::new("900000012345", "Somewhere");
        let fav = FavoriteStation::from(&station);
        assert_eq!(fav.latitude, None);
        assert_eq!(fav.longitude, None);
    }

    #[test]
    fn test_to_station_roundtrip() {
        let station = Station::new("900000100003", "S+U Alexanderplatz").with_location(52.52, 13.41);
        let rebuilt = FavoriteStation::from(&station).to_station();
        assert_eq!(rebuilt.id, station.id);
        assert_eq!(rebuilt.name, station.name);
        assert_eq!(rebuilt.location, station.location);
    }

    #[test]
    fn test_serde_skips_missing_coordinates() {
        let fav = FavoriteStation::new("900000012345", "Somewhere");
        let json = serde_json::to_string(&fav).unwrap();
        assert!(!json.contains("latitude"));
        assert!(!json.contains("longitude"));

        let back: FavoriteStation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.latitude, None);
    }
}
