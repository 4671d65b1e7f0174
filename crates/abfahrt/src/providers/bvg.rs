//! Berlin Transport departures backend provider
//!
//! Implementation of `TransitProvider` against the departures REST backend
//! (a thin wrapper over the BVG `transport.rest` feed).

use crate::config::api::{DEFAULT_BASE_URL, MIN_QUERY_LEN};
use crate::error::{AppError, Result};
use crate::network::HttpClient;

use super::traits::TransitProvider;
use super::types::{
    BoundingBox, Departure, DepartureBoard, Line, Location, Product, RadarSweep, Station, Stopover,
    Vehicle,
};

use chrono::{DateTime, Utc};
use serde::Deserialize;

// =============================================================================
// Internal API response types (serde)
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ApiLine {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    /// Radar responses carry the product here instead of `type`
    #[serde(default)]
    product: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiStation {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default = "default_station_kind", rename = "type")]
    kind: String,
    #[serde(default)]
    location: Option<ApiLocation>,
}

fn default_station_kind() -> String {
    "stop".to_string()
}

#[derive(Debug, Deserialize)]
struct ApiStationList {
    #[serde(default)]
    stations: Vec<ApiStation>,
}

#[derive(Debug, Deserialize)]
struct ApiDeparture {
    #[serde(default)]
    line: Option<ApiLine>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    when: Option<String>,
    #[serde(default)]
    delay: Option<i64>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    remarks: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiBoard {
    #[serde(default)]
    station: Option<ApiStation>,
    #[serde(default)]
    departures: Vec<ApiDeparture>,
    #[serde(default, rename = "realtimeDataUpdatedAt")]
    realtime_data_updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiStopover {
    #[serde(default)]
    stop: Option<ApiStopName>,
}

#[derive(Debug, Deserialize)]
struct ApiStopName {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiVehicle {
    #[serde(default)]
    line: Option<ApiLine>,
    #[serde(default)]
    location: Option<ApiLocation>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default, rename = "tripId")]
    trip_id: Option<String>,
    #[serde(default, rename = "nextStopovers")]
    next_stopovers: Vec<ApiStopover>,
}

#[derive(Debug, Deserialize)]
struct ApiRadar {
    #[serde(default)]
    vehicles: Vec<ApiVehicle>,
}

// =============================================================================
// Wire -> domain conversion
// =============================================================================

impl From<ApiLocation> for Location {
    fn from(loc: ApiLocation) -> Self {
        Location::new(loc.latitude, loc.longitude)
    }
}

impl From<ApiLine> for Line {
    fn from(line: ApiLine) -> Self {
        // Radar payloads put the product string in `product`, departure
        // payloads in `type`; either may be missing
        let product = line
            .product
            .or(line.kind)
            .map(|s| Product::from_wire(&s))
            .unwrap_or(Product::Other);
        Line::new(line.name.unwrap_or_else(|| "?".to_string()), product)
    }
}

impl From<ApiStation> for Station {
    fn from(st: ApiStation) -> Self {
        Station {
            id: st.id,
            name: st.name,
            kind: st.kind,
            location: st.location.map(Location::from),
        }
    }
}

/// Parse a backend timestamp, tolerating empty or malformed strings
fn parse_when(value: Option<String>) -> Option<DateTime<Utc>> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl From<ApiDeparture> for Departure {
    fn from(dep: ApiDeparture) -> Self {
        Departure {
            line: dep.line.map(Line::from).unwrap_or_else(|| {
                Line::new("?", Product::Other)
            }),
            direction: dep.direction.unwrap_or_else(|| "Unknown".to_string()),
            when: parse_when(dep.when),
            delay: dep.delay,
            platform: dep.platform.filter(|p| !p.trim().is_empty()),
            remarks: dep.remarks,
        }
    }
}

impl ApiVehicle {
    /// Vehicles without a position cannot be placed on the radar
    fn into_vehicle(self) -> Option<Vehicle> {
        let location = self.location?;
        Some(Vehicle {
            line: self.line.map(Line::from).unwrap_or_else(|| {
                Line::new("?", Product::Other)
            }),
            location: location.into(),
            direction: self.direction.filter(|d| !d.trim().is_empty()),
            trip_id: self.trip_id,
            next_stopovers: self
                .next_stopovers
                .into_iter()
                .filter_map(|s| s.stop)
                .filter(|s| !s.name.trim().is_empty())
                .map(|s| Stopover { name: s.name })
                .collect(),
        })
    }
}

// =============================================================================
// BvgProvider
// =============================================================================

/// Provider for the Berlin Transport departures backend
pub struct BvgProvider {
    client: HttpClient,
    base_url: String,
}

impl BvgProvider {
    /// Create a provider against the default backend
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a provider with a custom base URL (settings override, tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let base_url: String = base_url.into();
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a full API URL from an endpoint path
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl TransitProvider for BvgProvider {
    fn name(&self) -> &'static str {
        "Berlin Transport"
    }

    fn id(&self) -> &'static str {
        "bvg"
    }

    fn search_stations(&self, query: &str, limit: u32) -> Result<Vec<Station>> {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_LEN {
            return Err(AppError::Query(format!(
                "query must be at least {MIN_QUERY_LEN} characters"
            )));
        }

        let limit_str = limit.to_string();
        let list: ApiStationList = self.client.get_json_query(
            &self.url("/stations/search"),
            &[("q", trimmed), ("results", limit_str.as_str())],
        )?;
        Ok(list.stations.into_iter().map(Station::from).collect())
    }

    fn departures(&self, station_id: &str, duration_min: u32) -> Result<DepartureBoard> {
        let duration_str = duration_min.to_string();
        let board: ApiBoard = self.client.get_json_query(
            &self.url(&format!("/departures/{station_id}")),
            &[("duration", duration_str.as_str())],
        )?;

        let station = board
            .station
            .map(Station::from)
            .unwrap_or_else(|| Station::new(station_id, format!("Station {station_id}")));

        Ok(DepartureBoard {
            station,
            departures: board.departures.into_iter().map(Departure::from).collect(),
            realtime_updated_at: parse_when(board.realtime_data_updated_at),
            fetched_at: Utc::now(),
        })
    }

    fn radar(
        &self,
        bbox: &BoundingBox,
        duration_secs: u32,
        max_results: u32,
    ) -> Result<RadarSweep> {
        let north = bbox.north.to_string();
        let south = bbox.south.to_string();
        let east = bbox.east.to_string();
        let west = bbox.west.to_string();
        let duration = duration_secs.to_string();
        let results = max_results.to_string();

        let radar: ApiRadar = self.client.get_json_query(
            &self.url("/radar/vehicles"),
            &[
                ("north", north.as_str()),
                ("south", south.as_str()),
                ("east", east.as_str()),
                ("west", west.as_str()),
                ("duration", duration.as_str()),
                ("results", results.as_str()),
            ],
        )?;

        Ok(RadarSweep {
            vehicles: radar
                .vehicles
                .into_iter()
                .filter_map(ApiVehicle::into_vehicle)
                .collect(),
            swept_at: Utc::now(),
        })
    }

    fn featured_stations(&self) -> Result<Vec<Station>> {
        let list: ApiStationList = self.client.get_json(&self.url("/stations/featured"))?;
        Ok(list.stations.into_iter().map(Station::from).collect())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Wire deserialization and conversion ----

    #[test]
    fn test_station_list_deserialize() {
        let json = r#"{
            "stations": [
                {
                    "id": "900000100003",
                    "name": "S+U Alexanderplatz",
                    "type": "stop",
                    "location": {"latitude": 52.521508, "longitude": 13.411267}
                },
                {
                    "id": "900000024101",
                    "name": "S+U Friedrichstr.",
                    "type": "stop"
                }
            ],
            "query": "alex"
        }"#;
        let list: ApiStationList = serde_json::from_str(json).unwrap();
        assert_eq!(list.stations.len(), 2);

        let stations: Vec<Station> = list.stations.into_iter().map(Station::from).collect();
        assert_eq!(stations[0].name, "S+U Alexanderplatz");
        assert!(stations[0].has_location());
        // Missing location degrades to None instead of failing
        assert!(!stations[1].has_location());
    }

    #[test]
    fn test_station_defaults_for_missing_fields() {
        let st: ApiStation = serde_json::from_str(r#"{"name": "Somewhere"}"#).unwrap();
        let station = Station::from(st);
        assert_eq!(station.id, "");
        assert_eq!(station.kind, "stop");
    }

    #[test]
    fn test_board_deserialize_full() {
        let json = r#"{
            "station": {"id": "900000100003", "name": "S+U Alexanderplatz", "type": "stop"},
            "departures": [
                {
                    "line": {"name": "U8", "type": "subway"},
                    "direction": "S+U Wittenau",
                    "when": "2025-06-01T14:03:00+02:00",
                    "delay": 120,
                    "platform": "2"
                },
                {
                    "line": {"name": "M4", "type": "tram"},
                    "direction": "Falkenberg",
                    "when": "",
                    "delay": null
                }
            ],
            "realtimeDataUpdatedAt": "2025-06-01T11:58:30+00:00"
        }"#;
        let board: ApiBoard = serde_json::from_str(json).unwrap();
        let departures: Vec<Departure> =
            board.departures.into_iter().map(Departure::from).collect();

        assert_eq!(departures.len(), 2);
        assert_eq!(departures[0].line.name, "U8");
        assert_eq!(departures[0].line.product, Product::Subway);
        assert_eq!(departures[0].delay, Some(120));
        assert_eq!(departures[0].delay_minutes(), Some(2));
        assert_eq!(departures[0].platform.as_deref(), Some("2"));
        assert!(departures[0].when.is_some());

        // Empty `when` string degrades to None
        assert!(departures[1].when.is_none());
        assert_eq!(departures[1].delay, None);

        assert!(parse_when(board.realtime_data_updated_at).is_some());
    }

    #[test]
    fn test_departure_missing_line_and_direction() {
        let dep: ApiDeparture = serde_json::from_str(r#"{"when": "garbage"}"#).unwrap();
        let departure = Departure::from(dep);
        assert_eq!(departure.line.name, "?");
        assert_eq!(departure.line.product, Product::Other);
        assert_eq!(departure.direction, "Unknown");
        // Unparseable timestamp degrades to None
        assert!(departure.when.is_none());
    }

    #[test]
    fn test_departure_blank_platform_dropped() {
        let dep: ApiDeparture =
            serde_json::from_str(r#"{"direction": "Pankow", "platform": "  "}"#).unwrap();
        assert_eq!(Departure::from(dep).platform, None);
    }

    #[test]
    fn test_departure_unknown_fields_ignored() {
        let json = r#"{
            "line": {"name": "S41", "type": "suburban"},
            "direction": "Ring",
            "when": "2025-06-01T14:03:00+02:00",
            "occupancy": "high",
            "cancelled": false
        }"#;
        let dep: ApiDeparture = serde_json::from_str(json).unwrap();
        let departure = Departure::from(dep);
        assert_eq!(departure.line.product, Product::Suburban);
    }

    #[test]
    fn test_parse_when_offsets_normalize_to_utc() {
        let when = parse_when(Some("2025-06-01T14:03:00+02:00".to_string())).unwrap();
        assert_eq!(when.to_rfc3339(), "2025-06-01T12:03:00+00:00");
    }

    #[test]
    fn test_parse_when_rejects_garbage() {
        assert!(parse_when(None).is_none());
        assert!(parse_when(Some(String::new())).is_none());
        assert!(parse_when(Some("not a time".to_string())).is_none());
    }

    #[test]
    fn test_radar_deserialize() {
        let json = r#"{
            "vehicles": [
                {
                    "line": {"name": "M10", "product": "tram"},
                    "location": {"latitude": 52.531, "longitude": 13.402},
                    "direction": "Warschauer Str.",
                    "tripId": "1|2345|0|86|1062025",
                    "nextStopovers": [
                        {"stop": {"name": "U Eberswalder Str."}},
                        {"stop": {"name": "Husemannstr."}},
                        {"stop": null}
                    ]
                },
                {
                    "line": {"name": "142", "product": "bus"},
                    "direction": "Ostbahnhof"
                }
            ],
            "count": 2
        }"#;
        let radar: ApiRadar = serde_json::from_str(json).unwrap();
        let vehicles: Vec<Vehicle> = radar
            .vehicles
            .into_iter()
            .filter_map(ApiVehicle::into_vehicle)
            .collect();

        // The bus has no location and is dropped
        assert_eq!(vehicles.len(), 1);
        let tram = &vehicles[0];
        assert_eq!(tram.line.name, "M10");
        assert_eq!(tram.line.product, Product::Tram);
        assert_eq!(tram.direction.as_deref(), Some("Warschauer Str."));
        assert_eq!(tram.next_stopovers.len(), 2);
        assert_eq!(tram.next_stopovers[0].name, "U Eberswalder Str.");
    }

    #[test]
    fn test_radar_line_product_preferred_over_type() {
        let line: ApiLine =
            serde_json::from_str(r#"{"name": "RE1", "type": "stop", "product": "regional"}"#)
                .unwrap();
        assert_eq!(Line::from(line).product, Product::Regional);
    }

    #[test]
    fn test_line_missing_name() {
        let line: ApiLine = serde_json::from_str(r#"{"type": "bus"}"#).unwrap();
        let line = Line::from(line);
        assert_eq!(line.name, "?");
        assert_eq!(line.product, Product::Bus);
    }

    // ---- Provider construction and local validation ----

    #[test]
    fn test_provider_creation() {
        let provider = BvgProvider::new();
        assert!(provider.is_ok());
    }

    #[test]
    fn test_provider_identity() {
        let provider = BvgProvider::new().unwrap();
        assert_eq!(provider.id(), "bvg");
        assert_eq!(provider.name(), "Berlin Transport");
    }

    #[test]
    fn test_provider_url_building() {
        let provider = BvgProvider::with_base_url("http://localhost:9000/api/").unwrap();
        // Trailing slash is trimmed so paths join cleanly
        assert_eq!(
            provider.url("/stations/search"),
            "http://localhost:9000/api/stations/search"
        );
    }

    #[test]
    fn test_short_query_rejected_without_network() {
        let provider = BvgProvider::with_base_url("http://invalid.invalid.invalid").unwrap();
        let result = provider.search_stations("a", 15);
        // Rejected locally: a network attempt against this host would
        // surface as AppError::Network instead
        assert!(matches!(result, Err(AppError::Query(_))));
    }

    #[test]
    fn test_whitespace_query_rejected() {
        let provider = BvgProvider::with_base_url("http://invalid.invalid.invalid").unwrap();
        assert!(matches!(
            provider.search_stations("  a  ", 15),
            Err(AppError::Query(_))
        ));
        assert!(matches!(
            provider.search_stations("   ", 15),
            Err(AppError::Query(_))
        ));
    }

    // ---- Integration tests (require a running backend, marked #[ignore]) ----

    #[test]
    #[ignore]
    fn test_integration_search() {
        let provider = BvgProvider::new().unwrap();
        let stations = provider.search_stations("Alexanderplatz", 5).unwrap();
        assert!(!stations.is_empty());
    }

    #[test]
    #[ignore]
    fn test_integration_departures() {
        let provider = BvgProvider::new().unwrap();
        let board = provider.departures("900000100003", 60).unwrap();
        assert_eq!(board.station.id, "900000100003");
    }

    #[test]
    #[ignore]
    fn test_integration_radar() {
        let provider = BvgProvider::new().unwrap();
        let sweep = provider.radar(&BoundingBox::home(), 30, 50).unwrap();
        for vehicle in &sweep.vehicles {
            assert!(!vehicle.line.name.is_empty());
        }
    }
}
