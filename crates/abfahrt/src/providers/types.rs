//! Shared transit domain types
//!
//! Types returned by providers: stations, departures, radar vehicles, and
//! the viewport bounding box used for radar sweeps.

use crate::config::radar;
use chrono::{DateTime, Utc};
use chrono_tz::Europe::Berlin;
use serde::{Deserialize, Serialize};

/// A geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Transport product class, derived from the backend's free-form type string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Suburban,
    Subway,
    Tram,
    Bus,
    Ferry,
    Express,
    Regional,
    Other,
}

impl Product {
    /// Parse a wire-level product/type string
    ///
    /// Unknown strings map to `Other` rather than failing the response.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "suburban" => Product::Suburban,
            "subway" => Product::Subway,
            "tram" => Product::Tram,
            "bus" => Product::Bus,
            "ferry" => Product::Ferry,
            "express" => Product::Express,
            "regional" | "train" => Product::Regional,
            _ => Product::Other,
        }
    }

    /// Short display label
    pub fn label(&self) -> &'static str {
        match self {
            Product::Suburban => "S-Bahn",
            Product::Subway => "U-Bahn",
            Product::Tram => "Tram",
            Product::Bus => "Bus",
            Product::Ferry => "Ferry",
            Product::Express => "Express",
            Product::Regional => "Regional",
            Product::Other => "Other",
        }
    }
}

/// A transit line (e.g. U8, M10, S41)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub name: String,
    pub product: Product,
}

impl Line {
    pub fn new(name: impl Into<String>, product: Product) -> Self {
        Self {
            name: name.into(),
            product,
        }
    }
}

/// A named transit stop, possibly without coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    /// Wire-level station kind ("stop", "major_hub", ...)
    pub kind: String,
    pub location: Option<Location>,
}

impl Station {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: "stop".to_string(),
            location: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(Location::new(latitude, longitude));
        self
    }

    pub fn has_location(&self) -> bool {
        self.location.is_some()
    }
}

/// Delay band reported after normalization, 1..=30 minutes
const DELAY_MIN_MINUTES: i64 = 1;
const DELAY_MAX_MINUTES: i64 = 30;

/// Raw delays above this are interpreted as seconds
const DELAY_SECONDS_THRESHOLD: i64 = 60;

/// Delays above this many minutes are highlighted as severe
const DELAY_SEVERE_MINUTES: i64 = 5;

/// A scheduled vehicle departure at a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Departure {
    pub line: Line,
    pub direction: String,
    /// Expected departure time; absent when the feed omits or garbles it
    pub when: Option<DateTime<Utc>>,
    /// Raw delay as reported by the backend (see `delay_minutes`)
    pub delay: Option<i64>,
    pub platform: Option<String>,
    pub remarks: Vec<String>,
}

impl Departure {
    /// Normalized delay in whole minutes, if it is worth showing
    ///
    /// The backend nominally reports seconds, but some feeds deliver
    /// minutes: raw values above 60 are treated as seconds and divided
    /// down, values of 60 or below are taken as minutes. Only 1..=30
    /// minutes survives; anything outside that band is noise.
    pub fn delay_minutes(&self) -> Option<i64> {
        let raw = self.delay?;
        if raw <= 0 {
            return None;
        }
        let minutes = if raw > DELAY_SECONDS_THRESHOLD {
            raw / 60
        } else {
            raw
        };
        if (DELAY_MIN_MINUTES..=DELAY_MAX_MINUTES).contains(&minutes) {
            Some(minutes)
        } else {
            None
        }
    }

    /// Display label for the normalized delay, e.g. `+2 min`
    pub fn delay_label(&self) -> Option<String> {
        self.delay_minutes().map(|m| format!("+{m} min"))
    }

    /// Whether the delay is large enough to highlight
    pub fn is_severely_delayed(&self) -> bool {
        self.delay_minutes()
            .is_some_and(|m| m > DELAY_SEVERE_MINUTES)
    }

    /// Countdown text for the board: "now", "7 min", or a Berlin clock time
    /// once the departure is more than an hour out. "--" when the feed gave
    /// no usable timestamp.
    pub fn countdown_label(&self, now: DateTime<Utc>) -> String {
        let Some(when) = self.when else {
            return "--".to_string();
        };
        let minutes = (when - now).num_minutes();
        if minutes <= 0 {
            "now".to_string()
        } else if minutes < 60 {
            format!("{minutes} min")
        } else {
            when.with_timezone(&Berlin).format("%H:%M").to_string()
        }
    }
}

/// Departures for one station, as fetched from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartureBoard {
    pub station: Station,
    pub departures: Vec<Departure>,
    /// Backend-reported realtime data age
    pub realtime_updated_at: Option<DateTime<Utc>>,
    /// When this client fetched the board
    pub fetched_at: DateTime<Utc>,
}

/// An upcoming stop of a radar vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stopover {
    pub name: String,
}

/// A vehicle currently moving inside the radar viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub line: Line,
    pub location: Location,
    pub direction: Option<String>,
    pub trip_id: Option<String>,
    pub next_stopovers: Vec<Stopover>,
}

/// One completed radar sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarSweep {
    pub vehicles: Vec<Vehicle>,
    pub swept_at: DateTime<Utc>,
}

/// Smallest half-span the viewport can zoom to, degrees
const VIEWPORT_MIN_SPAN: f64 = 0.005;

/// Largest half-span the viewport can zoom to, degrees
const VIEWPORT_MAX_SPAN: f64 = 1.0;

/// Fraction of the span moved per pan step
const VIEWPORT_PAN_STEP: f64 = 0.25;

/// The radar viewport: a latitude/longitude box standing in for the
/// visible map bounds of a graphical client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Box of `half_span` degrees around a center point
    pub fn around(latitude: f64, longitude: f64, half_span: f64) -> Self {
        Self {
            north: latitude + half_span,
            south: latitude - half_span,
            east: longitude + half_span,
            west: longitude - half_span,
        }
    }

    /// The default viewport over central Berlin
    pub fn home() -> Self {
        Self::around(radar::HOME_LATITUDE, radar::HOME_LONGITUDE, radar::HOME_SPAN)
    }

    pub fn center(&self) -> Location {
        Location::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    fn half_spans(&self) -> (f64, f64) {
        (
            (self.north - self.south) / 2.0,
            (self.east - self.west) / 2.0,
        )
    }

    /// Shift the box by whole pan steps (positive = north / east)
    pub fn panned(&self, north_steps: i32, east_steps: i32) -> Self {
        let (lat_span, lon_span) = self.half_spans();
        let dlat = f64::from(north_steps) * lat_span * 2.0 * VIEWPORT_PAN_STEP;
        let dlon = f64::from(east_steps) * lon_span * 2.0 * VIEWPORT_PAN_STEP;
        Self {
            north: self.north + dlat,
            south: self.south + dlat,
            east: self.east + dlon,
            west: self.west + dlon,
        }
    }

    /// Scale the box around its center; factors below 1 zoom in
    pub fn zoomed(&self, factor: f64) -> Self {
        let center = self.center();
        let (lat_span, lon_span) = self.half_spans();
        let lat_span = (lat_span * factor).clamp(VIEWPORT_MIN_SPAN, VIEWPORT_MAX_SPAN);
        let lon_span = (lon_span * factor).clamp(VIEWPORT_MIN_SPAN, VIEWPORT_MAX_SPAN);
        Self {
            north: center.latitude + lat_span,
            south: center.latitude - lat_span,
            east: center.longitude + lon_span,
            west: center.longitude - lon_span,
        }
    }

    pub fn contains(&self, location: &Location) -> bool {
        location.latitude <= self.north
            && location.latitude >= self.south
            && location.longitude <= self.east
            && location.longitude >= self.west
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::home()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn departure_with_delay(delay: Option<i64>) -> Departure {
        Departure {
            line: Line::new("U8", Product::Subway),
            direction: "Wittenau".to_string(),
            when: None,
            delay,
            platform: None,
            remarks: Vec::new(),
        }
    }

    // ---- Product parsing ----

    #[test]
    fn test_product_from_wire() {
        assert_eq!(Product::from_wire("suburban"), Product::Suburban);
        assert_eq!(Product::from_wire("subway"), Product::Subway);
        assert_eq!(Product::from_wire("tram"), Product::Tram);
        assert_eq!(Product::from_wire("bus"), Product::Bus);
        assert_eq!(Product::from_wire("ferry"), Product::Ferry);
        assert_eq!(Product::from_wire("express"), Product::Express);
        assert_eq!(Product::from_wire("regional"), Product::Regional);
    }

    #[test]
    fn test_product_from_wire_train_alias() {
        assert_eq!(Product::from_wire("train"), Product::Regional);
    }

    #[test]
    fn test_product_from_wire_case_and_whitespace() {
        assert_eq!(Product::from_wire(" Subway "), Product::Subway);
        assert_eq!(Product::from_wire("BUS"), Product::Bus);
    }

    #[test]
    fn test_product_from_wire_unknown() {
        assert_eq!(Product::from_wire("cablecar"), Product::Other);
        assert_eq!(Product::from_wire(""), Product::Other);
    }

    // ---- Delay normalization ----

    #[test]
    fn test_delay_seconds_converted_to_minutes() {
        // 125 seconds -> 2 whole minutes
        let dep = departure_with_delay(Some(125));
        assert_eq!(dep.delay_minutes(), Some(2));
        assert_eq!(dep.delay_label(), Some("+2 min".to_string()));
    }

    #[test]
    fn test_delay_out_of_band_discarded() {
        // 45 is at or below the seconds threshold, so it is taken as
        // minutes, and 45 minutes is outside the reported band
        let dep = departure_with_delay(Some(45));
        assert_eq!(dep.delay_minutes(), None);
        assert_eq!(dep.delay_label(), None);
    }

    #[test]
    fn test_delay_none_and_zero() {
        assert_eq!(departure_with_delay(None).delay_minutes(), None);
        assert_eq!(departure_with_delay(Some(0)).delay_minutes(), None);
    }

    #[test]
    fn test_delay_negative_discarded() {
        // Early departures are not shown as delays
        assert_eq!(departure_with_delay(Some(-60)).delay_minutes(), None);
    }

    #[test]
    fn test_delay_small_minutes_kept() {
        assert_eq!(departure_with_delay(Some(3)).delay_minutes(), Some(3));
        assert_eq!(departure_with_delay(Some(30)).delay_minutes(), Some(30));
    }

    #[test]
    fn test_delay_sixty_is_minutes_and_discarded() {
        assert_eq!(departure_with_delay(Some(60)).delay_minutes(), None);
    }

    #[test]
    fn test_delay_sixty_one_seconds_is_one_minute() {
        assert_eq!(departure_with_delay(Some(61)).delay_minutes(), Some(1));
    }

    #[test]
    fn test_delay_huge_seconds_discarded() {
        // 2 hours in seconds normalizes to 120 minutes, outside the band
        assert_eq!(departure_with_delay(Some(7200)).delay_minutes(), None);
    }

    #[test]
    fn test_delay_severity() {
        assert!(!departure_with_delay(Some(300)).is_severely_delayed()); // 5 min
        assert!(departure_with_delay(Some(360)).is_severely_delayed()); // 6 min
        assert!(!departure_with_delay(None).is_severely_delayed());
    }

    // ---- Countdown ----

    #[test]
    fn test_countdown_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut dep = departure_with_delay(None);
        dep.when = Some(now);
        assert_eq!(dep.countdown_label(now), "now");

        // Already departed
        dep.when = Some(now - chrono::Duration::minutes(2));
        assert_eq!(dep.countdown_label(now), "now");
    }

    #[test]
    fn test_countdown_minutes() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut dep = departure_with_delay(None);
        dep.when = Some(now + chrono::Duration::minutes(7));
        assert_eq!(dep.countdown_label(now), "7 min");
    }

    #[test]
    fn test_countdown_clock_time_beyond_an_hour() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut dep = departure_with_delay(None);
        dep.when = Some(now + chrono::Duration::minutes(90));
        // 13:30 UTC is 15:30 in Berlin (CEST)
        assert_eq!(dep.countdown_label(now), "15:30");
    }

    #[test]
    fn test_countdown_unknown_time() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let dep = departure_with_delay(None);
        assert_eq!(dep.countdown_label(now), "--");
    }

    // ---- Station ----

    #[test]
    fn test_station_without_location() {
        let station = Station::new("900000100003", "S+U Alexanderplatz");
        assert!(!station.has_location());
        assert_eq!(station.kind, "stop");
    }

    #[test]
    fn test_station_with_location() {
        let station = Station::new("900000100003", "S+U Alexanderplatz")
            .with_location(52.521508, 13.411267);
        assert!(station.has_location());
        let loc = station.location.unwrap();
        assert!((loc.latitude - 52.521508).abs() < 1e-9);
    }

    // ---- BoundingBox ----

    #[test]
    fn test_bbox_around_center() {
        let bbox = BoundingBox::around(52.52, 13.405, 0.05);
        assert!((bbox.north - 52.57).abs() < 1e-9);
        assert!((bbox.south - 52.47).abs() < 1e-9);
        assert!((bbox.east - 13.455).abs() < 1e-9);
        assert!((bbox.west - 13.355).abs() < 1e-9);
        let center = bbox.center();
        assert!((center.latitude - 52.52).abs() < 1e-9);
        assert!((center.longitude - 13.405).abs() < 1e-9);
    }

    #[test]
    fn test_bbox_contains() {
        let bbox = BoundingBox::home();
        assert!(bbox.contains(&Location::new(52.52, 13.405)));
        assert!(!bbox.contains(&Location::new(48.137, 11.575))); // Munich
    }

    #[test]
    fn test_bbox_pan_north() {
        let bbox = BoundingBox::around(52.52, 13.405, 0.04);
        let panned = bbox.panned(1, 0);
        assert!(panned.north > bbox.north);
        assert!(panned.south > bbox.south);
        assert!((panned.east - bbox.east).abs() < 1e-12);
        // Span unchanged
        assert!(((panned.north - panned.south) - (bbox.north - bbox.south)).abs() < 1e-9);
    }

    #[test]
    fn test_bbox_pan_west() {
        let bbox = BoundingBox::home();
        let panned = bbox.panned(0, -1);
        assert!(panned.west < bbox.west);
        assert!(panned.east < bbox.east);
    }

    #[test]
    fn test_bbox_zoom_in_shrinks() {
        let bbox = BoundingBox::home();
        let zoomed = bbox.zoomed(0.5);
        assert!((zoomed.north - zoomed.south) < (bbox.north - bbox.south));
        let center = zoomed.center();
        assert!((center.latitude - bbox.center().latitude).abs() < 1e-9);
    }

    #[test]
    fn test_bbox_zoom_clamps() {
        let bbox = BoundingBox::home();
        let tiny = bbox.zoomed(1e-9);
        assert!((tiny.north - tiny.south) / 2.0 >= VIEWPORT_MIN_SPAN - 1e-12);
        let huge = bbox.zoomed(1e9);
        assert!((huge.north - huge.south) / 2.0 <= VIEWPORT_MAX_SPAN + 1e-12);
    }

    #[test]
    fn test_bbox_default_is_home() {
        assert_eq!(BoundingBox::default(), BoundingBox::home());
    }
}
