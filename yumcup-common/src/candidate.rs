//! Candidate (venue) schema
//!
//! Candidates arrive from several sources whose field names drifted over
//! time (`priceLevel` vs `priceRange`, `weekdayText` vs `openingHours`,
//! numeric vs string ids and distances). Everything is normalized here, at
//! the boundary, into one schema with explicit optional fields. Engine code
//! only ever sees [`Candidate`].
//!
//! Missing optional attributes serialize as `null` and render as "unknown";
//! they are never an error. Only a missing `id` is rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geo::Coordinates;

/// Display text for an attribute with no value
pub const UNKNOWN: &str = "unknown";

/// Price tier, 0 (free) through 4 (very expensive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceLevel {
    Free,
    Inexpensive,
    Moderate,
    Expensive,
    VeryExpensive,
}

impl PriceLevel {
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(PriceLevel::Free),
            1 => Some(PriceLevel::Inexpensive),
            2 => Some(PriceLevel::Moderate),
            3 => Some(PriceLevel::Expensive),
            4 => Some(PriceLevel::VeryExpensive),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            PriceLevel::Free => 0,
            PriceLevel::Inexpensive => 1,
            PriceLevel::Moderate => 2,
            PriceLevel::Expensive => 3,
            PriceLevel::VeryExpensive => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceLevel::Free => "free",
            PriceLevel::Inexpensive => "inexpensive",
            PriceLevel::Moderate => "moderate",
            PriceLevel::Expensive => "expensive",
            PriceLevel::VeryExpensive => "very expensive",
        }
    }

    /// Accepts an integer tier, a numeric string, a label, or a run of `$`/`₩`
    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().and_then(Self::from_level),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(level) = s.parse::<i64>() {
                    return Self::from_level(level);
                }
                if !s.is_empty() && s.chars().all(|c| c == '$' || c == '₩') {
                    return Self::from_level(s.chars().count() as i64);
                }
                let lower = s.to_lowercase().replace(['_', '-'], " ");
                [
                    PriceLevel::Free,
                    PriceLevel::Inexpensive,
                    PriceLevel::Moderate,
                    PriceLevel::Expensive,
                    PriceLevel::VeryExpensive,
                ]
                .into_iter()
                .find(|p| p.label() == lower)
            }
            _ => None,
        }
    }
}

/// A venue taking part in a bracket. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCandidate", into = "CandidateWire")]
pub struct Candidate {
    /// Opaque catalog identity
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    /// Meters from the search center
    pub distance: Option<u32>,
    pub address: Option<String>,
    pub road_address: Option<String>,
    pub phone: Option<String>,
    pub place_url: Option<String>,
    pub photo_url: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
    pub price_level: Option<PriceLevel>,
    pub is_open_now: Option<bool>,
    /// Per-weekday opening hour lines; empty when unknown
    pub opening_hours: Vec<String>,
    pub location: Option<Coordinates>,
}

impl Candidate {
    /// Minimal candidate with every optional attribute unknown
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            distance: None,
            address: None,
            road_address: None,
            phone: None,
            place_url: None,
            photo_url: None,
            rating: None,
            rating_count: None,
            price_level: None,
            is_open_now: None,
            opening_hours: Vec::new(),
            location: None,
        }
    }

    /// Price label, or "unknown"
    pub fn price_label(&self) -> &'static str {
        self.price_level.map(PriceLevel::label).unwrap_or(UNKNOWN)
    }

    /// Category for display, or "unknown"
    pub fn category_or_unknown(&self) -> &str {
        self.category.as_deref().unwrap_or(UNKNOWN)
    }
}

/// Outbound JSON shape
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CandidateWire {
    id: String,
    name: String,
    category: Option<String>,
    distance: Option<u32>,
    address: Option<String>,
    road_address: Option<String>,
    phone: Option<String>,
    place_url: Option<String>,
    photo_url: Option<String>,
    rating: Option<f64>,
    rating_count: Option<u32>,
    price_level: Option<u8>,
    price_label: &'static str,
    is_open_now: Option<bool>,
    opening_hours: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
}

impl From<Candidate> for CandidateWire {
    fn from(c: Candidate) -> Self {
        let price_label = c.price_label();
        Self {
            id: c.id,
            name: c.name,
            category: c.category,
            distance: c.distance,
            address: c.address,
            road_address: c.road_address,
            phone: c.phone,
            place_url: c.place_url,
            photo_url: c.photo_url,
            rating: c.rating,
            rating_count: c.rating_count,
            price_level: c.price_level.map(PriceLevel::level),
            price_label,
            is_open_now: c.is_open_now,
            opening_hours: c.opening_hours,
            latitude: c.location.map(|l| l.latitude),
            longitude: c.location.map(|l| l.longitude),
        }
    }
}

/// Inbound JSON shape, tolerant of every historic field spelling
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCandidate {
    id: Option<Value>,
    name: Option<String>,
    category: Option<String>,
    distance: Option<Value>,
    address: Option<String>,
    road_address: Option<String>,
    phone: Option<String>,
    place_url: Option<String>,
    photo_url: Option<String>,
    rating: Option<f64>,
    rating_count: Option<u32>,
    price_level: Option<Value>,
    price_range: Option<Value>,
    is_open_now: Option<bool>,
    weekday_text: Option<Vec<String>>,
    opening_hours: Option<Vec<String>>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl TryFrom<RawCandidate> for Candidate {
    type Error = String;

    fn try_from(raw: RawCandidate) -> Result<Self, Self::Error> {
        let id = match raw.id {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err("candidate is missing an id".to_string()),
        };

        let price_level = raw
            .price_level
            .as_ref()
            .and_then(PriceLevel::parse)
            .or_else(|| raw.price_range.as_ref().and_then(PriceLevel::parse));

        let location = match (raw.latitude, raw.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => None,
        };

        Ok(Candidate {
            id,
            name: non_empty(raw.name).unwrap_or_else(|| UNKNOWN.to_string()),
            category: non_empty(raw.category),
            distance: raw.distance.as_ref().and_then(parse_distance),
            address: non_empty(raw.address),
            road_address: non_empty(raw.road_address),
            phone: non_empty(raw.phone),
            place_url: non_empty(raw.place_url),
            photo_url: non_empty(raw.photo_url),
            rating: raw.rating.filter(|r| r.is_finite()),
            rating_count: raw.rating_count,
            price_level,
            is_open_now: raw.is_open_now,
            opening_hours: raw.weekday_text.or(raw.opening_hours).unwrap_or_default(),
            location,
        })
    }
}

/// Catalogs send "" for absent text fields
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Distance as a number or a numeric string, in meters
pub fn parse_distance(value: &Value) -> Option<u32> {
    let meters = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_meters)),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(whole_meters),
        _ => None,
    }?;
    u32::try_from(meters).ok()
}

/// Rounded meters for finite non-negative input
fn whole_meters(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0).then(|| f.round() as u64)
}
