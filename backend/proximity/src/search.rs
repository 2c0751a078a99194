//! # Shelter search
//!
//! Coarse box query upstream, then an exact great-circle filter locally.
//!
//! ## Known limitations
//! - The upstream only returns one page, so a crowded box is truncated before
//!   the distance filter runs. Raise `page_size` if that matters.
//! - With [`QueryRadius::Fixed`] the box ignores the requested radius. Larger
//!   requests miss shelters outside the fixed box, smaller ones fetch rows that
//!   get filtered out. [`QueryRadius::Requested`] scales the box instead.
//! - Boxes are not wrapped across the antimeridian.

use std::{fmt, str::FromStr, sync::Arc};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::SearchError,
    models::RawShelter,
    point::{BoundingBox, GeoPoint},
    remote::PointSource,
};

pub const DEFAULT_RADIUS: u32 = 5000;
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Radius used to size the upstream bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRadius {
    Fixed(u32),
    Requested,
}

impl Default for QueryRadius {
    fn default() -> Self {
        QueryRadius::Fixed(DEFAULT_RADIUS)
    }
}

impl QueryRadius {
    fn resolve(&self, requested: u32) -> u32 {
        match self {
            QueryRadius::Fixed(meters) => *meters,
            QueryRadius::Requested => requested,
        }
    }
}

impl FromStr for QueryRadius {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("requested") {
            return Ok(QueryRadius::Requested);
        }

        match s.parse::<u32>() {
            Ok(meters) if meters > 0 => Ok(QueryRadius::Fixed(meters)),
            _ => Err(format!(
                "expected a positive number of meters or \"requested\", got {s:?}"
            )),
        }
    }
}

impl fmt::Display for QueryRadius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryRadius::Fixed(meters) => write!(f, "{meters}"),
            QueryRadius::Requested => write!(f, "requested"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRequest {
    pub center: GeoPoint,
    pub radius_meters: u32,
}

impl SearchRequest {
    /// Validates raw query input before anything goes upstream.
    pub fn new(lat: f64, lon: f64, radius_meters: Option<i64>) -> Result<Self, SearchError> {
        let center = GeoPoint::try_new(lat, lon)?;

        let radius_meters = match radius_meters {
            None => DEFAULT_RADIUS,
            Some(r) if r > 0 => u32::try_from(r).map_err(|_| {
                SearchError::InvalidInput(format!("Radius {r} is too large"))
            })?,
            Some(r) => {
                return Err(SearchError::InvalidInput(format!(
                    "Radius must be positive, got {r}"
                )));
            }
        };

        Ok(Self {
            center,
            radius_meters,
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Shelter {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub distance: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
    pub radius: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub center: Center,
    pub shelters: Vec<Shelter>,
}

impl SearchResult {
    fn empty(request: &SearchRequest) -> Self {
        Self {
            center: Center {
                lat: request.center.lat(),
                lon: request.center.lon(),
                radius: request.radius_meters,
            },
            shelters: Vec::new(),
        }
    }
}

pub struct ShelterSearch {
    source: Arc<dyn PointSource>,
    query_radius: QueryRadius,
    page_size: u32,
}

impl ShelterSearch {
    pub fn new(source: Arc<dyn PointSource>, query_radius: QueryRadius, page_size: u32) -> Self {
        Self {
            source,
            query_radius,
            page_size,
        }
    }

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResult, SearchError> {
        let query_radius = self.query_radius.resolve(request.radius_meters);
        let bbox = BoundingBox::around(&request.center, f64::from(query_radius))?;

        debug!("Querying shelters in {bbox:?}");

        let entries = self.source.fetch(&bbox, self.page_size).await?;

        let mut result = SearchResult::empty(&request);
        if entries.is_empty() {
            return Ok(result);
        }

        let radius = f64::from(request.radius_meters);

        result.shelters = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| locate(&request.center, index, entry))
            .filter(|shelter| shelter.distance <= radius)
            .collect();

        result
            .shelters
            .sort_by(|a, b| a.distance.total_cmp(&b.distance));

        Ok(result)
    }
}

/// Decodes one upstream entry and measures it from `center`.
///
/// Entries without usable coordinates are skipped, never placed at (0, 0).
fn locate(center: &GeoPoint, index: usize, entry: Value) -> Option<Shelter> {
    let raw: RawShelter = match serde_json::from_value(entry) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Skipping shelter #{index}: undecodable entry: {e}");
            return None;
        }
    };

    let lat = raw.lat.as_ref().and_then(|c| c.value());
    let lon = raw.lon.as_ref().and_then(|c| c.value());

    let (Some(lat), Some(lon)) = (lat, lon) else {
        warn!(
            "Skipping shelter #{index} ({}): missing or non-numeric LA/LO",
            raw.name()
        );
        return None;
    };

    let point = match GeoPoint::try_new(lat, lon) {
        Ok(point) => point,
        Err(e) => {
            warn!("Skipping shelter #{index}: {e}");
            return None;
        }
    };

    Some(Shelter {
        name: raw.name(),
        address: raw.address(),
        lat,
        lon,
        distance: center.distance_to(&point),
    })
}
