//! # Shelter API payloads
//!
//! The upstream names longitude bounds `*Lot` and latitude bounds `*Lat`.
//! Coordinates in the response arrive as strings most of the time, but numbers
//! show up too, so both are accepted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::SearchError, point::BoundingBox};

pub const DEFAULT_ENDPOINT: &str = "https://www.safetydata.go.kr/V2/api/DSSP-IF-10944";
pub const DEFAULT_NAME: &str = "이름 없음";
pub const DEFAULT_ADDRESS: &str = "주소 없음";

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShelterQuery<'a> {
    pub service_key: &'a str,
    pub return_type: &'static str,
    pub page_no: u32,
    pub num_of_rows: u32,
    pub start_lot: f64,
    pub end_lot: f64,
    pub start_lat: f64,
    pub end_lat: f64,
}

impl<'a> ShelterQuery<'a> {
    pub fn new(service_key: &'a str, bbox: &BoundingBox, page_size: u32) -> Self {
        Self {
            service_key,
            return_type: "json",
            page_no: 1,
            num_of_rows: page_size,
            start_lot: bbox.min_lon,
            end_lot: bbox.max_lon,
            start_lat: bbox.min_lat,
            end_lat: bbox.max_lat,
        }
    }
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    body: Option<Value>,
}

/// Pulls the raw entries out of a response body.
///
/// Absent, null, empty-string and empty-array bodies all mean "nothing found".
/// Entries are left undecoded so one bad row cannot sink the rest.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<Value>, SearchError> {
    let response: Response = serde_json::from_slice(bytes)
        .map_err(|e| SearchError::UpstreamMalformed(e.to_string()))?;

    match response.body {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Vec::new()),
        Some(Value::Array(entries)) => Ok(entries),
        Some(other) => Err(SearchError::UpstreamMalformed(format!(
            "expected `body` to be an array, got {other}"
        ))),
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum RawCoordinate {
    Number(f64),
    Text(String),
    Other(Value),
}

impl RawCoordinate {
    pub fn value(&self) -> Option<f64> {
        match self {
            RawCoordinate::Number(n) => Some(*n),
            RawCoordinate::Text(s) => s.trim().parse().ok(),
            RawCoordinate::Other(_) => None,
        }
        .filter(|v: &f64| v.is_finite())
    }
}

#[derive(Deserialize, Debug)]
pub struct RawShelter {
    #[serde(rename = "LA")]
    pub lat: Option<RawCoordinate>,

    #[serde(rename = "LO")]
    pub lon: Option<RawCoordinate>,

    #[serde(rename = "SHNT_PLACE_NM")]
    pub name: Option<Value>,

    #[serde(rename = "SHNT_PLACE_DTL_POSITION")]
    pub address: Option<Value>,
}

fn text_or(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}

impl RawShelter {
    /// Falls back to [`DEFAULT_NAME`] unless the upstream sent a string.
    pub fn name(&self) -> String {
        text_or(self.name.as_ref(), DEFAULT_NAME)
    }

    /// Falls back to [`DEFAULT_ADDRESS`] unless the upstream sent a string.
    pub fn address(&self) -> String {
        text_or(self.address.as_ref(), DEFAULT_ADDRESS)
    }
}
