//! # Proximity
//!
//! Shelter lookup around a point.
//!
//! 1. Size a lat/lon box around the center.
//! 2. Ask the shelter API for whatever lies inside the box.
//! 3. Drop anything farther than the radius by great-circle distance.
//!
//! The box is a superset of the circle, so step 3 always runs.

pub mod error;
pub mod geodesy;
pub mod models;
pub mod point;
pub mod remote;
pub mod search;

pub use error::{GeoError, SearchError};
pub use point::{BoundingBox, GeoPoint};
pub use remote::{PointSource, RemoteShelters};
pub use search::{QueryRadius, SearchRequest, SearchResult, Shelter, ShelterSearch};
