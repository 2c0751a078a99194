use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    #[error("Latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("Longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("Latitude {0} is too close to a pole to compute a longitude offset")]
    DegenerateLatitude(f64),
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shelter service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Shelter service timed out")]
    UpstreamTimeout,

    #[error("Shelter service returned an unexpected payload: {0}")]
    UpstreamMalformed(String),
}

impl From<GeoError> for SearchError {
    fn from(error: GeoError) -> Self {
        SearchError::InvalidInput(error.to_string())
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(error: reqwest::Error) -> Self {
        // The request URL carries the service key.
        let error = error.without_url();

        if error.is_timeout() {
            return SearchError::UpstreamTimeout;
        }

        if error.is_decode() {
            return SearchError::UpstreamMalformed(error.to_string());
        }

        SearchError::UpstreamUnavailable(error.to_string())
    }
}
