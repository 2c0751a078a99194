use proximity::GeoPoint;

use crate::error::AppError::{self, MalformedPayload};

pub const MAX_USERNAME_LEN: usize = 100;
pub const MAX_PASSWORD_LEN: usize = 256;
pub const MAX_DESCRIPTION_LEN: usize = 500;

pub fn check_credentials(username: &str, password: &str) -> Result<(), AppError> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(MalformedPayload(format!(
            "Username must be 1-{MAX_USERNAME_LEN} characters"
        )));
    }

    if username.chars().any(char::is_whitespace) {
        return Err(MalformedPayload("Username must not contain spaces".into()));
    }

    if password.is_empty() || password.len() > MAX_PASSWORD_LEN {
        return Err(MalformedPayload(format!(
            "Password must be 1-{MAX_PASSWORD_LEN} bytes"
        )));
    }

    Ok(())
}

pub fn to_point(lat: f64, lon: f64) -> Result<GeoPoint, AppError> {
    GeoPoint::try_new(lat, lon).map_err(|e| MalformedPayload(e.to_string()))
}

/// Trims the description; blank ones are treated as absent.
pub fn clean_description(description: Option<String>) -> Result<Option<String>, AppError> {
    let Some(description) = description else {
        return Ok(None);
    };

    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(MalformedPayload(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }

    Ok(Some(trimmed.to_string()))
}
