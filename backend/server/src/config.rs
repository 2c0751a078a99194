use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use anyhow::{Context, Error, anyhow};
use proximity::{QueryRadius, models::DEFAULT_ENDPOINT};
use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub redis_retries: u32,
    pub redis_retry_delay: Duration,
    pub secret_key: String,
    pub service_key: String,
    pub shelter_url: String,
    pub shelter_timeout: Duration,
    pub shelter_page_size: u32,
    pub shelter_query_radius: QueryRadius,
    pub redirect_url: String,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        Ok(Self {
            port: try_load("RUST_PORT", "8000")?,
            redis_url: try_load("REDIS_URL", "redis://redis:6379")?,
            redis_retries: try_load("REDIS_RETRIES", "30")?,
            redis_retry_delay: Duration::from_secs(try_load("REDIS_RETRY_DELAY_SECS", "20")?),
            secret_key: read_secret("SECRET_KEY")?,
            service_key: read_secret("SERVICE_KEY")?,
            shelter_url: try_load("SHELTER_API_URL", DEFAULT_ENDPOINT)?,
            shelter_timeout: Duration::from_millis(try_load("SHELTER_TIMEOUT_MS", "5000")?),
            shelter_page_size: try_load("SHELTER_PAGE_SIZE", "5")?,
            shelter_query_radius: try_load("SHELTER_QUERY_RADIUS", "5000")?,
            redirect_url: try_load("LOGIN_REDIRECT_URL", "/")?,
        })
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, Error>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

/// Docker secret first, then a plain environment variable.
fn read_secret(secret_name: &str) -> Result<String, Error> {
    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(s) => Ok(s.trim().to_string()),
        Err(e) => {
            warn!("Failed to read {secret_name} from file: {e}");

            env::var(secret_name)
                .map(|s| s.trim().to_string())
                .with_context(|| format!("{secret_name} missing from /run/secrets and environment"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let port: u16 = try_load("SAFESPOT_TEST_UNSET_PORT", "8000").unwrap();
        let radius: QueryRadius = try_load("SAFESPOT_TEST_UNSET_RADIUS", "requested").unwrap();

        assert_eq!(port, 8000);
        assert_eq!(radius, QueryRadius::Requested);
    }

    #[test]
    fn test_bad_default_is_an_error() {
        let port = try_load::<u16>("SAFESPOT_TEST_UNSET_PORT", "eighty");

        assert!(port.unwrap_err().to_string().contains("SAFESPOT_TEST_UNSET_PORT"));
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        assert!(read_secret("SAFESPOT_TEST_UNSET_SECRET").is_err());
    }
}
