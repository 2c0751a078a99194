//! # Redis
//!
//! Users and their saved locations.
//!
//! ## Layout
//!
//! - `users`: hash of username -> user JSON (id + password hash)
//! - `usernames`: hash of user id -> username, for session lookups
//! - `locations:{user_id}`: hash of location id -> location JSON
//! - `next_user_id`, `next_location_id`: `INCR` counters
//!
//! Usernames are claimed with `HSETNX`, so two concurrent registrations of the
//! same name cannot both win. A losing registration burns one user id. The
//! id -> username entry is written before the claim, so a claimed name always
//! has a user that sessions can resolve.
use std::{sync::LazyLock, time::Duration};

use async_trait::async_trait;
use proximity::GeoPoint;
use redis::{
    AsyncCommands, Client, RedisError, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::AppError;

pub type UserId = u64;
pub type LocationId = u64;

pub const USERS_KEY: &str = "users";
pub const USERNAMES_KEY: &str = "usernames";
pub const NEXT_USER_ID_KEY: &str = "next_user_id";
pub const NEXT_LOCATION_ID_KEY: &str = "next_location_id";

/// Rewrites a hash field only if it still exists. Returns 1 when written.
pub const UPDATE_IF_PRESENT_SCRIPT_BODY: &str = r"
if redis.call('HEXISTS', KEYS[1], ARGV[1]) == 1 then
    redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
    return 1
end
return 0
";

static UPDATE_IF_PRESENT_SCRIPT: LazyLock<Script> =
    LazyLock::new(|| Script::new(UPDATE_IF_PRESENT_SCRIPT_BODY));

pub fn locations_key(user_id: UserId) -> String {
    format!("locations:{user_id}")
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SavedLocation {
    pub id: LocationId,
    pub lat: f64,
    pub lon: f64,
    pub description: Option<String>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// `None` when the username is already taken.
    async fn create_user(&self, username: &str, password_hash: &str)
    -> Result<Option<User>, AppError>;

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn user_exists(&self, user_id: UserId) -> Result<bool, AppError>;

    async fn save_location(
        &self,
        user_id: UserId,
        point: GeoPoint,
        description: Option<String>,
    ) -> Result<SavedLocation, AppError>;

    /// Oldest first.
    async fn list_locations(&self, user_id: UserId) -> Result<Vec<SavedLocation>, AppError>;

    /// `false` when the user has no such location.
    async fn delete_location(
        &self,
        user_id: UserId,
        location_id: LocationId,
    ) -> Result<bool, AppError>;

    async fn update_description(
        &self,
        user_id: UserId,
        location_id: LocationId,
        description: Option<String>,
    ) -> Result<Option<SavedLocation>, AppError>;
}

pub async fn init_redis(
    redis_url: &str,
    retries: u32,
    retry_delay: Duration,
) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url)?;
    let mut attempt = 1;

    loop {
        match client
            .get_connection_manager_with_config(config.clone())
            .await
        {
            Ok(connection_manager) => {
                info!("Connected to Redis");
                return Ok(connection_manager);
            }
            Err(e) if attempt < retries => {
                warn!("Redis connection failed ({attempt}/{retries}): {e}");
                attempt += 1;
                sleep(retry_delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| AppError::InternalError(Box::new(e)))
}

fn decode<T: for<'de> Deserialize<'de>>(raw: &str) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|e| AppError::InternalError(Box::new(e)))
}

#[async_trait]
impl Store for RedisStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let mut conn = self.connection.clone();

        let id: UserId = conn.incr(NEXT_USER_ID_KEY, 1).await?;
        let user = User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };

        let _: () = conn.hset(USERNAMES_KEY, id, username).await?;

        let claimed: bool = conn.hset_nx(USERS_KEY, username, encode(&user)?).await?;
        if !claimed {
            let _: () = conn.hdel(USERNAMES_KEY, id).await?;
            return Ok(None);
        }

        Ok(Some(user))
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        let mut conn = self.connection.clone();

        let raw: Option<String> = conn.hget(USERS_KEY, username).await?;

        raw.as_deref().map(decode::<User>).transpose()
    }

    async fn user_exists(&self, user_id: UserId) -> Result<bool, AppError> {
        let mut conn = self.connection.clone();

        Ok(conn.hexists(USERNAMES_KEY, user_id).await?)
    }

    async fn save_location(
        &self,
        user_id: UserId,
        point: GeoPoint,
        description: Option<String>,
    ) -> Result<SavedLocation, AppError> {
        let mut conn = self.connection.clone();

        let id: LocationId = conn.incr(NEXT_LOCATION_ID_KEY, 1).await?;
        let location = SavedLocation {
            id,
            lat: point.lat(),
            lon: point.lon(),
            description,
        };

        let _: () = conn
            .hset(locations_key(user_id), id, encode(&location)?)
            .await?;

        Ok(location)
    }

    async fn list_locations(&self, user_id: UserId) -> Result<Vec<SavedLocation>, AppError> {
        let mut conn = self.connection.clone();

        let raw: Vec<String> = conn.hvals(locations_key(user_id)).await?;

        let mut locations = raw
            .iter()
            .map(|r| decode::<SavedLocation>(r))
            .collect::<Result<Vec<_>, _>>()?;
        locations.sort_by_key(|l| l.id);

        Ok(locations)
    }

    async fn delete_location(
        &self,
        user_id: UserId,
        location_id: LocationId,
    ) -> Result<bool, AppError> {
        let mut conn = self.connection.clone();

        let removed: u32 = conn.hdel(locations_key(user_id), location_id).await?;

        Ok(removed > 0)
    }

    async fn update_description(
        &self,
        user_id: UserId,
        location_id: LocationId,
        description: Option<String>,
    ) -> Result<Option<SavedLocation>, AppError> {
        let mut conn = self.connection.clone();
        let key = locations_key(user_id);

        let raw: Option<String> = conn.hget(&key, location_id).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let mut location: SavedLocation = decode(&raw)?;
        location.description = description;

        // A delete may land between the read and the write.
        let written: bool = UPDATE_IF_PRESENT_SCRIPT
            .key(&key)
            .arg(location_id)
            .arg(encode(&location)?)
            .invoke_async(&mut conn)
            .await?;

        Ok(written.then_some(location))
    }
}
