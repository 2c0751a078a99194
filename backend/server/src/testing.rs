use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use proximity::{BoundingBox, GeoPoint, PointSource, QueryRadius, SearchError};
use serde_json::Value;

use crate::{
    config::Config,
    database::{LocationId, SavedLocation, Store, User, UserId},
    error::AppError,
    state::State,
};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    locations: HashMap<UserId, BTreeMap<LocationId, SavedLocation>>,
    next_user_id: UserId,
    next_location_id: LocationId,
}

/// In-memory stand-in for the Redis store.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.lock().unwrap();

        // Losing registrations burn an id, as with Redis.
        tables.next_user_id += 1;
        if tables.users.contains_key(username) {
            return Ok(None);
        }

        let user = User {
            id: tables.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.users.insert(username.to_string(), user.clone());

        Ok(Some(user))
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.tables.lock().unwrap().users.get(username).cloned())
    }

    async fn user_exists(&self, user_id: UserId) -> Result<bool, AppError> {
        let tables = self.tables.lock().unwrap();

        Ok(tables.users.values().any(|u| u.id == user_id))
    }

    async fn save_location(
        &self,
        user_id: UserId,
        point: GeoPoint,
        description: Option<String>,
    ) -> Result<SavedLocation, AppError> {
        let mut tables = self.tables.lock().unwrap();

        tables.next_location_id += 1;
        let location = SavedLocation {
            id: tables.next_location_id,
            lat: point.lat(),
            lon: point.lon(),
            description,
        };
        tables
            .locations
            .entry(user_id)
            .or_default()
            .insert(location.id, location.clone());

        Ok(location)
    }

    async fn list_locations(&self, user_id: UserId) -> Result<Vec<SavedLocation>, AppError> {
        let tables = self.tables.lock().unwrap();

        Ok(tables
            .locations
            .get(&user_id)
            .map(|l| l.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_location(
        &self,
        user_id: UserId,
        location_id: LocationId,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().unwrap();

        Ok(tables
            .locations
            .get_mut(&user_id)
            .and_then(|l| l.remove(&location_id))
            .is_some())
    }

    async fn update_description(
        &self,
        user_id: UserId,
        location_id: LocationId,
        description: Option<String>,
    ) -> Result<Option<SavedLocation>, AppError> {
        let mut tables = self.tables.lock().unwrap();

        let Some(location) = tables
            .locations
            .get_mut(&user_id)
            .and_then(|l| l.get_mut(&location_id))
        else {
            return Ok(None);
        };
        location.description = description;

        Ok(Some(location.clone()))
    }
}

/// Shelter API stand-in returning canned entries, or a canned failure.
pub struct StubSource {
    pub entries: Vec<Value>,
    pub fail: Option<fn() -> SearchError>,
}

#[async_trait]
impl PointSource for StubSource {
    async fn fetch(&self, _bbox: &BoundingBox, _page_size: u32) -> Result<Vec<Value>, SearchError> {
        match self.fail {
            Some(fail) => Err(fail()),
            None => Ok(self.entries.clone()),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        redis_url: "redis://localhost:6379".to_string(),
        redis_retries: 1,
        redis_retry_delay: Duration::ZERO,
        secret_key: "test-secret".to_string(),
        service_key: "test-service-key".to_string(),
        shelter_url: "http://localhost:9/shelters".to_string(),
        shelter_timeout: Duration::from_millis(100),
        shelter_page_size: 5,
        shelter_query_radius: QueryRadius::default(),
        redirect_url: "/".to_string(),
    }
}

pub fn test_state(source: StubSource) -> Arc<State> {
    State::from_parts(
        test_config(),
        Arc::new(MemoryStore::default()),
        Arc::new(source),
    )
    .unwrap()
}
