use std::sync::Arc;

use anyhow::Error;
use proximity::{PointSource, RemoteShelters, ShelterSearch};

use super::{
    auth::SessionSigner,
    config::Config,
    database::{RedisStore, Store, init_redis},
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub sessions: SessionSigner,
    pub shelters: ShelterSearch,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>, Error> {
        let redis_connection = init_redis(
            &config.redis_url,
            config.redis_retries,
            config.redis_retry_delay,
        )
        .await?;

        let source = RemoteShelters::new(
            &config.shelter_url,
            &config.service_key,
            config.shelter_timeout,
        )?;

        Self::from_parts(
            config,
            Arc::new(RedisStore::new(redis_connection)),
            Arc::new(source),
        )
    }

    pub fn from_parts(
        config: Config,
        store: Arc<dyn Store>,
        source: Arc<dyn PointSource>,
    ) -> Result<Arc<Self>, Error> {
        let sessions = SessionSigner::new(&config.secret_key)?;
        let shelters = ShelterSearch::new(
            source,
            config.shelter_query_radius,
            config.shelter_page_size,
        );

        Ok(Arc::new(Self {
            config,
            store,
            sessions,
            shelters,
        }))
    }
}
