use tracing::{error, info, warn};

use crate::clients::graph::GraphClient;
use crate::config::Config;
use crate::constants::logs::RATE_LIMIT_NOTICE;
use crate::db::Store;
use crate::error::Result;
use crate::models::artifact::{ArtifactName, RunStamp};
use crate::services::persist::{Artifacts, ResponsePersister};

/// What to fetch in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Hashtag to search, without `#`
    pub query: String,

    pub limit: u32,

    /// Account looked up through business discovery
    pub username: String,
}

impl FetchRequest {
    /// Hashtag and business-discovery target share the same name.
    pub fn new(query: impl Into<String>, limit: u32) -> Self {
        let query = query.into();
        Self {
            username: query.clone(),
            query,
            limit,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }
}

/// Outcome of both branches of a run. A failed branch never prevents the
/// other one from running.
#[derive(Debug)]
pub struct RunReport {
    pub hashtag: Result<Artifacts>,
    pub business: Result<Artifacts>,
}

impl RunReport {
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.hashtag.is_ok() && self.business.is_ok()
    }
}

/// Sequences hashtag resolution, recent-media and business-discovery fetches
/// and hands every response to the persister.
pub struct Pipeline {
    client: GraphClient,
    persister: ResponsePersister,
    database_url: String,
}

impl Pipeline {
    pub const fn new(client: GraphClient, persister: ResponsePersister, database_url: String) -> Self {
        Self {
            client,
            persister,
            database_url,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            GraphClient::new(&config.graph)?,
            ResponsePersister::new(&config.storage.data_dir),
            config.storage.database_path.clone(),
        ))
    }

    pub async fn run(&self, request: &FetchRequest, stamp: RunStamp) -> RunReport {
        warn!("{}", RATE_LIMIT_NOTICE);

        let hashtag = self.hashtag_media(request, stamp).await;
        match &hashtag {
            Ok(artifacts) => info!(
                query = %request.query,
                posts = artifacts.posts,
                "Hashtag media saved"
            ),
            Err(e) => error!(query = %request.query, error = %e, "Hashtag media fetch failed"),
        }

        let business = self.business_discovery(request, stamp).await;
        match &business {
            Ok(artifacts) => info!(
                username = %request.username,
                posts = artifacts.posts,
                "Business discovery media saved"
            ),
            Err(e) => error!(
                username = %request.username,
                error = %e,
                "Business discovery fetch failed"
            ),
        }

        RunReport { hashtag, business }
    }

    /// Hashtag branch. Holds one store connection for its whole duration and
    /// releases it whatever the outcome.
    pub async fn hashtag_media(&self, request: &FetchRequest, stamp: RunStamp) -> Result<Artifacts> {
        let store = Store::open(&self.database_url).await?;
        let outcome = self.hashtag_media_with(&store, request, stamp).await;

        if let Err(e) = store.close().await {
            warn!(error = %e, "Failed to close hashtag database");
        }

        outcome
    }

    async fn hashtag_media_with(
        &self,
        store: &Store,
        request: &FetchRequest,
        stamp: RunStamp,
    ) -> Result<Artifacts> {
        let hashtag_id = self.resolve_hashtag_id(store, &request.query).await?;

        let response = self
            .client
            .fetch_recent_media(&hashtag_id, request.limit)
            .await?;

        let name = ArtifactName::new(&request.query, request.limit, stamp);
        self.persister.save(&name, &response).await
    }

    async fn resolve_hashtag_id(&self, store: &Store, query: &str) -> Result<String> {
        if let Some(id) = store.lookup_hashtag_id(query).await? {
            info!(query, id = %id, "ig_hashtag_id already cached");
            return Ok(id);
        }

        let lookup = self.client.resolve_hashtag_id(query).await?;

        match store.store_hashtag_id(&lookup.query, &lookup.id).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate_key() => {
                warn!(query, error = %e, "Hashtag id already recorded");
            }
            Err(e) => return Err(e),
        }

        Ok(lookup.id)
    }

    pub async fn business_discovery(&self, request: &FetchRequest, stamp: RunStamp) -> Result<Artifacts> {
        let response = self
            .client
            .fetch_business_discovery(&request.username, request.limit)
            .await?;

        let name = ArtifactName::business(&request.username, request.limit, stamp);
        self.persister.save(&name, &response).await
    }
}
