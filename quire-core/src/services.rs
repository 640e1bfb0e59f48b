use crate::{
    authoring::Authoring,
    cache::FeedCache,
    comments::Comments,
    error::{NotFoundError, Result},
    feed::FeedBuilder,
    graph::SocialGraph,
    settings::FeedSettings,
};
use quire_common::model::user::{User, Username};
use quire_db::EntityStore;
use std::sync::Arc;

/// Everything a request handler needs, constructed once at startup.
pub struct Services {
    store: Arc<dyn EntityStore>,
    feeds: FeedBuilder,
    graph: SocialGraph,
    comments: Comments,
    authoring: Authoring,
}

impl Services {
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>, settings: FeedSettings) -> Self {
        Self::with_cache(store, Arc::new(FeedCache::new()), settings)
    }

    #[must_use]
    pub fn with_cache(
        store: Arc<dyn EntityStore>,
        cache: Arc<FeedCache>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            feeds: FeedBuilder::new(Arc::clone(&store), cache, settings),
            graph: SocialGraph::new(Arc::clone(&store)),
            comments: Comments::new(Arc::clone(&store)),
            authoring: Authoring::new(Arc::clone(&store)),
            store,
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn feeds(&self) -> &FeedBuilder {
        &self.feeds
    }

    #[must_use]
    pub fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    #[must_use]
    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    #[must_use]
    pub fn authoring(&self) -> &Authoring {
        &self.authoring
    }

    pub async fn user_by_username(&self, username: &Username) -> Result<User> {
        let user = self
            .store
            .fetch_user_by_username(username)
            .await?
            .ok_or_else(|| NotFoundError::UserByUsername(username.clone()))?;
        Ok(user)
    }
}
