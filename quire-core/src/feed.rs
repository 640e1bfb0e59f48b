use crate::{
    cache::{FeedCache, FeedCacheKey},
    error::{BoxError, CoreError, NotFoundError, Result},
    settings::FeedSettings,
};
use bytes::Bytes;
use quire_common::{
    model::{
        Id,
        group::Slug,
        post::Post,
        user::{UserMarker, Username},
    },
    pagination::{PageInfo, PageNumber},
};
use quire_db::{EntityStore, PostFilter};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Selection mode of a feed.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum FeedKind {
    All,
    ByGroup(Slug),
    ByAuthor(Username),
    /// Posts by the authors this user follows.
    Following(Id<UserMarker>),
}

/// One page of a feed. `total_count` counts the whole feed, not the page.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct FeedPage {
    pub items: Vec<Post>,
    pub total_count: u64,
    pub page_info: PageInfo,
}

pub struct FeedBuilder {
    store: Arc<dyn EntityStore>,
    cache: Arc<FeedCache>,
    settings: FeedSettings,
}

impl FeedBuilder {
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>, cache: Arc<FeedCache>, settings: FeedSettings) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    #[must_use]
    pub fn settings(&self) -> FeedSettings {
        self.settings
    }

    async fn resolve(&self, kind: &FeedKind) -> Result<PostFilter> {
        let filter = match kind {
            FeedKind::All => PostFilter::All,
            FeedKind::ByGroup(slug) => {
                let group = self
                    .store
                    .fetch_group_by_slug(slug)
                    .await?
                    .ok_or_else(|| NotFoundError::GroupBySlug(slug.clone()))?;
                PostFilter::Group(group.id)
            }
            FeedKind::ByAuthor(username) => {
                let author = self
                    .store
                    .fetch_user_by_username(username)
                    .await?
                    .ok_or_else(|| NotFoundError::UserByUsername(username.clone()))?;
                PostFilter::Author(author.id)
            }
            FeedKind::Following(user_id) => {
                self.store
                    .fetch_user(*user_id)
                    .await?
                    .ok_or(NotFoundError::UserById(*user_id))?;
                PostFilter::FollowedBy(*user_id)
            }
        };
        Ok(filter)
    }

    /// Builds one page of `kind`, newest posts first.
    ///
    /// Fails with [`NotFoundError`] if the group, author or follower does not
    /// exist. A page past the end is empty but still carries the true total.
    pub async fn build_feed(&self, kind: &FeedKind, page: PageNumber) -> Result<FeedPage> {
        let filter = self.resolve(kind).await?;
        self.build_filtered(filter, page).await
    }

    pub(crate) async fn build_filtered(
        &self,
        filter: PostFilter,
        page: PageNumber,
    ) -> Result<FeedPage> {
        let total_count = self.store.count_posts(filter).await?;
        let page_info = PageInfo::new(page, self.settings.page_size, total_count);

        let items = if page_info.is_out_of_range() {
            Vec::new()
        } else {
            self.store
                .list_posts(filter, page.window(self.settings.page_size))
                .await?
        };

        Ok(FeedPage {
            items,
            total_count,
            page_info,
        })
    }

    /// The home feed page as rendered by `render`, served from the cache while
    /// a rendering younger than the configured TTL exists.
    ///
    /// A hit does not touch the store at all, so the returned bytes (counts
    /// included) may be stale by up to one TTL.
    pub async fn render_home<F>(&self, page: PageNumber, render: F) -> Result<Bytes>
    where
        F: FnOnce(&FeedPage) -> Result<Bytes, BoxError>,
    {
        let key = FeedCacheKey {
            kind: FeedKind::All,
            page,
        };
        if let Some(rendered) = self.cache.get(&key).await {
            debug!(%page, "Home feed cache hit");
            return Ok(rendered);
        }

        debug!(%page, "Home feed cache miss");
        let feed = self.build_feed(&FeedKind::All, page).await?;
        let rendered = render(&feed).map_err(CoreError::Render)?;
        self.cache
            .put(key, rendered.clone(), self.settings.home_cache_ttl())
            .await;

        Ok(rendered)
    }
}
