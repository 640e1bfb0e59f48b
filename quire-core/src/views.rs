//! Read-only compositions backing the group, profile and post pages.

use crate::{
    error::{NotFoundError, Result},
    feed::FeedPage,
    services::Services,
};
use quire_common::{
    model::{
        Id,
        comment::Comment,
        group::{Group, Slug},
        post::{Post, PostMarker},
        user::{User, UserMarker, Username},
    },
    pagination::PageNumber,
};
use quire_db::PostFilter;
use serde::Serialize;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct GroupPage {
    pub group: Group,
    pub feed: FeedPage,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Profile {
    pub author: User,
    pub followers: u64,
    pub following: u64,
    /// Whether the viewer follows `author`. `None` for anonymous viewers.
    pub follows: Option<bool>,
    pub feed: FeedPage,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostView {
    pub post: Post,
    /// Number of posts by the same author.
    pub author_posts: u64,
    pub followers: u64,
    pub following: u64,
    pub follows: Option<bool>,
    pub comments: Vec<Comment>,
}

impl Services {
    pub async fn group_page(&self, slug: &Slug, page: PageNumber) -> Result<GroupPage> {
        let group = self
            .store()
            .fetch_group_by_slug(slug)
            .await?
            .ok_or_else(|| NotFoundError::GroupBySlug(slug.clone()))?;
        let feed = self
            .feeds()
            .build_filtered(PostFilter::Group(group.id), page)
            .await?;

        Ok(GroupPage { group, feed })
    }

    async fn follows(&self, viewer: Option<Id<UserMarker>>, author: &User) -> Result<Option<bool>> {
        match viewer {
            Some(viewer) => Ok(Some(self.graph().is_following(viewer, author.id).await?)),
            None => Ok(None),
        }
    }

    pub async fn profile(
        &self,
        username: &Username,
        viewer: Option<Id<UserMarker>>,
        page: PageNumber,
    ) -> Result<Profile> {
        let author = self.user_by_username(username).await?;
        let feed = self
            .feeds()
            .build_filtered(PostFilter::Author(author.id), page)
            .await?;

        Ok(Profile {
            followers: self.graph().follower_count(author.id).await?,
            following: self.graph().following_count(author.id).await?,
            follows: self.follows(viewer, &author).await?,
            author,
            feed,
        })
    }

    /// The post `post_id`, provided it was written by `username`.
    pub async fn find_post(&self, username: &Username, post_id: Id<PostMarker>) -> Result<Post> {
        let post = self
            .store()
            .fetch_post(post_id)
            .await?
            .filter(|post| &post.author.username == username)
            .ok_or(NotFoundError::PostById(post_id))?;
        Ok(post)
    }

    pub async fn post_view(
        &self,
        username: &Username,
        post_id: Id<PostMarker>,
        viewer: Option<Id<UserMarker>>,
    ) -> Result<PostView> {
        let post = self.find_post(username, post_id).await?;
        let author_id = post.author.id;

        Ok(PostView {
            author_posts: self.store().count_posts(PostFilter::Author(author_id)).await?,
            followers: self.graph().follower_count(author_id).await?,
            following: self.graph().following_count(author_id).await?,
            follows: self.follows(viewer, &post.author).await?,
            comments: self.comments().comments_for(post_id).await?,
            post,
        })
    }
}
