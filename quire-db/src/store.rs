use crate::error::Result;
use async_trait::async_trait;
use quire_common::{
    model::{
        Id,
        comment::{Comment, CreateComment},
        follow::Follow,
        group::{CreateGroup, Group, GroupMarker, Slug},
        post::{CreatePost, Post, PostContent, PostMarker},
        user::{CreateUser, User, UserMarker, Username},
    },
    pagination::Window,
};

/// Which posts a listing draws from.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum PostFilter {
    All,
    Group(Id<GroupMarker>),
    Author(Id<UserMarker>),
    /// Posts whose author is followed by the given user.
    FollowedBy(Id<UserMarker>),
}

/// Durable records of users, groups, posts, comments and follow edges.
///
/// Post listings are ordered newest first, ties broken by descending id.
/// Comment listings are ordered oldest first.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create_user(&self, user: &CreateUser) -> Result<User>;

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>>;

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>>;

    async fn create_group(&self, group: &CreateGroup) -> Result<Group>;

    async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>>;

    async fn fetch_group_by_slug(&self, slug: &Slug) -> Result<Option<Group>>;

    async fn create_post(&self, post: &CreatePost) -> Result<Post>;

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>>;

    /// Replaces the author-controlled content. Author and creation time stay.
    /// `None` if the post does not exist.
    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        content: &PostContent,
    ) -> Result<Option<Post>>;

    /// Removes the post together with its comments.
    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool>;

    async fn list_posts(&self, filter: PostFilter, window: Window) -> Result<Vec<Post>>;

    async fn count_posts(&self, filter: PostFilter) -> Result<u64>;

    async fn posts_by_author(&self, author: Id<UserMarker>) -> Result<Vec<Post>> {
        self.list_posts(PostFilter::Author(author), Window::ALL)
            .await
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment>;

    async fn list_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>>;

    async fn count_comments(&self, post_id: Id<PostMarker>) -> Result<u64>;

    /// `false` if the edge already existed.
    async fn insert_follow(&self, follow: Follow) -> Result<bool>;

    /// `false` if there was no such edge.
    async fn delete_follow(&self, follow: Follow) -> Result<bool>;

    async fn follow_exists(&self, follow: Follow) -> Result<bool>;

    async fn count_followers(&self, user_id: Id<UserMarker>) -> Result<u64>;

    async fn count_following(&self, user_id: Id<UserMarker>) -> Result<u64>;

    async fn follow_edges_from(&self, follower: Id<UserMarker>) -> Result<Vec<Follow>>;
}
