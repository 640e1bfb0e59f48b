use crate::{
    error::{DbError, Result, UniqueViolation},
    store::{EntityStore, PostFilter},
};
use async_trait::async_trait;
use quire_common::{
    model::{
        Id, QuireSnowflakeGenerator,
        comment::{Comment, CommentMarker, CreateComment},
        follow::Follow,
        group::{CreateGroup, Group, GroupMarker, Slug},
        post::{CreatePost, Post, PostContent, PostMarker},
        text::Text,
        user::{CreateUser, User, UserMarker, Username},
    },
    pagination::Window,
    snowflake::NodeId,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, PoisonError},
};
use time::OffsetDateTime;
use tokio::sync::RwLock;

#[derive(Clone, Debug)]
struct PostRow {
    author: Id<UserMarker>,
    content: PostContent,
    created_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
struct CommentRow {
    post: Id<PostMarker>,
    author: Id<UserMarker>,
    text: Text,
    created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<Id<UserMarker>, Username>,
    usernames: BTreeMap<Username, Id<UserMarker>>,
    groups: BTreeMap<Id<GroupMarker>, Group>,
    slugs: BTreeMap<Slug, Id<GroupMarker>>,
    posts: BTreeMap<Id<PostMarker>, PostRow>,
    comments: BTreeMap<Id<CommentMarker>, CommentRow>,
    follows: BTreeSet<Follow>,
}

impl Tables {
    fn user(&self, user_id: Id<UserMarker>) -> Result<User> {
        let username = self
            .users
            .get(&user_id)
            .ok_or(DbError::MissingReference("user"))?;
        Ok(User {
            id: user_id,
            username: username.clone(),
        })
    }

    fn group(&self, group_id: Id<GroupMarker>) -> Result<Group> {
        self.groups
            .get(&group_id)
            .cloned()
            .ok_or(DbError::MissingReference("group"))
    }

    fn check_content(&self, content: &PostContent) -> Result<()> {
        if let Some(group_id) = content.group {
            self.group(group_id)?;
        }
        Ok(())
    }

    fn post(&self, post_id: Id<PostMarker>, row: &PostRow) -> Result<Post> {
        Ok(Post {
            id: post_id,
            author: self.user(row.author)?,
            text: row.content.text.clone(),
            group: row.content.group.map(|group| self.group(group)).transpose()?,
            attachment: row.content.attachment.clone(),
            created_at: row.created_at,
        })
    }

    fn comment(&self, comment_id: Id<CommentMarker>, row: &CommentRow) -> Result<Comment> {
        Ok(Comment {
            id: comment_id,
            post: row.post,
            author: self.user(row.author)?,
            text: row.text.clone(),
            created_at: row.created_at,
        })
    }

    fn matches(&self, filter: PostFilter, row: &PostRow) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => row.content.group == Some(group_id),
            PostFilter::Author(author_id) => row.author == author_id,
            PostFilter::FollowedBy(follower_id) => Follow::new(follower_id, row.author)
                .is_ok_and(|follow| self.follows.contains(&follow)),
        }
    }

    /// Newest first, ties broken by descending id.
    fn filtered_posts(&self, filter: PostFilter) -> Vec<(Id<PostMarker>, &PostRow)> {
        let mut posts: Vec<_> = self
            .posts
            .iter()
            .filter(|(_, row)| self.matches(filter, row))
            .map(|(post_id, row)| (*post_id, row))
            .collect();
        posts.sort_by(|(a_id, a), (b_id, b)| (b.created_at, b_id).cmp(&(a.created_at, a_id)));
        posts
    }
}

fn to_len(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// [`EntityStore`] that lives and dies with the process.
///
/// All tables sit behind one lock, so every operation is atomic.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    snowflake_generator: Mutex<QuireSnowflakeGenerator>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(worker_id: NodeId, process_id: NodeId) -> Self {
        Self {
            tables: RwLock::default(),
            snowflake_generator: Mutex::new(QuireSnowflakeGenerator::new(worker_id, process_id)),
        }
    }

    fn next_id<Marker>(&self) -> Result<Id<Marker>> {
        let snowflake = self
            .snowflake_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate()?;
        Ok(snowflake.into())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(NodeId::default(), NodeId::default())
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.usernames.contains_key(&user.username) {
            return Err(DbError::Conflict(UniqueViolation::Username));
        }

        let user_id = self.next_id()?;
        tables.users.insert(user_id, user.username.clone());
        tables.usernames.insert(user.username.clone(), user_id);

        Ok(User {
            id: user_id,
            username: user.username.clone(),
        })
    }

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.user(user_id).ok())
    }

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .usernames
            .get(username)
            .and_then(|user_id| tables.user(*user_id).ok()))
    }

    async fn create_group(&self, group: &CreateGroup) -> Result<Group> {
        let mut tables = self.tables.write().await;
        if tables.slugs.contains_key(&group.slug) {
            return Err(DbError::Conflict(UniqueViolation::GroupSlug));
        }

        let group = Group {
            id: self.next_id()?,
            title: group.title.clone(),
            slug: group.slug.clone(),
            description: group.description.clone(),
        };
        tables.slugs.insert(group.slug.clone(), group.id);
        tables.groups.insert(group.id, group.clone());

        Ok(group)
    }

    async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.get(&group_id).cloned())
    }

    async fn fetch_group_by_slug(&self, slug: &Slug) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables
            .slugs
            .get(slug)
            .and_then(|group_id| tables.groups.get(group_id))
            .cloned())
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        tables.user(post.author)?;
        tables.check_content(&post.content)?;

        let post_id = self.next_id()?;
        let row = PostRow {
            author: post.author,
            content: post.content.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        let created = tables.post(post_id, &row)?;
        tables.posts.insert(post_id, row);

        Ok(created)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .get(&post_id)
            .map(|row| tables.post(post_id, row))
            .transpose()
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        content: &PostContent,
    ) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        let Some(mut row) = tables.posts.get(&post_id).cloned() else {
            return Ok(None);
        };
        tables.check_content(content)?;

        row.content = content.clone();
        let updated = tables.post(post_id, &row)?;
        tables.posts.insert(post_id, row);

        Ok(Some(updated))
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&post_id).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|_, comment| comment.post != post_id);

        Ok(true)
    }

    async fn list_posts(&self, filter: PostFilter, window: Window) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        let posts = tables
            .filtered_posts(filter)
            .into_iter()
            .skip(to_len(window.offset))
            .take(window.limit.map_or(usize::MAX, to_len));

        posts
            .map(|(post_id, row)| tables.post(post_id, row))
            .collect()
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .posts
            .values()
            .filter(|row| tables.matches(filter, row))
            .count();
        Ok(count as u64)
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post) {
            return Err(DbError::MissingReference("post"));
        }
        tables.user(comment.author)?;

        let comment_id = self.next_id()?;
        let row = CommentRow {
            post: comment.post,
            author: comment.author,
            text: comment.text.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        let created = tables.comment(comment_id, &row)?;
        tables.comments.insert(comment_id, row);

        Ok(created)
    }

    async fn list_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<_> = tables
            .comments
            .iter()
            .filter(|(_, row)| row.post == post_id)
            .collect();
        comments.sort_by_key(|(comment_id, row)| (row.created_at, **comment_id));

        comments
            .into_iter()
            .map(|(comment_id, row)| tables.comment(*comment_id, row))
            .collect()
    }

    async fn count_comments(&self, post_id: Id<PostMarker>) -> Result<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .comments
            .values()
            .filter(|row| row.post == post_id)
            .count();
        Ok(count as u64)
    }

    async fn insert_follow(&self, follow: Follow) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.user(follow.follower())?;
        tables.user(follow.followed())?;

        Ok(tables.follows.insert(follow))
    }

    async fn delete_follow(&self, follow: Follow) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.follows.remove(&follow))
    }

    async fn follow_exists(&self, follow: Follow) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.follows.contains(&follow))
    }

    async fn count_followers(&self, user_id: Id<UserMarker>) -> Result<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .follows
            .iter()
            .filter(|follow| follow.followed() == user_id)
            .count();
        Ok(count as u64)
    }

    async fn count_following(&self, user_id: Id<UserMarker>) -> Result<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .follows
            .iter()
            .filter(|follow| follow.follower() == user_id)
            .count();
        Ok(count as u64)
    }

    async fn follow_edges_from(&self, follower: Id<UserMarker>) -> Result<Vec<Follow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .filter(|follow| follow.follower() == follower)
            .copied()
            .collect())
    }
}
