use crate::{
    error::{DbError, Result},
    record::{FollowRecord, FullCommentRecord, FullPostRecord, GroupRecord, UserRecord},
    store::{EntityStore, PostFilter},
};
use async_trait::async_trait;
use quire_common::{
    model::{
        Id, QuireSnowflakeGenerator,
        comment::{Comment, CommentMarker, CreateComment},
        follow::Follow,
        group::{CreateGroup, Group, GroupMarker, Slug},
        post::{AttachmentRef, CreatePost, Post, PostContent, PostMarker},
        user::{CreateUser, User, UserMarker, Username},
    },
    pagination::Window,
    snowflake::NodeId,
};
use sqlx::{
    PgPool, Postgres, QueryBuilder, query, query_as, query_scalar,
    postgres::PgPoolOptions,
};
use std::sync::{Mutex, PoisonError};
use time::OffsetDateTime;
use tracing::info;

/// Posts joined with author and group, read from `$source` aliased as `p`.
macro_rules! select_posts {
    ($source:literal) => {
        concat!(
            "
            SELECT
                p.post_snowflake,
                p.text,
                p.attachment,
                p.created_at,
                u.user_snowflake,
                u.username,
                g.group_snowflake,
                g.title AS group_title,
                g.slug AS group_slug,
                g.description AS group_description
            FROM
                ",
            $source,
            " AS p
                JOIN users.users AS u ON u.user_snowflake = p.author_snowflake
                LEFT JOIN posts.groups AS g ON g.group_snowflake = p.group_snowflake
            "
        )
    };
}

macro_rules! select_comments {
    ($source:literal) => {
        concat!(
            "
            SELECT
                c.comment_snowflake,
                c.post_snowflake,
                c.text,
                c.created_at,
                u.user_snowflake,
                u.username
            FROM
                ",
            $source,
            " AS c
                JOIN users.users AS u ON u.user_snowflake = c.author_snowflake
            "
        )
    };
}

fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// PostgreSQL backed [`EntityStore`].
pub struct DbClient {
    pool: PgPool,
    snowflake_generator: Mutex<QuireSnowflakeGenerator>,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool, worker_id: NodeId, process_id: NodeId) -> Self {
        let snowflake_generator = Mutex::new(QuireSnowflakeGenerator::new(worker_id, process_id));

        Self {
            pool,
            snowflake_generator,
        }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(pool)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    fn next_id<Marker>(&self) -> Result<Id<Marker>> {
        let snowflake = self
            .snowflake_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate()?;
        Ok(snowflake.into())
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: PostFilter) {
        match filter {
            PostFilter::All => {}
            PostFilter::Group(group_id) => {
                builder
                    .push(" AND p.group_snowflake = ")
                    .push_bind(group_id.as_db());
            }
            PostFilter::Author(author_id) => {
                builder
                    .push(" AND p.author_snowflake = ")
                    .push_bind(author_id.as_db());
            }
            PostFilter::FollowedBy(follower_id) => {
                builder
                    .push(
                        " AND p.author_snowflake IN (
                            SELECT f.followed_snowflake
                            FROM users.follows AS f
                            WHERE f.follower_snowflake = ",
                    )
                    .push_bind(follower_id.as_db())
                    .push(")");
            }
        }
    }
}

#[async_trait]
impl EntityStore for DbClient {
    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let user_id = self.next_id::<UserMarker>()?;

        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users.users (user_snowflake, username)
            VALUES ($1, $2)
            RETURNING user_snowflake, username
            ",
        )
        .bind(user_id.as_db())
        .bind(user.username.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(User::try_from(record)?)
    }

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT user_snowflake, username
            FROM users.users
            WHERE user_snowflake = $1
            ",
        )
        .bind(user_id.as_db())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn fetch_user_by_username(&self, username: &Username) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT user_snowflake, username
            FROM users.users
            WHERE username = $1
            ",
        )
        .bind(username.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn create_group(&self, group: &CreateGroup) -> Result<Group> {
        let group_id = self.next_id::<GroupMarker>()?;

        let record = query_as::<_, GroupRecord>(
            "
            INSERT INTO posts.groups (group_snowflake, title, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING group_snowflake, title, slug, description
            ",
        )
        .bind(group_id.as_db())
        .bind(&group.title)
        .bind(group.slug.get())
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(Group::try_from(record)?)
    }

    async fn fetch_group(&self, group_id: Id<GroupMarker>) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT group_snowflake, title, slug, description
            FROM posts.groups
            WHERE group_snowflake = $1
            ",
        )
        .bind(group_id.as_db())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }

    async fn fetch_group_by_slug(&self, slug: &Slug) -> Result<Option<Group>> {
        let record = query_as::<_, GroupRecord>(
            "
            SELECT group_snowflake, title, slug, description
            FROM posts.groups
            WHERE slug = $1
            ",
        )
        .bind(slug.get())
        .fetch_optional(&self.pool)
        .await?;

        let group = record.map(Group::try_from).transpose()?;
        Ok(group)
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let post_id = self.next_id::<PostMarker>()?;

        let record = query_as::<_, FullPostRecord>(concat!(
            "
            WITH inserted AS (
                INSERT INTO posts.posts
                    (post_snowflake, author_snowflake, group_snowflake, text, attachment, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            ",
            select_posts!("inserted")
        ))
        .bind(post_id.as_db())
        .bind(post.author.as_db())
        .bind(post.content.group.map(Id::as_db))
        .bind(post.content.text.get())
        .bind(post.content.attachment.as_ref().map(AttachmentRef::get))
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(Post::try_from(record)?)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, FullPostRecord>(concat!(
            select_posts!("posts.posts"),
            "WHERE p.post_snowflake = $1"
        ))
        .bind(post_id.as_db())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        content: &PostContent,
    ) -> Result<Option<Post>> {
        let record = query_as::<_, FullPostRecord>(concat!(
            "
            WITH updated AS (
                UPDATE posts.posts
                SET text = $2, group_snowflake = $3, attachment = $4
                WHERE post_snowflake = $1
                RETURNING *
            )
            ",
            select_posts!("updated")
        ))
        .bind(post_id.as_db())
        .bind(content.text.get())
        .bind(content.group.map(Id::as_db))
        .bind(content.attachment.as_ref().map(AttachmentRef::get))
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = query("DELETE FROM posts.posts WHERE post_snowflake = $1")
            .bind(post_id.as_db())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(&self, filter: PostFilter, window: Window) -> Result<Vec<Post>> {
        let mut builder = QueryBuilder::<Postgres>::new(select_posts!("posts.posts"));
        builder.push("WHERE TRUE");
        Self::push_filter(&mut builder, filter);
        builder.push(" ORDER BY p.created_at DESC, p.post_snowflake DESC");
        if let Some(limit) = window.limit {
            builder.push(" LIMIT ").push_bind(to_db_count(limit));
        }
        builder
            .push(" OFFSET ")
            .push_bind(to_db_count(window.offset));

        let records = builder
            .build_query_as::<FullPostRecord>()
            .fetch_all(&self.pool)
            .await?;

        records
            .into_iter()
            .map(|record| Post::try_from(record).map_err(DbError::from))
            .collect()
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts.posts AS p WHERE TRUE");
        Self::push_filter(&mut builder, filter);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(from_db_count(count))
    }

    async fn create_comment(&self, comment: &CreateComment) -> Result<Comment> {
        let comment_id = self.next_id::<CommentMarker>()?;

        let record = query_as::<_, FullCommentRecord>(concat!(
            "
            WITH inserted AS (
                INSERT INTO posts.comments
                    (comment_snowflake, post_snowflake, author_snowflake, text, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            ",
            select_comments!("inserted")
        ))
        .bind(comment_id.as_db())
        .bind(comment.post.as_db())
        .bind(comment.author.as_db())
        .bind(comment.text.get())
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(Comment::try_from(record)?)
    }

    async fn list_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records = query_as::<_, FullCommentRecord>(concat!(
            select_comments!("posts.comments"),
            "WHERE c.post_snowflake = $1
            ORDER BY c.created_at, c.comment_snowflake"
        ))
        .bind(post_id.as_db())
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| Comment::try_from(record).map_err(DbError::from))
            .collect()
    }

    async fn count_comments(&self, post_id: Id<PostMarker>) -> Result<u64> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts.comments WHERE post_snowflake = $1",
        )
        .bind(post_id.as_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(from_db_count(count))
    }

    async fn insert_follow(&self, follow: Follow) -> Result<bool> {
        let result = query(
            "
            INSERT INTO users.follows (follower_snowflake, followed_snowflake)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(follow.follower().as_db())
        .bind(follow.followed().as_db())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, follow: Follow) -> Result<bool> {
        let result = query(
            "
            DELETE FROM users.follows
            WHERE follower_snowflake = $1 AND followed_snowflake = $2
            ",
        )
        .bind(follow.follower().as_db())
        .bind(follow.followed().as_db())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn follow_exists(&self, follow: Follow) -> Result<bool> {
        let exists = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM users.follows
                WHERE follower_snowflake = $1 AND followed_snowflake = $2
            )
            ",
        )
        .bind(follow.follower().as_db())
        .bind(follow.followed().as_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_followers(&self, user_id: Id<UserMarker>) -> Result<u64> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users.follows WHERE followed_snowflake = $1",
        )
        .bind(user_id.as_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(from_db_count(count))
    }

    async fn count_following(&self, user_id: Id<UserMarker>) -> Result<u64> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users.follows WHERE follower_snowflake = $1",
        )
        .bind(user_id.as_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(from_db_count(count))
    }

    async fn follow_edges_from(&self, follower: Id<UserMarker>) -> Result<Vec<Follow>> {
        let records = query_as::<_, FollowRecord>(
            "
            SELECT follower_snowflake, followed_snowflake
            FROM users.follows
            WHERE follower_snowflake = $1
            ORDER BY followed_snowflake
            ",
        )
        .bind(follower.as_db())
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(|record| Follow::try_from(record).map_err(DbError::from))
            .collect()
    }
}
