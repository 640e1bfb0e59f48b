use quire_common::model::{
    Id, ModelValidationError,
    comment::Comment,
    follow::Follow,
    group::{Group, Slug},
    post::{AttachmentRef, Post},
    text::Text,
    user::{User, Username},
};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub struct UserRecord {
    pub user_snowflake: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub struct GroupRecord {
    pub group_snowflake: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post joined with its author and, if any, its group.
#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub struct FullPostRecord {
    pub post_snowflake: i64,
    pub text: String,
    pub attachment: Option<String>,
    pub created_at: OffsetDateTime,
    pub user_snowflake: i64,
    pub username: String,
    pub group_snowflake: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub group_description: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub struct FullCommentRecord {
    pub comment_snowflake: i64,
    pub post_snowflake: i64,
    pub text: String,
    pub created_at: OffsetDateTime,
    pub user_snowflake: i64,
    pub username: String,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub struct FollowRecord {
    pub follower_snowflake: i64,
    pub followed_snowflake: i64,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.user_snowflake),
            username: Username::new(value.username)?,
        })
    }
}

impl TryFrom<GroupRecord> for Group {
    type Error = ModelValidationError;

    fn try_from(value: GroupRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.group_snowflake),
            title: value.title,
            slug: Slug::new(value.slug)?,
            description: value.description,
        })
    }
}

impl TryFrom<FullPostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: FullPostRecord) -> Result<Self, Self::Error> {
        // The LEFT JOIN yields all group columns or none of them.
        let group = match (
            value.group_snowflake,
            value.group_title,
            value.group_slug,
            value.group_description,
        ) {
            (Some(group_snowflake), Some(title), Some(slug), Some(description)) => {
                Some(Group::try_from(GroupRecord {
                    group_snowflake,
                    title,
                    slug,
                    description,
                })?)
            }
            _ => None,
        };

        Ok(Self {
            id: Id::from_db(value.post_snowflake),
            author: User::try_from(UserRecord {
                user_snowflake: value.user_snowflake,
                username: value.username,
            })?,
            text: Text::new(value.text)?,
            group,
            attachment: value.attachment.map(AttachmentRef::new).transpose()?,
            created_at: value.created_at,
        })
    }
}

impl TryFrom<FullCommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: FullCommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.comment_snowflake),
            post: Id::from_db(value.post_snowflake),
            author: User::try_from(UserRecord {
                user_snowflake: value.user_snowflake,
                username: value.username,
            })?,
            text: Text::new(value.text)?,
            created_at: value.created_at,
        })
    }
}

impl TryFrom<FollowRecord> for Follow {
    type Error = ModelValidationError;

    fn try_from(value: FollowRecord) -> Result<Self, Self::Error> {
        Follow::new(
            Id::from_db(value.follower_snowflake),
            Id::from_db(value.followed_snowflake),
        )
        .map_err(ModelValidationError::from)
    }
}
