use quire_common::{model::ModelValidationError, snowflake::SnowflakeTimestampError};
use std::fmt::Display;
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Unique constraint violated: {0}")]
    Conflict(UniqueViolation),
    #[error("Referenced {0} does not exist")]
    MissingReference(&'static str),
    #[error("Could not mint an id: {0}")]
    Snowflake(#[from] SnowflakeTimestampError),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum UniqueViolation {
    Username,
    GroupSlug,
    FollowEdge,
    Constraint(String),
}

impl UniqueViolation {
    fn from_constraint(constraint: Option<&str>) -> Self {
        match constraint {
            Some("users_username_key") => Self::Username,
            Some("groups_slug_key") => Self::GroupSlug,
            Some("follows_pkey") => Self::FollowEdge,
            other => Self::Constraint(other.unwrap_or("unknown").to_owned()),
        }
    }
}

impl Display for UniqueViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueViolation::Username => f.write_str("username is taken"),
            UniqueViolation::GroupSlug => f.write_str("group slug is taken"),
            UniqueViolation::FollowEdge => f.write_str("follow edge exists"),
            UniqueViolation::Constraint(constraint) => write!(f, "constraint {constraint}"),
        }
    }
}

fn referenced_entity(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("posts_group_fkey") => "group",
        Some("comments_post_fkey") => "post",
        _ => "user",
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::Conflict(UniqueViolation::from_constraint(db.constraint()));
            }
            if db.is_foreign_key_violation() {
                return Self::MissingReference(referenced_entity(db.constraint()));
            }
        }
        Self::Sqlx(err)
    }
}
