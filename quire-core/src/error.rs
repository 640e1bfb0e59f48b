use quire_common::model::{
    Id, ModelValidationError,
    group::Slug,
    post::PostMarker,
    user::{UserMarker, Username},
};
use quire_db::DbError;
use thiserror::Error;

pub type Result<T, E = CoreError> = std::result::Result<T, E>;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),
    #[error("Could not render page: {0}")]
    Render(BoxError),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ModelValidationError> for CoreError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value.into())
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum NotFoundError {
    #[error("No group with slug {0}")]
    GroupBySlug(Slug),
    #[error("No user named {0}")]
    UserByUsername(Username),
    #[error("No user with id {0}")]
    UserById(Id<UserMarker>),
    #[error("No post with id {0}")]
    PostById(Id<PostMarker>),
}

/// Input that was rejected before anything was written.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Model(#[from] ModelValidationError),
    #[error("Group {0} is not one of the available choices")]
    UnknownGroup(Slug),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Error)]
#[error("User {actor} may not edit post {post}")]
pub struct PermissionDenied {
    pub actor: Id<UserMarker>,
    pub post: Id<PostMarker>,
}
