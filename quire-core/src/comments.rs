use crate::error::{CoreError, NotFoundError, Result};
use quire_common::model::{
    Id, ModelValidationError,
    comment::{Comment, CreateComment},
    post::PostMarker,
    text::Text,
    user::UserMarker,
};
use quire_db::{DbError, EntityStore};
use std::sync::Arc;
use tracing::info;

/// Comments are immutable once written and only disappear with their post.
pub struct Comments {
    store: Arc<dyn EntityStore>,
}

impl Comments {
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn add_comment(
        &self,
        post: Id<PostMarker>,
        author: Id<UserMarker>,
        text: String,
    ) -> Result<Comment> {
        let text = Text::new(text).map_err(ModelValidationError::from)?;

        let comment = self
            .store
            .create_comment(&CreateComment { post, author, text })
            .await
            .map_err(|err| -> CoreError {
                match err {
                    DbError::MissingReference("post") => NotFoundError::PostById(post).into(),
                    DbError::MissingReference(_) => NotFoundError::UserById(author).into(),
                    err => err.into(),
                }
            })?;

        info!(comment_id = %comment.id, %post, author = %comment.author.username, "Comment added");
        Ok(comment)
    }

    /// Oldest first.
    pub async fn comments_for(&self, post: Id<PostMarker>) -> Result<Vec<Comment>> {
        Ok(self.store.list_comments(post).await?)
    }

    pub async fn comment_count(&self, post: Id<PostMarker>) -> Result<u64> {
        Ok(self.store.count_comments(post).await?)
    }
}
