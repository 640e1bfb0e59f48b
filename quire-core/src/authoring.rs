use crate::error::{CoreError, NotFoundError, PermissionDenied, Result, ValidationError};
use quire_common::model::{
    Id, ModelValidationError,
    group::{GroupMarker, Slug},
    post::{AttachmentChange, AttachmentRef, CreatePost, Post, PostContent, PostMarker},
    text::Text,
    user::UserMarker,
};
use quire_db::{DbError, EntityStore};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Unvalidated input of a new post. An empty `group` or `attachment` means
/// none.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PostDraft {
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub attachment: Option<String>,
}

/// Unvalidated input of an edit. Without a new `attachment` the current one
/// is kept unless `clear_attachment` is set.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PostEdit {
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default)]
    pub clear_attachment: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_attachment(value: Option<String>) -> Result<Option<AttachmentRef>> {
    let attachment = non_empty(value)
        .map(AttachmentRef::new)
        .transpose()
        .map_err(ModelValidationError::from)?;
    Ok(attachment)
}

fn attachment_change(value: Option<String>, clear: bool) -> Result<AttachmentChange> {
    let change = match parse_attachment(value)? {
        Some(attachment) => AttachmentChange::Replace(attachment),
        None if clear => AttachmentChange::Clear,
        None => AttachmentChange::Keep,
    };
    Ok(change)
}

/// Creating and editing posts. Only the author may edit a post.
pub struct Authoring {
    store: Arc<dyn EntityStore>,
}

impl Authoring {
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// An unknown slug is invalid input rather than a missing resource.
    async fn resolve_group(&self, group: Option<String>) -> Result<Option<Id<GroupMarker>>> {
        let Some(slug) = non_empty(group) else {
            return Ok(None);
        };
        let slug = Slug::new(slug).map_err(ModelValidationError::from)?;

        match self.store.fetch_group_by_slug(&slug).await? {
            Some(group) => Ok(Some(group.id)),
            None => Err(ValidationError::UnknownGroup(slug).into()),
        }
    }

    pub async fn create_post(&self, author: Id<UserMarker>, draft: PostDraft) -> Result<Post> {
        let text = Text::new(draft.text).map_err(ModelValidationError::from)?;
        let attachment = parse_attachment(draft.attachment)?;
        let group = self.resolve_group(draft.group).await?;

        let create = CreatePost {
            author,
            content: PostContent {
                text,
                group,
                attachment,
            },
        };
        let post = self
            .store
            .create_post(&create)
            .await
            .map_err(|err| -> CoreError {
                match err {
                    DbError::MissingReference("user") => NotFoundError::UserById(author).into(),
                    err => err.into(),
                }
            })?;

        info!(post_id = %post.id, author = %post.author.username, "Post created: {post}");
        Ok(post)
    }

    /// Replaces text, group and attachment of `post_id`. Author and creation
    /// time are never touched.
    pub async fn edit_post(
        &self,
        actor: Id<UserMarker>,
        post_id: Id<PostMarker>,
        edit: PostEdit,
    ) -> Result<Post> {
        let post = self
            .store
            .fetch_post(post_id)
            .await?
            .ok_or(NotFoundError::PostById(post_id))?;

        if post.author.id != actor {
            warn!(%actor, %post_id, "Rejected edit by non-author");
            return Err(PermissionDenied {
                actor,
                post: post_id,
            }
            .into());
        }

        let PostEdit {
            text,
            group,
            attachment,
            clear_attachment,
        } = edit;
        let text = Text::new(text).map_err(ModelValidationError::from)?;
        let change = attachment_change(attachment, clear_attachment)?;
        let group = self.resolve_group(group).await?;
        let attachment = change.apply(post.attachment);

        let content = PostContent {
            text,
            group,
            attachment,
        };
        let updated = self
            .store
            .update_post(post_id, &content)
            .await?
            .ok_or(NotFoundError::PostById(post_id))?;

        info!(%post_id, "Post edited");
        Ok(updated)
    }
}
