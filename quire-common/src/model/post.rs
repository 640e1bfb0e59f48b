use crate::model::{
    Id,
    group::{Group, GroupMarker},
    text::Text,
    user::{User, UserMarker},
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::Display;
use thiserror::Error;
use time::OffsetDateTime;

/// Number of characters a post shows of itself in listings and logs.
pub const POST_PREVIEW_LEN: usize = 15;
pub const ATTACHMENT_REF_MAX_LEN: usize = 255;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: User,
    pub text: Text,
    pub group: Option<Group>,
    pub attachment: Option<AttachmentRef>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text.preview(POST_PREVIEW_LEN))
    }
}

/// The author-controlled part of a post.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct PostContent {
    pub text: Text,
    pub group: Option<Id<GroupMarker>>,
    pub attachment: Option<AttachmentRef>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CreatePost {
    pub author: Id<UserMarker>,
    pub content: PostContent,
}

/// What an edit does to the attachment of a post.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub enum AttachmentChange {
    #[default]
    Keep,
    Replace(AttachmentRef),
    Clear,
}

impl AttachmentChange {
    #[must_use]
    pub fn apply(self, current: Option<AttachmentRef>) -> Option<AttachmentRef> {
        match self {
            AttachmentChange::Keep => current,
            AttachmentChange::Replace(attachment) => Some(attachment),
            AttachmentChange::Clear => None,
        }
    }
}

/// Opaque reference to an uploaded file. The core never looks inside.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct AttachmentRef(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The attachment reference is invalid: {0:?}")]
pub struct InvalidAttachmentRefError(String);

impl AttachmentRef {
    pub fn new(reference: String) -> Result<Self, InvalidAttachmentRefError> {
        if reference.is_empty() || reference.chars().count() > ATTACHMENT_REF_MAX_LEN {
            Err(InvalidAttachmentRefError(reference))
        } else {
            Ok(AttachmentRef(reference))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for AttachmentRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        AttachmentRef::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"AttachmentRef"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        post::{AttachmentChange, AttachmentRef, Post},
        text::Text,
        user::{User, Username},
    };
    use time::macros::datetime;

    fn attachment(name: &str) -> AttachmentRef {
        AttachmentRef::new(name.to_owned()).unwrap()
    }

    #[test]
    fn post_displays_first_fifteen_characters() {
        let post = Post {
            id: Id::from(1),
            author: User {
                id: Id::from(2),
                username: Username::new("ModelsTester".to_owned()).unwrap(),
            },
            text: Text::new("lorem ipsum dolor sit amet".to_owned()).unwrap(),
            group: None,
            attachment: None,
            created_at: datetime!(2025-03-01 12:00 UTC),
        };

        assert_eq!(post.to_string(), "lorem ipsum dol");
    }

    #[test]
    fn attachment_change() {
        let current = Some(attachment("posts/small.gif"));

        assert_eq!(AttachmentChange::Keep.apply(current.clone()), current);
        assert_eq!(AttachmentChange::Clear.apply(current.clone()), None);
        assert_eq!(
            AttachmentChange::Replace(attachment("posts/big.gif")).apply(current),
            Some(attachment("posts/big.gif"))
        );
    }

    #[test]
    fn attachment_ref_must_not_be_empty() {
        assert!(AttachmentRef::new(String::new()).is_err());
    }
}
