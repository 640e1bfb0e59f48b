pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod text;
pub mod user;

use crate::{
    model::{
        follow::SelfFollowError,
        group::InvalidSlugError,
        post::InvalidAttachmentRefError,
        text::EmptyTextError,
        user::InvalidUsernameError,
    },
    snowflake::{Epoch, Snowflake, SnowflakeGenerator},
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;
use time::{UtcDateTime, macros::utc_datetime};

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error(transparent)]
    Slug(#[from] InvalidSlugError),
    #[error(transparent)]
    Text(#[from] EmptyTextError),
    #[error(transparent)]
    Attachment(#[from] InvalidAttachmentRefError),
    #[error(transparent)]
    SelfFollow(#[from] SelfFollowError),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct QuireEpoch;
impl Epoch for QuireEpoch {
    const EPOCH_TIME: UtcDateTime = utc_datetime!(2025-01-01 00:00);
}

pub type QuireSnowflake = Snowflake<QuireEpoch>;
pub type QuireSnowflakeGenerator = SnowflakeGenerator<QuireEpoch>;

/// Typed entity id. The marker keeps post ids and user ids apart at compile
/// time while both serialize as the bare snowflake.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(QuireSnowflake, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(snowflake: QuireSnowflake) -> Self {
        Self(snowflake, PhantomData)
    }

    #[must_use]
    pub fn snowflake(self) -> QuireSnowflake {
        self.0
    }

    /// The id as stored in a signed `BIGINT` column.
    #[must_use]
    pub fn as_db(self) -> i64 {
        self.0.get().cast_signed()
    }

    #[must_use]
    pub fn from_db(value: i64) -> Self {
        value.cast_unsigned().into()
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<QuireSnowflake> for Id<Marker> {
    fn from(value: QuireSnowflake) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Id::new(QuireSnowflake::new(value))
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.snowflake().get()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, post::PostMarker};

    #[test]
    fn id_survives_signed_column() {
        let id = Id::<PostMarker>::from(u64::MAX - 7);
        assert!(id.as_db() < 0);
        assert_eq!(Id::<PostMarker>::from_db(id.as_db()), id);
    }

    #[test]
    fn id_serializes_as_bare_number() {
        let id = Id::<PostMarker>::from(1234);
        assert_eq!(serde_json::to_string(&id).unwrap(), "1234");
        assert_eq!(serde_json::from_str::<Id<PostMarker>>("1234").unwrap(), id);
    }
}
