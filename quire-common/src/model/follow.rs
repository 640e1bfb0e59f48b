use crate::model::{Id, user::UserMarker};
use serde::Serialize;
use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("User {0} cannot follow themselves")]
pub struct SelfFollowError(pub Id<UserMarker>);

/// Directed edge: `follower` sees the posts of `followed` in their feed.
///
/// Construction enforces `follower != followed`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
pub struct Follow {
    follower: Id<UserMarker>,
    followed: Id<UserMarker>,
}

impl Follow {
    pub fn new(
        follower: Id<UserMarker>,
        followed: Id<UserMarker>,
    ) -> Result<Self, SelfFollowError> {
        if follower == followed {
            Err(SelfFollowError(follower))
        } else {
            Ok(Self { follower, followed })
        }
    }

    #[must_use]
    pub fn follower(self) -> Id<UserMarker> {
        self.follower
    }

    #[must_use]
    pub fn followed(self) -> Id<UserMarker> {
        self.followed
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        follow::{Follow, SelfFollowError},
    };

    #[test]
    fn self_follow_is_unrepresentable() {
        let user = Id::from(7);
        assert_eq!(Follow::new(user, user), Err(SelfFollowError(user)));

        let edge = Follow::new(user, Id::from(8)).unwrap();
        assert_eq!(edge.follower(), user);
        assert_eq!(edge.followed(), Id::from(8));
    }
}
