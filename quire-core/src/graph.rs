use crate::error::{NotFoundError, Result};
use quire_common::model::{
    Id,
    follow::Follow,
    user::{User, UserMarker, Username},
};
use quire_db::EntityStore;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    SelfFollowIgnored,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum UnfollowOutcome {
    Unfollowed,
    NotFollowing,
    SelfUnfollowIgnored,
}

/// Follow edges between users.
///
/// Both directions are idempotent and a user never follows themselves: such
/// requests are absorbed and reported through the outcome, never as errors.
pub struct SocialGraph {
    store: Arc<dyn EntityStore>,
}

impl SocialGraph {
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    async fn resolve(&self, username: &Username) -> Result<User> {
        let user = self
            .store
            .fetch_user_by_username(username)
            .await?
            .ok_or_else(|| NotFoundError::UserByUsername(username.clone()))?;
        Ok(user)
    }

    pub async fn follow(&self, follower: Id<UserMarker>, target: &Username) -> Result<FollowOutcome> {
        let target = self.resolve(target).await?;
        self.follow_user(follower, target.id).await
    }

    pub async fn follow_user(
        &self,
        follower: Id<UserMarker>,
        followed: Id<UserMarker>,
    ) -> Result<FollowOutcome> {
        let Ok(edge) = Follow::new(follower, followed) else {
            debug!(%follower, "Ignoring self-follow");
            return Ok(FollowOutcome::SelfFollowIgnored);
        };

        if self.store.insert_follow(edge).await? {
            info!(%follower, %followed, "Follow edge created");
            Ok(FollowOutcome::Followed)
        } else {
            debug!(%follower, %followed, "Follow edge already exists");
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    pub async fn unfollow(
        &self,
        follower: Id<UserMarker>,
        target: &Username,
    ) -> Result<UnfollowOutcome> {
        let target = self.resolve(target).await?;
        self.unfollow_user(follower, target.id).await
    }

    pub async fn unfollow_user(
        &self,
        follower: Id<UserMarker>,
        followed: Id<UserMarker>,
    ) -> Result<UnfollowOutcome> {
        let Ok(edge) = Follow::new(follower, followed) else {
            debug!(%follower, "Ignoring self-unfollow");
            return Ok(UnfollowOutcome::SelfUnfollowIgnored);
        };

        if self.store.delete_follow(edge).await? {
            info!(%follower, %followed, "Follow edge removed");
            Ok(UnfollowOutcome::Unfollowed)
        } else {
            debug!(%follower, %followed, "No follow edge to remove");
            Ok(UnfollowOutcome::NotFollowing)
        }
    }

    pub async fn is_following(
        &self,
        follower: Id<UserMarker>,
        followed: Id<UserMarker>,
    ) -> Result<bool> {
        match Follow::new(follower, followed) {
            Ok(edge) => Ok(self.store.follow_exists(edge).await?),
            Err(_) => Ok(false),
        }
    }

    pub async fn follower_count(&self, user: Id<UserMarker>) -> Result<u64> {
        Ok(self.store.count_followers(user).await?)
    }

    pub async fn following_count(&self, user: Id<UserMarker>) -> Result<u64> {
        Ok(self.store.count_following(user).await?)
    }

    /// Everyone `follower` follows.
    pub async fn followed_by(&self, follower: Id<UserMarker>) -> Result<Vec<Id<UserMarker>>> {
        let edges = self.store.follow_edges_from(follower).await?;
        Ok(edges.into_iter().map(Follow::followed).collect())
    }
}
