use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::Page,
    json::Json,
    routes::redirect_to,
};
use axum::{extract::State, response::Redirect};
use axum_extra::routing::{RouterExt, TypedPath};
use quire_common::model::user::Username;
use quire_core::{Services, views::Profile};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(profile)
        .typed_post(follow)
        .typed_post(unfollow)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/{username}", rejection(ServerError))]
struct ProfilePath {
    username: Username,
}

async fn profile(
    ProfilePath { username }: ProfilePath,
    State(services): State<Arc<Services>>,
    viewer: Option<AuthenticatedUser>,
    Page(page): Page,
) -> Result<Json<Profile>> {
    let viewer = viewer.map(|AuthenticatedUser(viewer)| viewer.id);
    let profile = services.profile(&username, viewer, page).await?;

    Ok(Json(profile))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/{username}/follow", rejection(ServerError))]
struct FollowPath {
    username: Username,
}

async fn follow(
    FollowPath { username }: FollowPath,
    State(services): State<Arc<Services>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Redirect> {
    services.graph().follow(user.id, &username).await?;

    Ok(redirect_to(&ProfilePath { username }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/{username}/unfollow", rejection(ServerError))]
struct UnfollowPath {
    username: Username,
}

async fn unfollow(
    UnfollowPath { username }: UnfollowPath,
    State(services): State<Arc<Services>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Redirect> {
    services.graph().unfollow(user.id, &username).await?;

    Ok(redirect_to(&ProfilePath { username }))
}
