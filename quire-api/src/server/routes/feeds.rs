use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::Page,
    json::{Json, RenderedJson},
};
use axum::{body::Bytes, extract::State};
use axum_extra::routing::{RouterExt, TypedPath};
use quire_common::model::group::Slug;
use quire_core::{
    Services,
    feed::{FeedKind, FeedPage},
    views::GroupPage,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(home)
        .typed_get(group_feed)
        .typed_get(following_feed)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/", rejection(ServerError))]
pub struct HomePath();

async fn home(
    HomePath(): HomePath,
    State(services): State<Arc<Services>>,
    Page(page): Page,
) -> Result<RenderedJson> {
    let rendered = services
        .feeds()
        .render_home(page, |feed| Ok(Bytes::from(serde_json::to_vec(feed)?)))
        .await?;

    Ok(RenderedJson(rendered))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/group/{slug}", rejection(ServerError))]
struct GroupPath {
    slug: Slug,
}

async fn group_feed(
    GroupPath { slug }: GroupPath,
    State(services): State<Arc<Services>>,
    Page(page): Page,
) -> Result<Json<GroupPage>> {
    let group_page = services.group_page(&slug, page).await?;

    Ok(Json(group_page))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/follow", rejection(ServerError))]
struct FollowingFeedPath();

async fn following_feed(
    FollowingFeedPath(): FollowingFeedPath,
    State(services): State<Arc<Services>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Page(page): Page,
) -> Result<Json<FeedPage>> {
    let feed = services
        .feeds()
        .build_feed(&FeedKind::Following(user.id), page)
        .await?;

    Ok(Json(feed))
}
