use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::Form,
    json::Json,
    routes::{feeds::HomePath, redirect_to},
};
use axum::{extract::State, response::Redirect};
use axum_extra::routing::{RouterExt, TypedPath};
use quire_common::model::{Id, post::PostMarker, user::Username};
use quire_core::{
    CoreError, Services,
    authoring::{PostDraft, PostEdit},
    views::PostView,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_post)
        .typed_get(view_post)
        .typed_post(edit_post)
        .typed_post(add_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/new", rejection(ServerError))]
struct NewPostPath();

async fn create_post(
    NewPostPath(): NewPostPath,
    State(services): State<Arc<Services>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(draft): Form<PostDraft>,
) -> Result<Redirect> {
    services.authoring().create_post(user.id, draft).await?;

    Ok(redirect_to(&HomePath()))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/{username}/{post_id}", rejection(ServerError))]
struct PostPath {
    username: Username,
    post_id: Id<PostMarker>,
}

async fn view_post(
    PostPath { username, post_id }: PostPath,
    State(services): State<Arc<Services>>,
    viewer: Option<AuthenticatedUser>,
) -> Result<Json<PostView>> {
    let viewer = viewer.map(|AuthenticatedUser(viewer)| viewer.id);
    let view = services.post_view(&username, post_id, viewer).await?;

    Ok(Json(view))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/{username}/{post_id}/edit", rejection(ServerError))]
struct EditPostPath {
    username: Username,
    post_id: Id<PostMarker>,
}

/// Non-authors land back on the post view instead of seeing an error.
async fn edit_post(
    EditPostPath { username, post_id }: EditPostPath,
    State(services): State<Arc<Services>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(edit): Form<PostEdit>,
) -> Result<Redirect> {
    let post = services.find_post(&username, post_id).await?;

    match services.authoring().edit_post(user.id, post.id, edit).await {
        Ok(_) => {}
        Err(CoreError::PermissionDenied(denied)) => {
            debug!(error = %denied, "Redirecting non-author to post view");
        }
        Err(err) => return Err(err.into()),
    }

    Ok(redirect_to(&PostPath { username, post_id }))
}

#[derive(Deserialize)]
struct CommentForm {
    text: String,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/{username}/{post_id}/comment", rejection(ServerError))]
struct CommentPath {
    username: Username,
    post_id: Id<PostMarker>,
}

async fn add_comment(
    CommentPath { username, post_id }: CommentPath,
    State(services): State<Arc<Services>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(CommentForm { text }): Form<CommentForm>,
) -> Result<Redirect> {
    let post = services.find_post(&username, post_id).await?;
    services
        .comments()
        .add_comment(post.id, user.id, text)
        .await?;

    Ok(redirect_to(&PostPath { username, post_id }))
}
