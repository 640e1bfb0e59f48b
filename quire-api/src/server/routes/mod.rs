use crate::server::ServerRouter;
use axum::{Router, response::Redirect};
use axum_extra::routing::TypedPath;

mod feeds;
mod posts;
mod users;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(feeds::routes())
        .merge(posts::routes())
        .merge(users::routes())
}

/// 303 to the page `path` describes.
fn redirect_to(path: &impl TypedPath) -> Redirect {
    Redirect::to(&path.to_uri().to_string())
}
