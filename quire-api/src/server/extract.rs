use crate::server::ServerError;
use axum::{
    Form as AxumForm,
    extract::{FromRequest, FromRequestParts, Query},
    http::request::Parts,
};
use quire_common::pagination::PageNumber;
use serde::Deserialize;
use std::convert::Infallible;

/// URL-encoded form body.
#[derive(FromRequest, Debug, Clone, Copy, Default)]
#[from_request(via(AxumForm), rejection(ServerError))]
pub struct Form<T>(pub T);

/// The `?page=` query parameter. Never rejects: anything unusable means the
/// first page.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Page(pub PageNumber);

#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
}

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = Query::<PageQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.page);
        Ok(Self(PageNumber::parse(raw.as_deref())))
    }
}
