//! Caller identity. Authentication happens upstream: the identity proxy in
//! front of this service puts the username of the signed-in caller into the
//! `x-authenticated-user` header.

use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{HeaderName, HeaderValue, request::Parts},
};
use axum_extra::TypedHeader;
use headers::Header;
use quire_common::model::user::{User, Username};
use quire_core::Services;
use std::sync::Arc;

pub static AUTHENTICATED_USER_HEADER: HeaderName = HeaderName::from_static("x-authenticated-user");

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthenticatedUsername(pub Username);

impl Header for AuthenticatedUsername {
    fn name() -> &'static HeaderName {
        &AUTHENTICATED_USER_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let username = value.to_str().map_err(|_| headers::Error::invalid())?;
        Username::new(username.to_owned())
            .map(Self)
            .map_err(|_| headers::Error::invalid())
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = HeaderValue::from_str(self.0.get()) {
            values.extend(std::iter::once(value));
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<Services>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(AuthenticatedUsername(username)) =
            <TypedHeader<AuthenticatedUsername> as FromRequestParts<S>>::from_request_parts(
                parts, state,
            )
            .await
            .map_err(ServerError::InvalidIdentityHeader)?;

        let user = Arc::<Services>::from_ref(state)
            .store()
            .fetch_user_by_username(&username)
            .await?
            .ok_or(ServerError::UnknownIdentity(username))?;

        Ok(Self(user))
    }
}

/// Anonymous callers send no identity header at all. A header that is present
/// but unusable still rejects.
impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    Arc<Services>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(&AUTHENTICATED_USER_HEADER) {
            return Ok(None);
        }

        <Self as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}
