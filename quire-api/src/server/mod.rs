use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{FormRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use json::Json;
use quire_common::model::user::Username;
use quire_core::{CoreError, Services};
use quire_db::DbError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

mod auth;
mod extract;
mod json;
mod routes;

pub use auth::AUTHENTICATED_USER_HEADER;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub services: Arc<Services>,
}

impl ServerState {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

/// All routes, ready to serve.
pub fn app(state: ServerState) -> Router {
    routes().with_state(state)
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Form rejected: {0}")]
    FormRejection(#[from] FormRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Identity header was missing or invalid: {0}")]
    InvalidIdentityHeader(TypedHeaderRejection),
    #[error("Authenticated user {0} does not exist")]
    UnknownIdentity(Username),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Database(#[from] DbError),
}

fn db_status(err: &DbError) -> StatusCode {
    match err {
        DbError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::Core(CoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::FormRejection(rejection) => rejection.status(),
            ServerError::InvalidIdentityHeader(_) | ServerError::UnknownIdentity(_) => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::Core(CoreError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Core(CoreError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            ServerError::Core(CoreError::Db(err)) | ServerError::Database(err) => db_status(err),
            ServerError::JsonResponse(_) | ServerError::Core(CoreError::Render(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, %status, "Replying with error");
        } else {
            debug!(error = %self, %status, "Replying with error");
        }

        let error_response = ErrorResponse {
            status: status.as_u16(),
            error: self.to_string(),
        };
        (status, Json(error_response)).into_response()
    }
}
