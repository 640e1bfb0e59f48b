//! Feed construction, the social graph, comments and post authoring on top of
//! an [`EntityStore`](quire_db::EntityStore).

pub mod authoring;
pub mod cache;
pub mod comments;
pub mod error;
pub mod feed;
pub mod graph;
pub mod services;
pub mod settings;
pub mod views;

pub use error::{BoxError, CoreError, NotFoundError, PermissionDenied, Result, ValidationError};
pub use services::Services;
pub use settings::FeedSettings;
