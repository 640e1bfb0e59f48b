//! Persistence for users, groups, posts, comments and follow edges.
//!
//! [`EntityStore`] is the seam the rest of the system talks to. [`DbClient`]
//! backs it with PostgreSQL, [`MemoryStore`] keeps everything in process.

pub mod client;
pub mod error;
pub mod memory;
mod record;
pub mod store;

pub use client::DbClient;
pub use error::{DbError, Result, UniqueViolation};
pub use memory::MemoryStore;
pub use store::{EntityStore, PostFilter};
