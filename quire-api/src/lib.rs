//! HTTP surface of quire. Handlers translate requests into calls on
//! [`quire_core::Services`] and answer with JSON or redirects.

pub mod server;
