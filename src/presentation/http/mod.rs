//! HTTP surface: routes, built-in handlers, extractors.

pub mod extractors;
pub mod handlers;
pub mod routes;
