//! # occupancy-timer-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API for inspecting accessories, actuating switches and
//!   changing the release delay (`/api/accessories`, `/api/schema`)
//! - Stream every occupancy publication as server-sent events
//!   (`/api/events/stream`)
//! - Map application errors into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `occupancy-timer-app` (for port traits and services) and
//! `occupancy-timer-domain` (for request/response types). Never leaks axum
//! types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
