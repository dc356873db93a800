//! trender - client library for the Render platform API
//!
//! The [`render`] module holds the API client; [`config`] holds the
//! persisted settings used by the `trender` binary.

pub mod config;
pub mod render;
