//! HTTP access to the store metadata service.
//!
//! [`ServiceClient`] implements the [`listing_core::VersionTransport`] and
//! [`listing_core::AssetUploader`] seams over `reqwest`.

mod client;
mod response;

pub use client::{ClientConfig, DEFAULT_TIMEOUT, ServiceClient};
