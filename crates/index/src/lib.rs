#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Chart repository index for slowrepo
//!
//! This crate assembles the `index.yaml` document the server hands out.
//! The index is built once from catalog entries, rendered to YAML, and
//! checked by parsing the rendered bytes back before anything is served.

mod builder;
mod models;
mod verify;

pub use builder::{CatalogEntry, IndexBuilder};
pub use models::{ChartMetadata, ChartVersion, IndexFile};
pub use verify::verify_index;

/// `apiVersion` written at the top of every index document
pub const INDEX_API_VERSION: &str = "v1";

/// `apiVersion` recorded on every chart entry
pub const CHART_API_VERSION: &str = "v2";
