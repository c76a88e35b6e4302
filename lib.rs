/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! In-memory vertex cache for a graph-exploration UI.
//!
//! Canonical copies of graph vertices fetched from a backend service, a
//! workspace membership set over them, merges of partial/full updates that
//! preserve workspace-local annotations, and derived presentation fields
//! (preview URLs, display titles, source attribution).
//!
//! The cache is single-threaded and cooperative: every operation is
//! synchronous except the read-through `refresh`/`vertex_title` pair, which
//! suspend only at the [`services::vertex::VertexService`] boundary.

pub mod cache;
pub mod model;
pub mod registries;
pub mod services;
pub mod util;

pub use cache::{CacheError, MergeOptions, VertexCache};
pub use model::properties::{PropertyBag, PropertyKey, PropertyValue};
pub use model::vertex::{
    CachedVertex, RawVertex, VertexRef, WorkspaceOverlay, WorkspaceVertex,
};
pub use registries::concept::{Concept, ConceptDisplayType, ConceptRegistry};
pub use services::vertex::{FetchError, VertexBatch, VertexService};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
