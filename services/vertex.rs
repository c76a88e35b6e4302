/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Fetch-service contract consumed by the read-through refresh layer.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::model::vertex::RawVertex;

/// Batch response from [`VertexService::get_multiple`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexBatch {
    pub vertices: Vec<RawVertex>,
}

/// Errors surfaced by a vertex service implementation. The cache propagates
/// these to `refresh` callers unmodified; retry and backoff policy live with
/// the service, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The service itself failed (network, backend, transport).
    Service(String),
    /// The response could not be interpreted as vertex data.
    Malformed(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Service(e) => write!(f, "vertex service error: {e}"),
            FetchError::Malformed(e) => write!(f, "malformed vertex response: {e}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Backend vertex fetch API: single and bulk lookup by id.
///
/// Implementations suspend at the network boundary only. The cache issues at
/// most one `get_multiple` call per batched refresh; it never retries and
/// never cancels an issued fetch.
pub trait VertexService {
    fn get_multiple(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<VertexBatch, FetchError>> + Send;

    fn get_vertex_properties(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<RawVertex, FetchError>> + Send;
}
