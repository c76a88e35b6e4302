/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! In-memory vertex cache for the graph-exploration UI.
//!
//! Canonical vertex state lives here: one [`CachedVertex`] per id, a
//! workspace membership set over those ids, and the merge/refresh machinery
//! that keeps records current. See `merge` for the change-detection rules and
//! `refresh` for the read-through fetch protocol.
//!
//! Ownership rule: the workspace overlay for a given id has exactly one
//! owner, the cache record. The membership set stores ids only, so divergent
//! overlay copies cannot exist. External workspace management goes through
//! [`VertexCache::add_to_workspace`] / [`VertexCache::remove_from_workspace`].

pub mod merge;
pub mod preview;
pub mod refresh;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::model::vertex::{CachedVertex, VertexRef, WorkspaceOverlay, WorkspaceVertex};
use crate::registries::concept::ConceptRegistry;
use crate::services::vertex::FetchError;

pub use merge::MergeOptions;

/// Errors surfaced by cache operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A payload or lookup arrived without a vertex id.
    MissingId,
    /// A fetch issued on behalf of `refresh`/`vertex_title` failed; the
    /// service error is carried through untouched.
    Fetch(FetchError),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::MissingId => write!(f, "vertex payload has no id"),
            CacheError::Fetch(e) => write!(f, "vertex fetch failed: {e}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Fetch(e) => Some(e),
            CacheError::MissingId => None,
        }
    }
}

impl From<FetchError> for CacheError {
    fn from(e: FetchError) -> Self {
        CacheError::Fetch(e)
    }
}

/// The vertex cache: canonical records, workspace membership, and the
/// handles the merge/refresh layers need (concept registry, fetch service,
/// current workspace id).
///
/// Single-threaded by design: mutators take `&mut self`, merges are atomic
/// with respect to reads because nothing preempts them, and only the
/// `refresh`/`vertex_title` pair suspends (at the service boundary).
pub struct VertexCache<S> {
    records: HashMap<String, CachedVertex>,
    workspace_ids: HashSet<String>,
    workspace_id: String,
    concepts: Arc<ConceptRegistry>,
    service: S,
}

impl<S> VertexCache<S> {
    pub fn new(
        service: S,
        concepts: Arc<ConceptRegistry>,
        workspace_id: impl Into<String>,
    ) -> Self {
        Self {
            records: HashMap::new(),
            workspace_ids: HashSet::new(),
            workspace_id: workspace_id.into(),
            concepts,
            service,
        }
    }

    /// The workspace whose id parameterizes derived preview URLs.
    pub fn current_workspace(&self) -> &str {
        &self.workspace_id
    }

    pub fn set_current_workspace(&mut self, workspace_id: impl Into<String>) {
        self.workspace_id = workspace_id.into();
    }

    /// The fetch service this cache reads through.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Exact-id lookup.
    pub fn vertex(&self, id: &str) -> Option<&CachedVertex> {
        self.records.get(id)
    }

    /// Cached records for the given ids or vertex-shaped handles. Unknown ids
    /// are silently omitted.
    pub fn vertices<I>(&self, handles: I) -> Vec<&CachedVertex>
    where
        I: IntoIterator,
        I::Item: VertexRef,
    {
        handles
            .into_iter()
            .filter_map(|handle| self.records.get(handle.vertex_id()))
            .collect()
    }

    /// Cached records currently pinned to the workspace.
    pub fn vertices_in_workspace(&self) -> Vec<&CachedVertex> {
        self.workspace_ids
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    pub fn in_workspace<T: VertexRef + ?Sized>(&self, handle: &T) -> bool {
        self.workspace_ids.contains(handle.vertex_id())
    }

    /// Detached `{id, workspace}` copy for an id, cached or not.
    pub fn workspace_only_vertex(&self, id: &str) -> WorkspaceVertex {
        WorkspaceVertex {
            id: id.to_string(),
            workspace: self
                .records
                .get(id)
                .map(|record| record.workspace.clone())
                .unwrap_or_default(),
        }
    }

    /// Detached copy preferring the handed-in record's own overlay, falling
    /// back to the cached one.
    pub fn workspace_only_vertex_copy(&self, vertex: &CachedVertex) -> WorkspaceVertex {
        let workspace = if vertex.workspace.is_empty() {
            self.records
                .get(&vertex.id)
                .map(|record| record.workspace.clone())
                .unwrap_or_default()
        } else {
            vertex.workspace.clone()
        };
        WorkspaceVertex {
            id: vertex.id.clone(),
            workspace,
        }
    }

    /// Pin an id to the workspace. The overlay is deep-merged into the cache
    /// record (created on demand), which stays the overlay's single owner.
    pub fn add_to_workspace(
        &mut self,
        id: &str,
        overlay: WorkspaceOverlay,
    ) -> Result<(), CacheError> {
        if id.is_empty() {
            return Err(CacheError::MissingId);
        }
        self.workspace_ids.insert(id.to_string());
        let record = self
            .records
            .entry(id.to_string())
            .or_insert_with(|| CachedVertex::with_id(id));
        merge::deep_union(&mut record.workspace, &overlay);
        Ok(())
    }

    /// Unpin an id. The record and its overlay stay cached.
    pub fn remove_from_workspace(&mut self, id: &str) -> bool {
        self.workspace_ids.remove(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
