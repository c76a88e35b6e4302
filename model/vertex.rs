/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Vertex records: incoming payloads and canonical cached state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::properties::PropertyBag;
use crate::registries::concept::Concept;

/// Workspace overlay data for one vertex (graph position, per-workspace
/// visibility, annotations). Owned by the cache record carrying the same id;
/// treated as an open JSON tree because the workspace subsystem extends it.
pub type WorkspaceOverlay = Map<String, Value>;

/// An incoming vertex payload, as fetched from the vertex service or pushed
/// by controller code. An absent `properties` means "leave the cached bag
/// alone"; absent passthrough scalars mean "nothing to copy".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawVertex {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyBag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspaceOverlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_objects: Option<Vec<Value>>,
}

impl RawVertex {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Whether a decoded JSON sequence looks like a batch of vertex payloads:
    /// non-empty, first element carrying both `id` and `properties`.
    pub fn resembles_vertices(items: &[Value]) -> bool {
        items.first().is_some_and(|first| {
            first.get("id").is_some_and(|id| !id.is_null())
                && first.get("properties").is_some()
        })
    }
}

/// The canonical cache record for one vertex id. Created on first merge,
/// mutated in place on every later merge, never evicted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedVertex {
    pub id: String,
    pub properties: PropertyBag,
    pub workspace: WorkspaceOverlay,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<Concept>,
    pub detected_objects: Vec<Value>,
    pub resolved_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_raw_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_frames_src: Option<String>,
    pub image_src_is_from_concept: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_status: Option<String>,
}

impl CachedVertex {
    pub(crate) fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// A detached `{id, workspace}` copy, safe to hand to workspace-management
/// code without aliasing the canonical record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceVertex {
    pub id: String,
    pub workspace: WorkspaceOverlay,
}

/// Anything that can stand in for a vertex in lookup position: a raw id, or
/// a record exposing one.
pub trait VertexRef {
    fn vertex_id(&self) -> &str;
}

impl VertexRef for str {
    fn vertex_id(&self) -> &str {
        self
    }
}

impl VertexRef for String {
    fn vertex_id(&self) -> &str {
        self
    }
}

impl VertexRef for RawVertex {
    fn vertex_id(&self) -> &str {
        &self.id
    }
}

impl VertexRef for CachedVertex {
    fn vertex_id(&self) -> &str {
        &self.id
    }
}

impl VertexRef for WorkspaceVertex {
    fn vertex_id(&self) -> &str {
        &self.id
    }
}

impl<T: VertexRef + ?Sized> VertexRef for &T {
    fn vertex_id(&self) -> &str {
        (**self).vertex_id()
    }
}
