/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Cache merge engine: fold an incoming vertex payload into canonical state
//! and decide whether anything observable changed.

use log::error;
use serde_json::Value;

use crate::cache::{CacheError, VertexCache, preview};
use crate::model::properties::{PropertyBag, PropertyKey};
use crate::model::vertex::{CachedVertex, RawVertex, WorkspaceOverlay};

/// Options for [`VertexCache::update_with_vertex`].
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Remove this property from the cached record before merging.
    pub deleted_property: Option<PropertyKey>,
    /// Suppress the merged record when none of the watched fields changed.
    pub return_null_if_not_changed: bool,
}

/// The fixed subset of vertex fields inspected to decide whether a merge
/// counts as a change. Deliberately narrow: nothing outside this list ever
/// flips the answer. Absent-vs-present counts as different.
#[derive(Debug, Clone, Default, PartialEq)]
struct WatchedFields {
    visibility: Option<Value>,
    visibility_json: Option<Value>,
    detected_objects: Option<Vec<Value>>,
    properties: Option<PropertyBag>,
    sandbox_status: Option<String>,
}

impl WatchedFields {
    fn of_record(record: &CachedVertex) -> Self {
        Self {
            visibility: record.visibility.clone(),
            visibility_json: record.visibility_json.clone(),
            detected_objects: Some(record.detected_objects.clone()),
            properties: Some(record.properties.clone()),
            sandbox_status: record.sandbox_status.clone(),
        }
    }

    fn of_payload(payload: &RawVertex) -> Self {
        Self {
            visibility: payload.visibility.clone(),
            visibility_json: payload.visibility_json.clone(),
            detected_objects: payload.detected_objects.clone(),
            properties: payload.properties.clone(),
            sandbox_status: payload.sandbox_status.clone(),
        }
    }
}

/// Deep union of workspace overlays: nested objects merge recursively,
/// anything else (arrays included) is a leaf where the incoming side wins.
pub(crate) fn deep_union(base: &mut WorkspaceOverlay, incoming: &WorkspaceOverlay) {
    for (key, value) in incoming {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(update)) => {
                deep_union(existing, update);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

impl<S> VertexCache<S> {
    /// Merge an incoming payload into the cache.
    ///
    /// Returns the merged record, or `Ok(None)` when
    /// `return_null_if_not_changed` was requested and none of the watched
    /// fields differed from the cached state. The payload itself is never
    /// mutated; callers read merged state back through the cache.
    pub fn update_with_vertex(
        &mut self,
        incoming: &RawVertex,
        options: &MergeOptions,
    ) -> Result<Option<&CachedVertex>, CacheError> {
        let (changed, record) = self.merge_vertex(incoming, options)?;
        if options.return_null_if_not_changed && !changed {
            Ok(None)
        } else {
            Ok(Some(record))
        }
    }

    pub(crate) fn merge_vertex(
        &mut self,
        incoming: &RawVertex,
        options: &MergeOptions,
    ) -> Result<(bool, &CachedVertex), CacheError> {
        if incoming.id.is_empty() {
            return Err(CacheError::MissingId);
        }

        // Change detection runs against the pre-mutation cache state; a
        // fresh id compares as all-absent.
        let before = self
            .records
            .get(&incoming.id)
            .map(WatchedFields::of_record)
            .unwrap_or_default();
        let changed = before != WatchedFields::of_payload(incoming);

        let record = self
            .records
            .entry(incoming.id.clone())
            .or_insert_with(|| CachedVertex::with_id(&incoming.id));

        if let Some(deleted) = &options.deleted_property {
            record.properties.remove(deleted);
        }

        // Incoming properties replace the cached bag outright; a payload
        // without properties leaves the cached bag alone.
        if let Some(properties) = &incoming.properties {
            record.properties = properties.clone();
        }

        if let Some(workspace) = &incoming.workspace {
            deep_union(&mut record.workspace, workspace);
        }

        if let Some(visibility) = &incoming.visibility {
            record.visibility = Some(visibility.clone());
        }
        if let Some(visibility_json) = &incoming.visibility_json {
            record.visibility_json = Some(visibility_json.clone());
        }
        if let Some(sandbox_status) = &incoming.sandbox_status {
            record.sandbox_status = Some(sandbox_status.clone());
        }

        record.properties.promote_legacy_source();

        record.detected_objects = incoming.detected_objects.clone().unwrap_or_default();

        // Membership stores ids only and the record owns its overlay, so
        // there is no separate workspace entry to re-point after the merge.

        let concept_type = record
            .properties
            .usable_str(&PropertyKey::ConceptType)
            .map(str::to_owned);
        match concept_type {
            Some(concept_type) => match self.concepts.get(&concept_type) {
                Some(concept) => {
                    record.concept = Some(concept.clone());
                    preview::set_previews(record, &self.workspace_id);
                }
                None => {
                    error!(
                        "Unable to attach concept to vertex {}: unknown concept type {concept_type:?}",
                        record.id
                    );
                    record.concept = None;
                }
            },
            // A bag replacement can drop the concept-type property; the
            // record must not keep claiming the old classification.
            None => record.concept = None,
        }

        record.resolved_source = record.properties.resolved_source();

        Ok((changed, record))
    }
}
