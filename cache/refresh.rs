/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Read-through refresh: serve cached records, fetch the missing ones.

use log::debug;

use crate::cache::{CacheError, MergeOptions, VertexCache};
use crate::model::vertex::{CachedVertex, VertexRef};
use crate::services::vertex::VertexService;
use crate::util::formatters;

impl<S: VertexService> VertexCache<S> {
    /// Resolve a batch of handles.
    ///
    /// Cached entries are answered locally, in input order, untouched by the
    /// network. The remaining ids go out as one coalesced `get_multiple`
    /// call (duplicates collapsed); fetched payloads are merged into the
    /// cache and appended in service order. When nothing is missing, no
    /// network call is made at all.
    ///
    /// Separate in-flight `refresh` calls for the same uncached id are not
    /// deduplicated; each call computes its own missing set.
    pub async fn refresh<T: VertexRef>(
        &mut self,
        handles: &[T],
    ) -> Result<Vec<CachedVertex>, CacheError> {
        let mut resolved = Vec::with_capacity(handles.len());
        let mut missing: Vec<String> = Vec::new();

        for handle in handles {
            let id = handle.vertex_id();
            if id.is_empty() {
                return Err(CacheError::MissingId);
            }
            if let Some(record) = self.records.get(id) {
                resolved.push(record.clone());
            } else if !missing.iter().any(|requested| requested == id) {
                missing.push(id.to_string());
            }
        }

        if missing.is_empty() {
            return Ok(resolved);
        }

        debug!("refreshing {} uncached vertices", missing.len());
        let batch = self.service.get_multiple(&missing).await?;
        for fetched in &batch.vertices {
            let (_, record) = self.merge_vertex(fetched, &MergeOptions::default())?;
            resolved.push(record.clone());
        }

        Ok(resolved)
    }

    /// Resolve one handle. Always goes through the service (no cache
    /// short-circuit); the response is merged and the canonical record
    /// returned, keyed by the response id or, when the response carries
    /// none, the requested id.
    pub async fn refresh_one<T: VertexRef + ?Sized>(
        &mut self,
        handle: &T,
    ) -> Result<CachedVertex, CacheError> {
        let id = handle.vertex_id();
        if id.is_empty() {
            return Err(CacheError::MissingId);
        }

        let mut fetched = self.service.get_vertex_properties(id).await?;
        if fetched.id.is_empty() {
            fetched.id = id.to_string();
        }

        let (_, record) = self.merge_vertex(&fetched, &MergeOptions::default())?;
        Ok(record.clone())
    }

    /// Formatted display title for an id: straight from the cache when
    /// present (no network), otherwise resolved through [`Self::refresh_one`]
    /// first.
    pub async fn vertex_title(&mut self, id: &str) -> Result<String, CacheError> {
        if let Some(record) = self.records.get(id) {
            return Ok(formatters::vertex_title(record));
        }

        let record = self.refresh_one(id).await?;
        Ok(formatters::vertex_title(&record))
    }
}
