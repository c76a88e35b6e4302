/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! End-to-end scenarios for the vertex cache, driven through the public API
//! against a recording in-memory vertex service.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use rstest::rstest;
use serde_json::{Value, json};

use graph_vertex_cache::{
    CacheError, Concept, ConceptDisplayType, ConceptRegistry, FetchError, MergeOptions,
    PropertyBag, PropertyKey, PropertyValue, RawVertex, VertexBatch, VertexCache, VertexService,
    WorkspaceOverlay,
};

/// In-memory vertex service that records every call it receives.
#[derive(Default)]
struct RecordingService {
    vertices: HashMap<String, RawVertex>,
    multi_calls: Mutex<Vec<Vec<String>>>,
    single_calls: Mutex<Vec<String>>,
}

impl RecordingService {
    fn with_vertices(vertices: impl IntoIterator<Item = RawVertex>) -> Self {
        Self {
            vertices: vertices
                .into_iter()
                .map(|vertex| (vertex.id.clone(), vertex))
                .collect(),
            ..Self::default()
        }
    }

    fn multi_calls(&self) -> Vec<Vec<String>> {
        self.multi_calls.lock().expect("lock should not be poisoned").clone()
    }

    fn single_calls(&self) -> Vec<String> {
        self.single_calls.lock().expect("lock should not be poisoned").clone()
    }
}

impl VertexService for RecordingService {
    fn get_multiple(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<VertexBatch, FetchError>> + Send {
        self.multi_calls
            .lock()
            .expect("lock should not be poisoned")
            .push(ids.to_vec());
        let vertices = ids
            .iter()
            .filter_map(|id| self.vertices.get(id).cloned())
            .collect();
        std::future::ready(Ok(VertexBatch { vertices }))
    }

    fn get_vertex_properties(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<RawVertex, FetchError>> + Send {
        self.single_calls
            .lock()
            .expect("lock should not be poisoned")
            .push(id.to_string());
        let response = self
            .vertices
            .get(id)
            .cloned()
            .unwrap_or_else(|| RawVertex::with_id(id));
        std::future::ready(Ok(response))
    }
}

/// Service whose every call fails, for error-propagation scenarios.
struct FailingService;

impl VertexService for FailingService {
    fn get_multiple(
        &self,
        _ids: &[String],
    ) -> impl Future<Output = Result<VertexBatch, FetchError>> + Send {
        std::future::ready(Err(FetchError::Service("backend unavailable".to_string())))
    }

    fn get_vertex_properties(
        &self,
        _id: &str,
    ) -> impl Future<Output = Result<RawVertex, FetchError>> + Send {
        std::future::ready(Err(FetchError::Service("backend unavailable".to_string())))
    }
}

fn registry() -> Arc<ConceptRegistry> {
    let mut registry = ConceptRegistry::new();
    registry.insert(Concept {
        id: "person".to_string(),
        display_type: ConceptDisplayType::Generic,
        glyph_icon_href: Some("img/person.png".to_string()),
    });
    registry.insert(Concept {
        id: "image".to_string(),
        display_type: ConceptDisplayType::Image,
        glyph_icon_href: None,
    });
    registry.insert(Concept {
        id: "video".to_string(),
        display_type: ConceptDisplayType::Video,
        glyph_icon_href: None,
    });
    Arc::new(registry)
}

fn props(entries: &[(PropertyKey, Value)]) -> PropertyBag {
    entries
        .iter()
        .map(|(key, value)| (key.clone(), PropertyValue::new(value.clone())))
        .collect()
}

fn titled_vertex(id: &str, title: &str) -> RawVertex {
    let mut vertex = RawVertex::with_id(id);
    vertex.properties = Some(props(&[(PropertyKey::Title, json!(title))]));
    vertex
}

fn object(value: Value) -> WorkspaceOverlay {
    value.as_object().cloned().expect("literal is an object")
}

#[test]
fn scenarios_smoke_version_is_set() {
    assert!(!graph_vertex_cache::VERSION.is_empty());
}

#[test]
fn merged_properties_read_back_through_the_store() {
    let mut cache = VertexCache::new(RecordingService::default(), registry(), "ws-1");
    let payload = titled_vertex("v1", "Alice");

    cache
        .update_with_vertex(&payload, &MergeOptions::default())
        .expect("merge should succeed");

    let record = cache.vertex("v1").expect("record should be cached");
    assert_eq!(Some(&record.properties), payload.properties.as_ref());

    // A payload without properties leaves the bag untouched.
    let mut bare = RawVertex::with_id("v1");
    bare.visibility = Some(json!("admin"));
    cache
        .update_with_vertex(&bare, &MergeOptions::default())
        .expect("merge should succeed");
    let record = cache.vertex("v1").expect("record should still be cached");
    assert_eq!(Some(&record.properties), payload.properties.as_ref());
}

#[test]
fn workspace_overlay_survives_property_only_updates() {
    let mut cache = VertexCache::new(RecordingService::default(), registry(), "ws-1");
    cache
        .add_to_workspace("v1", object(json!({"graphPosition": {"x": 4, "y": 2}})))
        .expect("workspace add should succeed");

    cache
        .update_with_vertex(&titled_vertex("v1", "Alice"), &MergeOptions::default())
        .expect("merge should succeed");

    let record = cache.vertex("v1").expect("record should be cached");
    assert_eq!(
        record.workspace.get("graphPosition"),
        Some(&json!({"x": 4, "y": 2})),
    );
    assert!(cache.in_workspace("v1"));
}

#[test]
fn return_null_if_not_changed_tracks_watched_fields_only() {
    let mut cache = VertexCache::new(RecordingService::default(), registry(), "ws-1");
    let mut payload = titled_vertex("v1", "Alice");
    payload.detected_objects = Some(Vec::new());
    cache
        .update_with_vertex(&payload, &MergeOptions::default())
        .expect("merge should succeed");

    let options = MergeOptions {
        return_null_if_not_changed: true,
        ..MergeOptions::default()
    };
    assert!(
        cache
            .update_with_vertex(&payload, &options)
            .expect("merge should succeed")
            .is_none(),
        "identical watched fields should suppress the record",
    );

    let mut differs = payload.clone();
    differs.detected_objects = Some(vec![json!({"label": "face"})]);
    assert!(
        cache
            .update_with_vertex(&differs, &options)
            .expect("merge should succeed")
            .is_some(),
        "a watched-field difference should return the record",
    );
}

#[rstest]
#[case(Some("S"), Some("A"), "S / A")]
#[case(Some("S"), None, "S")]
#[case(None, Some("A"), "A")]
#[case(None, None, "")]
fn resolved_source_pairings(
    #[case] source: Option<&str>,
    #[case] author: Option<&str>,
    #[case] expected: &str,
) {
    let mut entries = Vec::new();
    if let Some(source) = source {
        entries.push((PropertyKey::Source, json!(source)));
    }
    if let Some(author) = author {
        entries.push((PropertyKey::Author, json!(author)));
    }

    let mut cache = VertexCache::new(RecordingService::default(), registry(), "ws-1");
    let mut payload = RawVertex::with_id("v1");
    payload.properties = Some(props(&entries));
    cache
        .update_with_vertex(&payload, &MergeOptions::default())
        .expect("merge should succeed");

    assert_eq!(cache.vertex("v1").expect("cached").resolved_source, expected);
}

#[test]
fn legacy_source_promotion_feeds_resolved_source() {
    let mut cache = VertexCache::new(RecordingService::default(), registry(), "ws-1");
    let mut payload = RawVertex::with_id("v1");
    payload.properties = Some(props(&[(PropertyKey::LegacySource, json!("X"))]));

    cache
        .update_with_vertex(&payload, &MergeOptions::default())
        .expect("merge should succeed");

    assert_eq!(cache.vertex("v1").expect("cached").resolved_source, "X");
}

#[test]
fn glyph_icon_url_separator_follows_existing_query() {
    let mut cache = VertexCache::new(RecordingService::default(), registry(), "ws-1");

    let mut plain = RawVertex::with_id("v1");
    plain.properties = Some(props(&[
        (PropertyKey::ConceptType, json!("person")),
        (PropertyKey::GlyphIcon, json!("img/custom.png")),
    ]));
    cache
        .update_with_vertex(&plain, &MergeOptions::default())
        .expect("merge should succeed");
    assert_eq!(
        cache.vertex("v1").expect("cached").image_src.as_deref(),
        Some("img/custom.png?workspaceId=ws-1"),
    );

    let mut with_query = RawVertex::with_id("v2");
    with_query.properties = Some(props(&[
        (PropertyKey::ConceptType, json!("person")),
        (PropertyKey::GlyphIcon, json!("img/custom.png?size=64")),
    ]));
    cache
        .update_with_vertex(&with_query, &MergeOptions::default())
        .expect("merge should succeed");
    assert_eq!(
        cache.vertex("v2").expect("cached").image_src.as_deref(),
        Some("img/custom.png?size=64&workspaceId=ws-1"),
    );
}

#[tokio::test]
async fn refresh_fetches_only_the_missing_ids_in_one_batch() {
    let service = RecordingService::with_vertices([titled_vertex("v2", "Bob")]);
    let mut cache = VertexCache::new(service, registry(), "ws-1");
    cache
        .update_with_vertex(&titled_vertex("v1", "Alice"), &MergeOptions::default())
        .expect("merge should succeed");

    let resolved = cache
        .refresh(&["v1", "v2"])
        .await
        .expect("refresh should succeed");

    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved[0].id, "v1");
    assert_eq!(
        resolved[0].properties.usable_str(&PropertyKey::Title),
        Some("Alice"),
        "the cached entry should be untouched by the network",
    );
    assert_eq!(resolved[1].id, "v2");

    // Exactly one batch call, containing only the missing id.
    assert_eq!(cache.service().multi_calls(), vec![vec!["v2".to_string()]]);
    // The fetched vertex is now canonical cache state.
    assert!(cache.vertex("v2").is_some());
}

#[tokio::test]
async fn refresh_resolves_without_network_when_fully_cached() {
    let mut cache = VertexCache::new(RecordingService::default(), registry(), "ws-1");
    cache
        .update_with_vertex(&titled_vertex("v1", "Alice"), &MergeOptions::default())
        .expect("merge should succeed");

    let resolved = cache.refresh(&["v1"]).await.expect("refresh should succeed");

    assert_eq!(resolved.len(), 1);
    assert!(cache.service().multi_calls().is_empty());
}

#[tokio::test]
async fn refresh_coalesces_duplicate_missing_ids() {
    let service = RecordingService::with_vertices([titled_vertex("v2", "Bob")]);
    let mut cache = VertexCache::new(service, registry(), "ws-1");

    cache
        .refresh(&["v2", "v2"])
        .await
        .expect("refresh should succeed");

    assert_eq!(cache.service().multi_calls(), vec![vec!["v2".to_string()]]);
}

#[tokio::test]
async fn refresh_one_always_goes_through_the_service() {
    let service = RecordingService::with_vertices([titled_vertex("v1", "Fresh")]);
    let mut cache = VertexCache::new(service, registry(), "ws-1");
    cache
        .update_with_vertex(&titled_vertex("v1", "Stale"), &MergeOptions::default())
        .expect("merge should succeed");

    let record = cache
        .refresh_one("v1")
        .await
        .expect("refresh_one should succeed");

    assert_eq!(cache.service().single_calls(), vec!["v1".to_string()]);
    assert_eq!(record.properties.usable_str(&PropertyKey::Title), Some("Fresh"));
    assert_eq!(
        cache
            .vertex("v1")
            .expect("cached")
            .properties
            .usable_str(&PropertyKey::Title),
        Some("Fresh"),
    );
}

#[tokio::test]
async fn refresh_one_falls_back_to_the_requested_id() {
    let mut anonymous = RawVertex::default();
    anonymous.properties = Some(props(&[(PropertyKey::Title, json!("NoId"))]));
    let service = RecordingService {
        vertices: [(String::from("v7"), anonymous)].into_iter().collect(),
        ..RecordingService::default()
    };
    let mut cache = VertexCache::new(service, registry(), "ws-1");

    let record = cache
        .refresh_one("v7")
        .await
        .expect("refresh_one should succeed");

    assert_eq!(record.id, "v7");
    assert!(cache.vertex("v7").is_some());
}

#[tokio::test]
async fn vertex_title_is_served_from_cache_or_resolved() {
    let service = RecordingService::with_vertices([titled_vertex("v2", "Bob")]);
    let mut cache = VertexCache::new(service, registry(), "ws-1");
    cache
        .update_with_vertex(&titled_vertex("v1", "Alice"), &MergeOptions::default())
        .expect("merge should succeed");

    assert_eq!(cache.vertex_title("v1").await.expect("title"), "Alice");
    assert!(cache.service().single_calls().is_empty());

    assert_eq!(cache.vertex_title("v2").await.expect("title"), "Bob");
    assert_eq!(cache.service().single_calls(), vec!["v2".to_string()]);
}

#[tokio::test]
async fn fetch_failures_propagate_untouched() {
    let mut cache = VertexCache::new(FailingService, registry(), "ws-1");

    let err = cache.refresh(&["v1"]).await.expect_err("refresh should fail");
    assert_eq!(
        err,
        CacheError::Fetch(FetchError::Service("backend unavailable".to_string())),
    );

    let err = cache
        .vertex_title("v1")
        .await
        .expect_err("title resolution should fail");
    assert!(matches!(err, CacheError::Fetch(FetchError::Service(_))));
}

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::Number(n.into())),
        "[a-z]{0,6}".prop_map(Value::String),
    ]
}

fn json_tree() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 24, 4, |inner| {
        prop::collection::btree_map("[a-z]{1,3}", inner, 0..4)
            .prop_map(|map| Value::Object(map.into_iter().collect()))
    })
}

fn overlay(keys: &'static str) -> impl Strategy<Value = WorkspaceOverlay> {
    prop::collection::btree_map(keys, json_tree(), 0..5)
        .prop_map(|map| map.into_iter().collect())
}

proptest! {
    /// Overlays with disjoint key sets union additively: nothing from either
    /// side is dropped or rewritten.
    #[test]
    fn disjoint_overlays_union_additively(
        first in overlay("[a-m]{1,3}"),
        second in overlay("[n-z]{1,3}"),
    ) {
        let mut cache = VertexCache::new(RecordingService::default(), registry(), "ws-1");

        let mut payload = RawVertex::with_id("v1");
        payload.workspace = Some(first.clone());
        cache.update_with_vertex(&payload, &MergeOptions::default()).expect("merge");

        let mut payload = RawVertex::with_id("v1");
        payload.workspace = Some(second.clone());
        cache.update_with_vertex(&payload, &MergeOptions::default()).expect("merge");

        let record = cache.vertex("v1").expect("cached");
        for (key, value) in &first {
            prop_assert_eq!(record.workspace.get(key), Some(value));
        }
        for (key, value) in &second {
            prop_assert_eq!(record.workspace.get(key), Some(value));
        }
    }

    /// On a conflicting leaf key, the later (incoming) overlay wins.
    #[test]
    fn incoming_overlay_wins_on_conflicting_leaves(
        old in json_leaf(),
        new in json_leaf(),
    ) {
        let mut cache = VertexCache::new(RecordingService::default(), registry(), "ws-1");

        let mut payload = RawVertex::with_id("v1");
        payload.workspace = Some(object(json!({"k": old})));
        cache.update_with_vertex(&payload, &MergeOptions::default()).expect("merge");

        let mut payload = RawVertex::with_id("v1");
        payload.workspace = Some(object(json!({"k": new.clone()})));
        cache.update_with_vertex(&payload, &MergeOptions::default()).expect("merge");

        prop_assert_eq!(
            cache.vertex("v1").expect("cached").workspace.get("k"),
            Some(&new)
        );
    }
}
