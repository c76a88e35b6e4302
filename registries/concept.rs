/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Concept registry: type classifications for vertices.
//!
//! Concepts drive default display behavior (artifact previews, glyph icons).
//! The registry is owned and populated outside this crate (typically from an
//! ontology service at session start); the cache only reads it. Lookup is
//! fallible; the caller decides how a miss is reported.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// How vertices of a concept are presented by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConceptDisplayType {
    Image,
    Video,
    /// Anything without specialized artifact previews (entities, documents).
    #[default]
    Generic,
}

impl ConceptDisplayType {
    /// Unknown display types fold into `Generic` rather than failing: the
    /// ontology grows faster than this enum.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Generic,
        }
    }
}

impl<'de> Deserialize<'de> for ConceptDisplayType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// One concept entry, as loaded from the ontology by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Concept {
    pub id: String,
    pub display_type: ConceptDisplayType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glyph_icon_href: Option<String>,
}

/// Map from concept-type key to concept entry.
#[derive(Debug, Clone, Default)]
pub struct ConceptRegistry {
    by_id: HashMap<String, Concept>,
}

impl ConceptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a concept under its own id, returning any displaced entry.
    pub fn insert(&mut self, concept: Concept) -> Option<Concept> {
        self.by_id.insert(concept.id.clone(), concept)
    }

    /// Fallible lookup by concept-type key.
    pub fn get(&self, concept_type: &str) -> Option<&Concept> {
        self.by_id.get(concept_type)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
