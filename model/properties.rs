/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Typed property bags for cached vertices.
//!
//! Backend payloads carry properties as a map keyed by either bare names
//! (`"source"`) or IRI-shaped names (`"http://…#conceptType"`), with values
//! that are sometimes a `{value, …metadata}` record and sometimes a raw
//! scalar. Both forms are normalized at the cache boundary: keys into
//! [`PropertyKey`], values into [`PropertyValue`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Known vertex property names, with an escape hatch for everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Title,
    Source,
    /// Pre-rename `_source` key still emitted by older backends.
    LegacySource,
    Author,
    ConceptType,
    GlyphIcon,
    Other(String),
}

impl PropertyKey {
    /// Normalize a wire key. IRI-shaped keys resolve through their fragment,
    /// so `http://example.org/ontology#conceptType` and `conceptType` are the
    /// same key.
    pub fn parse(raw: &str) -> Self {
        let name = raw.rsplit_once('#').map_or(raw, |(_, fragment)| fragment);
        match name {
            "title" => Self::Title,
            "source" => Self::Source,
            "_source" => Self::LegacySource,
            "author" => Self::Author,
            "conceptType" => Self::ConceptType,
            "glyphIcon" => Self::GlyphIcon,
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::Source => "source",
            Self::LegacySource => "_source",
            Self::Author => "author",
            Self::ConceptType => "conceptType",
            Self::GlyphIcon => "glyphIcon",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PropertyKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PropertyKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// A property value plus whatever metadata the backend attached to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyValue {
    pub value: Value,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl PropertyValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            metadata: Map::new(),
        }
    }

    /// Accept both the wrapped `{value, …}` record form and a bare value.
    pub fn from_raw(raw: Value) -> Self {
        match raw {
            Value::Object(mut fields) if fields.contains_key("value") => {
                let value = fields.remove("value").unwrap_or(Value::Null);
                Self {
                    value,
                    metadata: fields,
                }
            }
            other => Self {
                value: other,
                metadata: Map::new(),
            },
        }
    }

    /// A value counts as usable when it is neither `null` nor an empty
    /// string.
    pub fn is_usable(&self) -> bool {
        match &self.value {
            Value::Null => false,
            Value::String(text) => !text.is_empty(),
            _ => true,
        }
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::from_raw(raw))
    }
}

/// Typed property map for one vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(HashMap<PropertyKey, PropertyValue>);

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PropertyKey, value: PropertyValue) -> Option<PropertyValue> {
        self.0.insert(key, value)
    }

    pub fn remove(&mut self, key: &PropertyKey) -> Option<PropertyValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw value for `key`, if the property exists at all.
    pub fn value_of(&self, key: &PropertyKey) -> Option<&Value> {
        self.0.get(key).map(|property| &property.value)
    }

    /// The value for `key` when it is usable (neither null nor empty string).
    pub fn usable_value(&self, key: &PropertyKey) -> Option<&Value> {
        self.0
            .get(key)
            .filter(|property| property.is_usable())
            .map(|property| &property.value)
    }

    /// Text form of a usable value, for keys that carry strings.
    pub fn usable_str(&self, key: &PropertyKey) -> Option<&str> {
        self.usable_value(key).and_then(Value::as_str)
    }

    /// Display attribution derived from the source/author property pair:
    /// `"<source> / <author>"` when both are usable, the one that is when
    /// only one is, and the empty string otherwise.
    pub fn resolved_source(&self) -> String {
        let source = self.usable_str(&PropertyKey::Source);
        let author = self.usable_str(&PropertyKey::Author);
        match (source, author) {
            (Some(source), Some(author)) => format!("{source} / {author}"),
            (Some(source), None) => source.to_string(),
            (None, Some(author)) => author.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Promote the legacy `_source` property to `source` when `source` has no
    /// usable value. The legacy entry itself is left in place.
    pub fn promote_legacy_source(&mut self) {
        if self.usable_value(&PropertyKey::Source).is_some() {
            return;
        }
        let legacy = self
            .0
            .get(&PropertyKey::LegacySource)
            .filter(|property| property.is_usable())
            .cloned();
        if let Some(legacy) = legacy {
            self.0.insert(PropertyKey::Source, legacy);
        }
    }
}

impl FromIterator<(PropertyKey, PropertyValue)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (PropertyKey, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
