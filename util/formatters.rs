/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Property-to-display projections.

use serde_json::Value;

use crate::model::properties::PropertyKey;
use crate::model::vertex::CachedVertex;

/// Display title for a vertex: the usable `title` property value rendered as
/// text. Non-string titles are stringified; a missing title is empty.
pub fn vertex_title(vertex: &CachedVertex) -> String {
    match vertex.properties.usable_value(&PropertyKey::Title) {
        Some(Value::String(title)) => title.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
