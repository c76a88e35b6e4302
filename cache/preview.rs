/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Derived preview/thumbnail fields for cached vertices.
//!
//! A usable glyph-icon property wins outright; otherwise the resolved
//! concept's display type picks the artifact endpoints. Callers resolve the
//! concept before calling in; without one, only the glyph-icon branch can
//! apply.

use url::form_urlencoded;

use crate::model::properties::PropertyKey;
use crate::model::vertex::CachedVertex;
use crate::registries::concept::ConceptDisplayType;

pub(crate) fn set_previews(record: &mut CachedVertex, workspace_id: &str) {
    record.image_src_is_from_concept = false;

    let glyph_href = record
        .properties
        .usable_str(&PropertyKey::GlyphIcon)
        .map(str::to_owned);

    if let Some(href) = glyph_href {
        let sep = if href.contains('?') { '&' } else { '?' };
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("workspaceId", workspace_id)
            .finish();
        record.image_src = Some(format!("{href}{sep}{query}"));
        return;
    }

    let Some(concept) = record.concept.as_ref() else {
        return;
    };
    let display_type = concept.display_type;
    let concept_glyph = concept.glyph_icon_href.clone();

    match display_type {
        ConceptDisplayType::Image => {
            record.image_src = Some(artifact_url("thumbnail", &record.id, workspace_id));
            record.image_raw_src = Some(artifact_url("raw", &record.id, workspace_id));
        }
        ConceptDisplayType::Video => {
            record.image_src = Some(artifact_url("poster-frame", &record.id, workspace_id));
            record.image_raw_src = Some(artifact_url("raw", &record.id, workspace_id));
            record.image_frames_src =
                Some(artifact_url("video-preview", &record.id, workspace_id));
        }
        ConceptDisplayType::Generic => {
            record.image_src = concept_glyph;
            record.image_raw_src = Some(artifact_url("raw", &record.id, workspace_id));
            record.image_src_is_from_concept = true;
        }
    }
}

/// `artifact/{type}?graphVertexId=<id>&workspaceId=<workspace>`.
fn artifact_url(artifact_type: &str, vertex_id: &str, workspace_id: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("graphVertexId", vertex_id)
        .append_pair("workspaceId", workspace_id)
        .finish();
    format!("artifact/{artifact_type}?{query}")
}
