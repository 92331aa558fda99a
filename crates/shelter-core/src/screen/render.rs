// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Presentation-layer snapshot types.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::geo::{format_distance_km, GeoPoint};
use crate::panel::PanelState;
use crate::places::{Category, CategoryPlace};

/// Identifies a marker for tap callbacks: index into the category's visible subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
pub struct MarkerTap {
    pub category: Category,
    pub index: usize,
}

/// One marker for the external map renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPrimitive {
    pub position: GeoPoint,
    pub caption: String,
    pub icon: &'static str,
    pub tap: MarkerTap,
}

/// One row of the shelter list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListRow {
    pub name: String,
    pub address: String,
    pub category: Category,
    pub category_label: &'static str,
    /// Distance from the user, e.g. `"1.2KM"`, when the user location is known.
    pub distance: Option<String>,
}

impl ListRow {
    pub(crate) fn new(place: &CategoryPlace, user: Option<&GeoPoint>) -> Self {
        Self {
            name: place.name.clone(),
            address: place.address.clone(),
            category: place.category,
            category_label: place.category.label(),
            distance: user.map(|u| format_distance_km(u.distance_km(&place.location))),
        }
    }
}

/// Info card shown for a tapped marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoCard {
    pub name: String,
    pub address: String,
    pub category_label: &'static str,
    pub distance: Option<String>,
}

impl From<ListRow> for InfoCard {
    fn from(row: ListRow) -> Self {
        Self {
            name: row.name,
            address: row.address,
            category_label: row.category_label,
            distance: row.distance,
        }
    }
}

/// Everything the presentation layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderModel {
    pub map_height: f64,
    pub list_height: f64,
    pub panel: PanelView,
    pub markers: BTreeMap<Category, Vec<MarkerPrimitive>>,
    pub list_rows: Vec<ListRow>,
    /// Materialized list rows per enabled category.
    pub list_visible_counts: BTreeMap<Category, usize>,
    pub loading_more: bool,
    pub list_scroll_enabled: bool,
    pub map_interactive: bool,
}

impl RenderModel {
    /// Total markers across categories.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.values().map(Vec::len).sum()
    }
}

/// Serializable mirror of [`PanelState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelView {
    pub expanded: bool,
    pub offset: f64,
    pub dragging: bool,
}

impl From<PanelState> for PanelView {
    fn from(state: PanelState) -> Self {
        Self {
            expanded: state.mode == crate::panel::PanelMode::Expanded,
            offset: state.offset,
            dragging: state.dragging,
        }
    }
}
