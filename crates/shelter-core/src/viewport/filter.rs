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

//! Marker visibility filtering.

use super::ViewportBounds;
use crate::places::CategoryPlace;

/// Return the places inside `bounds`, preserving their original order.
///
/// Pure and synchronous so it can run inside a render/update cycle. A
/// degenerate box yields an empty set.
#[must_use]
pub fn filter_visible(places: &[CategoryPlace], bounds: &ViewportBounds) -> Vec<CategoryPlace> {
    if bounds.is_degenerate() {
        return Vec::new();
    }

    places
        .iter()
        .filter(|p| bounds.contains(&p.location))
        .cloned()
        .collect()
}
