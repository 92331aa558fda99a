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

//! Per-category dataset registry.
//!
//! The store holds the last fetched dataset for every [`Category`], the
//! category's enabled flag, and the subset currently inside the viewport.
//! All mutation goes through [`CategoryDataStore::set_dataset`],
//! [`CategoryDataStore::set_enabled`] and [`CategoryDataStore::set_bounds`];
//! each recomputes the affected visible subsets synchronously before
//! returning.
//!
//! Disabled categories are not refiltered on camera moves. They are marked
//! stale and refiltered when re-enabled.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info};

use crate::places::{Category, CategoryPlace, CategorySet};
use crate::viewport::{filter_visible, ViewportBounds};

/// Dataset, visible subset and toggle for one category.
#[derive(Debug, Clone)]
pub struct CategoryState {
    all: Vec<CategoryPlace>,
    visible: Vec<CategoryPlace>,
    enabled: bool,
    stale: bool,
}

impl CategoryState {
    fn new(enabled: bool) -> Self {
        Self {
            all: Vec::new(),
            visible: Vec::new(),
            enabled,
            stale: false,
        }
    }

    /// Full dataset, in source order.
    #[must_use]
    pub fn all(&self) -> &[CategoryPlace] {
        &self.all
    }

    /// Subset inside the current bounds, in source order.
    #[must_use]
    pub fn visible(&self) -> &[CategoryPlace] {
        &self.visible
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn recompute(&mut self, bounds: Option<&ViewportBounds>) {
        self.visible = match bounds {
            Some(bounds) => filter_visible(&self.all, bounds),
            None => Vec::new(),
        };
        self.stale = false;
    }
}

/// Registry of category datasets indexed by [`Category`].
#[derive(Debug, Clone)]
pub struct CategoryDataStore {
    states: [CategoryState; Category::COUNT],
    bounds: Option<ViewportBounds>,
    dedup_by_id: bool,
}

impl Default for CategoryDataStore {
    fn default() -> Self {
        Self::new(CategorySet::all())
    }
}

impl CategoryDataStore {
    /// Create an empty store with the given categories enabled.
    #[must_use]
    pub fn new(enabled: CategorySet) -> Self {
        Self {
            states: Category::ALL.map(|c| CategoryState::new(enabled.contains(c))),
            bounds: None,
            dedup_by_id: true,
        }
    }

    /// Enable or disable id-based dedup of incoming datasets.
    #[must_use]
    pub fn with_dedup(mut self, dedup_by_id: bool) -> Self {
        self.dedup_by_id = dedup_by_id;
        self
    }

    fn state_mut(&mut self, category: Category) -> &mut CategoryState {
        &mut self.states[category.index()]
    }

    /// State for one category.
    #[must_use]
    pub fn state(&self, category: Category) -> &CategoryState {
        &self.states[category.index()]
    }

    /// Replace a category's dataset. No merge with the previous data.
    ///
    /// When dedup is on, later records sharing an id with an earlier one are
    /// dropped. Records without an id are always kept.
    pub fn set_dataset(&mut self, category: Category, places: Vec<CategoryPlace>) {
        let places = if self.dedup_by_id {
            dedup_by_id(places)
        } else {
            places
        };

        info!("Loaded {} {} places", places.len(), category);

        let bounds = self.bounds;
        let state = self.state_mut(category);
        state.all = places;
        if state.enabled {
            state.recompute(bounds.as_ref());
        } else {
            state.stale = true;
        }
    }

    /// Toggle a category. Returns `true` if the flag changed.
    pub fn set_enabled(&mut self, category: Category, enabled: bool) -> bool {
        let bounds = self.bounds;
        let state = self.state_mut(category);
        if state.enabled == enabled {
            return false;
        }

        state.enabled = enabled;
        if enabled && state.stale {
            state.recompute(bounds.as_ref());
        }
        debug!("Category {} enabled={}", category, enabled);
        true
    }

    /// Flip a category's enabled flag and return the new value.
    pub fn toggle(&mut self, category: Category) -> bool {
        let enabled = !self.state(category).enabled;
        self.set_enabled(category, enabled);
        enabled
    }

    /// Apply new viewport bounds and refilter every enabled category.
    pub fn set_bounds(&mut self, bounds: ViewportBounds) {
        self.bounds = Some(bounds);
        for state in &mut self.states {
            if state.enabled {
                state.recompute(Some(&bounds));
            } else {
                state.stale = true;
            }
        }
    }

    /// Current viewport bounds, if a camera event has been seen.
    #[must_use]
    pub fn bounds(&self) -> Option<&ViewportBounds> {
        self.bounds.as_ref()
    }

    #[must_use]
    pub fn is_enabled(&self, category: Category) -> bool {
        self.state(category).enabled
    }

    /// The set of enabled categories.
    #[must_use]
    pub fn enabled_categories(&self) -> CategorySet {
        Category::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }

    /// Visible subset for an enabled category; empty when disabled.
    #[must_use]
    pub fn visible(&self, category: Category) -> &[CategoryPlace] {
        let state = self.state(category);
        if state.enabled {
            &state.visible
        } else {
            &[]
        }
    }

    /// Sum of visible places across enabled categories.
    #[must_use]
    pub fn combined_visible_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.visible.len())
            .sum()
    }

    /// Visible subsets keyed by category, enabled categories only.
    #[must_use]
    pub fn visible_markers(&self) -> BTreeMap<Category, &[CategoryPlace]> {
        Category::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .map(|c| (c, self.visible(c)))
            .collect()
    }
}

fn dedup_by_id(places: Vec<CategoryPlace>) -> Vec<CategoryPlace> {
    let mut seen = HashSet::new();
    let before = places.len();
    let kept: Vec<_> = places
        .into_iter()
        .filter(|p| p.id.as_ref().map_or(true, |id| seen.insert(id.clone())))
        .collect();
    if kept.len() < before {
        debug!("Dropped {} duplicate places", before - kept.len());
    }
    kept
}
