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

//! Incremental list loading.
//!
//! The shelter list materializes only the first `visible_count` rows of each
//! enabled category, and every category keeps its own count. Scrolling near
//! the bottom requests another page; the host waits out a fixed latency and
//! then calls [`IncrementalListLoader::complete_load`], which grows every
//! enabled category by one page.
//!
//! A category's count only grows while its membership in the enabled set
//! stays the same. Enabling or disabling it resets that category's count to
//! the initial page size and leaves the others alone.

use log::debug;

use crate::places::{Category, CategoryPlace, CategorySet};
use crate::store::CategoryDataStore;

/// Rows added per load.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Scroll progress past which the next page is requested.
pub const DEFAULT_TRIGGER_RATIO: f64 = 0.8;

/// Scroll position reported by the list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub viewport_height: f64,
    pub scroll_offset: f64,
    pub content_height: f64,
}

impl ScrollMetrics {
    /// Fraction of the content scrolled past the bottom edge of the viewport.
    /// `None` while there is no content to measure.
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        if self.content_height > 0.0 {
            Some((self.viewport_height + self.scroll_offset) / self.content_height)
        } else {
            None
        }
    }
}

/// Pagination state exposed to the list renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListWindow {
    counts: [usize; Category::COUNT],
    pub loading: bool,
}

impl ListWindow {
    /// Rows materialized for one category.
    #[must_use]
    pub fn visible_count(&self, category: Category) -> usize {
        self.counts[category.index()]
    }
}

/// Proof that a load was scheduled. Hand it back to `complete_load`.
#[derive(Debug)]
#[must_use = "a scheduled load must be completed to clear the loading guard"]
pub struct LoadTicket {
    _private: (),
}

/// Paginates the visible places of every enabled category.
#[derive(Debug, Clone)]
pub struct IncrementalListLoader {
    page_size: usize,
    trigger_ratio: f64,
    window: ListWindow,
    categories: CategorySet,
}

impl IncrementalListLoader {
    #[must_use]
    pub fn new(page_size: usize, trigger_ratio: f64, categories: CategorySet) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            trigger_ratio,
            window: ListWindow {
                counts: [page_size; Category::COUNT],
                loading: false,
            },
            categories,
        }
    }

    #[must_use]
    pub fn window(&self) -> ListWindow {
        self.window
    }

    #[must_use]
    pub fn visible_count(&self, category: Category) -> usize {
        self.window.visible_count(category)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.window.loading
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Bind to the current enabled-category set. Every category whose
    /// membership changed goes back to the first page. Returns `true` if any
    /// category was reset.
    ///
    /// An in-flight load is left alone; its increment lands on the reset
    /// counts when it completes.
    pub fn sync_categories(&mut self, categories: CategorySet) -> bool {
        let mut reset = false;
        for category in Category::ALL {
            if categories.contains(category) != self.categories.contains(category) {
                self.window.counts[category.index()] = self.page_size;
                debug!("{} list reset to {} rows", category, self.page_size);
                reset = true;
            }
        }
        self.categories = categories;
        reset
    }

    /// Handle a scroll event. `total` is the combined visible count of the
    /// enabled categories. Returns a ticket when a page load should start.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, total: usize) -> Option<LoadTicket> {
        let progress = metrics.progress()?;
        if progress <= self.trigger_ratio || self.window.loading {
            return None;
        }
        if self.categories.iter().all(|c| self.visible_count(c) >= total) {
            debug!("All {} rows already loaded", total);
            return None;
        }

        self.window.loading = true;
        Some(LoadTicket { _private: () })
    }

    /// Finish a load: every enabled category grows by one page, capped at
    /// `total`.
    pub fn complete_load(&mut self, ticket: LoadTicket, total: usize) {
        let LoadTicket { _private: () } = ticket;
        self.window.loading = false;

        let mut grew = false;
        for category in self.categories.iter() {
            let count = &mut self.window.counts[category.index()];
            let next = (*count + self.page_size).min(total).max(*count);
            grew |= next != *count;
            *count = next;
        }
        if !grew {
            debug!("Load finished at cap ({} rows)", total);
        }
    }

    /// Rows to render: the first `visible_count` places of each enabled
    /// category, in category display order.
    #[must_use]
    pub fn rows<'a>(&self, store: &'a CategoryDataStore) -> Vec<&'a CategoryPlace> {
        store
            .enabled_categories()
            .iter()
            .flat_map(|category| store.visible(category).iter().take(self.visible_count(category)))
            .collect()
    }
}
