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

//! Screen orchestration.
//!
//! [`ScreenOrchestrator`] owns the bounds calculator, the category store, the
//! panel controller and the list loader. It consumes [`ScreenEvent`]s one at
//! a time and returns the [`Effect`]s the host has to carry out (timers,
//! animations, info display). All state changes happen synchronously inside
//! [`ScreenOrchestrator::handle`]; the host owns every suspension point.

mod render;

pub use render::{InfoCard, ListRow, MarkerPrimitive, MarkerTap, PanelView, RenderModel};

use log::{debug, info, warn};

use crate::geo::{CameraRegion, GeoPoint};
use crate::pagination::{IncrementalListLoader, LoadTicket, ScrollMetrics, DEFAULT_PAGE_SIZE, DEFAULT_TRIGGER_RATIO};
use crate::panel::{GestureDelta, PanelCommand, PanelConfig, PanelEvent, PanelGestureController, SettleAnimation};
use crate::places::{Category, CategoryPlace, CategorySet};
use crate::store::CategoryDataStore;
use crate::viewport::{GeoBoundsCalculator, DEFAULT_PADDING_FACTOR};

/// Static screen configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    /// Height shared by the map and the list.
    pub screen_height: f64,
    pub panel: PanelConfig,
    pub padding_factor: f64,
    pub page_size: usize,
    pub trigger_ratio: f64,
    /// Categories shown on start.
    pub enabled: CategorySet,
    pub dedup_by_id: bool,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            screen_height: 800.0,
            panel: PanelConfig::new(320.0, 640.0),
            padding_factor: DEFAULT_PADDING_FACTOR,
            page_size: DEFAULT_PAGE_SIZE,
            trigger_ratio: DEFAULT_TRIGGER_RATIO,
            enabled: CategorySet::all(),
            dedup_by_id: true,
        }
    }
}

/// Input to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEvent {
    /// The map camera settled on a new region.
    Camera(CameraRegion),
    /// A category fetch finished.
    DatasetLoaded {
        category: Category,
        places: Vec<CategoryPlace>,
    },
    /// A category fetch failed. The previous dataset is kept.
    FetchFailed { category: Category, reason: String },
    ToggleCategory(Category),
    SetCategoryEnabled { category: Category, enabled: bool },
    UserLocation(GeoPoint),
    /// The list started a scroll of its own.
    ListScrollBegin,
    ListScrollEnd,
    ListScrolled(ScrollMetrics),
    /// The simulated page-load latency has elapsed.
    PageLoadElapsed,
    /// A touch started moving over the panel; decides the claim.
    GestureStart(GestureDelta),
    GestureMove { dy: f64 },
    GestureRelease { dy: f64 },
    /// The responder was taken away mid-gesture.
    GestureTerminate,
    HandleTap,
    SettleFrame { generation: u64, offset: f64 },
    SettleComplete { generation: u64 },
    MarkerTapped(MarkerTap),
}

/// Work the host has to do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Drive `animation` at the frame rate, then send `SettleComplete`.
    StartSettle {
        generation: u64,
        animation: SettleAnimation,
    },
    /// Wait out the page-load latency, then send `PageLoadElapsed`.
    SchedulePageLoad,
    /// Show the card for a limited time.
    ShowInfo(InfoCard),
    /// Whether the list may scroll by itself.
    ListScroll { enabled: bool },
}

/// Owns the map/list screen state.
#[derive(Debug)]
pub struct ScreenOrchestrator {
    config: ScreenConfig,
    calculator: GeoBoundsCalculator,
    store: CategoryDataStore,
    panel: PanelGestureController,
    loader: IncrementalListLoader,
    pending_load: Option<LoadTicket>,
    list_scrolling: bool,
    user_location: Option<GeoPoint>,
}

impl ScreenOrchestrator {
    #[must_use]
    pub fn new(config: ScreenConfig) -> Self {
        let store = CategoryDataStore::new(config.enabled).with_dedup(config.dedup_by_id);
        Self {
            calculator: GeoBoundsCalculator::new(config.padding_factor),
            panel: PanelGestureController::new(config.panel),
            loader: IncrementalListLoader::new(config.page_size, config.trigger_ratio, store.enabled_categories()),
            store,
            pending_load: None,
            list_scrolling: false,
            user_location: None,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &CategoryDataStore {
        &self.store
    }

    #[must_use]
    pub fn panel(&self) -> &PanelGestureController {
        &self.panel
    }

    #[must_use]
    pub fn loader(&self) -> &IncrementalListLoader {
        &self.loader
    }

    /// Apply one event.
    pub fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Camera(region) => {
                let bounds = self.calculator.bounds(&region);
                debug!(
                    "Camera at ({:.5}, {:.5}), bounds {:?}",
                    region.latitude, region.longitude, bounds
                );
                self.store.set_bounds(bounds);
                Vec::new()
            }
            ScreenEvent::DatasetLoaded { category, places } => {
                self.store.set_dataset(category, places);
                Vec::new()
            }
            ScreenEvent::FetchFailed { category, reason } => {
                warn!(
                    "Fetch for {} failed, keeping {} cached places: {}",
                    category,
                    self.store.state(category).all().len(),
                    reason
                );
                Vec::new()
            }
            ScreenEvent::ToggleCategory(category) => {
                self.store.toggle(category);
                self.sync_list();
                Vec::new()
            }
            ScreenEvent::SetCategoryEnabled { category, enabled } => {
                if self.store.set_enabled(category, enabled) {
                    self.sync_list();
                }
                Vec::new()
            }
            ScreenEvent::UserLocation(location) => {
                self.user_location = Some(location);
                Vec::new()
            }
            ScreenEvent::ListScrollBegin => {
                self.list_scrolling = self.panel.list_scroll_enabled();
                Vec::new()
            }
            ScreenEvent::ListScrollEnd => {
                self.list_scrolling = false;
                Vec::new()
            }
            ScreenEvent::ListScrolled(metrics) => self.on_list_scrolled(metrics),
            ScreenEvent::PageLoadElapsed => {
                match self.pending_load.take() {
                    Some(ticket) => {
                        self.loader.complete_load(ticket, self.store.combined_visible_count());
                        debug!("List now shows {} rows", self.loader.rows(&self.store).len());
                    }
                    None => debug!("Page load elapsed with nothing pending"),
                }
                Vec::new()
            }
            ScreenEvent::GestureStart(delta) => {
                if self.panel.should_claim(delta, self.list_scrolling) {
                    self.drive_panel(PanelEvent::Grant)
                } else {
                    debug!("Gesture not claimed (dx={:.1}, dy={:.1})", delta.dx, delta.dy);
                    Vec::new()
                }
            }
            ScreenEvent::GestureMove { dy } => self.drive_panel(PanelEvent::Move { dy }),
            ScreenEvent::GestureRelease { dy } => self.drive_panel(PanelEvent::Release { dy }),
            ScreenEvent::GestureTerminate => self.drive_panel(PanelEvent::Terminate),
            ScreenEvent::HandleTap => self.drive_panel(PanelEvent::HandleTap),
            ScreenEvent::SettleFrame { generation, offset } => {
                self.drive_panel(PanelEvent::SettleFrame { generation, offset })
            }
            ScreenEvent::SettleComplete { generation } => self.drive_panel(PanelEvent::SettleComplete { generation }),
            ScreenEvent::MarkerTapped(tap) => self.on_marker_tapped(tap),
        }
    }

    /// Snapshot for the presentation layer.
    #[must_use]
    pub fn render(&self) -> RenderModel {
        let markers = self
            .store
            .visible_markers()
            .into_iter()
            .map(|(category, places)| {
                let primitives = places
                    .iter()
                    .enumerate()
                    .map(|(index, place)| MarkerPrimitive {
                        position: place.location,
                        caption: place.name.clone(),
                        icon: category.icon(),
                        tap: MarkerTap { category, index },
                    })
                    .collect();
                (category, primitives)
            })
            .collect();

        let list_rows = self
            .loader
            .rows(&self.store)
            .into_iter()
            .map(|place| ListRow::new(place, self.user_location.as_ref()))
            .collect();

        let window = self.loader.window();
        let list_visible_counts = self
            .store
            .enabled_categories()
            .iter()
            .map(|category| (category, window.visible_count(category)))
            .collect();

        let map_height = self.panel.map_height();
        RenderModel {
            map_height,
            list_height: (self.config.screen_height - map_height).max(0.0),
            panel: self.panel.state().into(),
            markers,
            list_rows,
            list_visible_counts,
            loading_more: window.loading,
            list_scroll_enabled: self.panel.list_scroll_enabled(),
            map_interactive: self.panel.map_interactive(),
        }
    }

    fn sync_list(&mut self) {
        if self.loader.sync_categories(self.store.enabled_categories()) {
            info!(
                "Showing {} categories, {} places in view",
                self.store.enabled_categories().iter().count(),
                self.store.combined_visible_count()
            );
        }
    }

    fn on_list_scrolled(&mut self, metrics: ScrollMetrics) -> Vec<Effect> {
        if !self.panel.list_scroll_enabled() {
            debug!("Ignoring list scroll while the list is frozen");
            return Vec::new();
        }
        match self.loader.on_scroll(metrics, self.store.combined_visible_count()) {
            Some(ticket) => {
                self.pending_load = Some(ticket);
                vec![Effect::SchedulePageLoad]
            }
            None => Vec::new(),
        }
    }

    fn on_marker_tapped(&self, tap: MarkerTap) -> Vec<Effect> {
        match self.store.visible(tap.category).get(tap.index) {
            Some(place) => {
                let row = ListRow::new(place, self.user_location.as_ref());
                vec![Effect::ShowInfo(row.into())]
            }
            None => {
                debug!("Tap on stale marker {}#{}", tap.category, tap.index);
                Vec::new()
            }
        }
    }

    fn drive_panel(&mut self, event: PanelEvent) -> Vec<Effect> {
        self.panel
            .handle(event)
            .into_iter()
            .map(|command| match command {
                PanelCommand::FreezeListScroll => {
                    self.list_scrolling = false;
                    Effect::ListScroll { enabled: false }
                }
                PanelCommand::EnableListScroll => Effect::ListScroll { enabled: true },
                PanelCommand::StartSettle { generation, animation } => Effect::StartSettle { generation, animation },
            })
            .collect()
    }
}
