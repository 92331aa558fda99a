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

//! Map viewport and bottom-panel engine for a disaster-shelter locator.
//!
//! The crate is split into layers that can be used on their own or through
//! [`ScreenOrchestrator`]:
//!
//! - **Viewport layer**: padded bounds from a camera region and per-category
//!   visibility filtering
//! - **Places layer**: normalization of raw provider records into
//!   [`CategoryPlace`] and the per-category registry [`CategoryDataStore`]
//! - **Panel layer**: drag-driven state machine for the map/list split, with
//!   spring and timing settle animations
//! - **List layer**: incremental pagination of the visible places
//!
//! Nothing here does I/O. Timers, fetches and animation frames are carried
//! out by the host, which feeds results back in as events.
//!
//! # Quick Start
//!
//! ```
//! use shelter_core::{CameraRegion, Category, CategoryPlace, GeoPoint, ScreenConfig, ScreenEvent, ScreenOrchestrator};
//!
//! let mut screen = ScreenOrchestrator::new(ScreenConfig::default());
//! screen.handle(ScreenEvent::DatasetLoaded {
//!     category: Category::Cold,
//!     places: vec![CategoryPlace::new(
//!         Category::Cold,
//!         "City Hall",
//!         "110 Sejong-daero",
//!         GeoPoint::new(37.5665, 126.978),
//!     )],
//! });
//! screen.handle(ScreenEvent::Camera(CameraRegion::new(37.5665, 126.978, 0.02, 0.02)));
//!
//! let model = screen.render();
//! assert_eq!(model.marker_count(), 1);
//! ```
//!
//! # Using Individual Layers
//!
//! ```
//! use shelter_core::viewport::{filter_visible, GeoBoundsCalculator};
//! use shelter_core::{CameraRegion, Category, CategoryPlace, GeoPoint};
//!
//! let bounds = GeoBoundsCalculator::default().bounds(&CameraRegion::new(37.5, 127.0, 0.1, 0.1));
//! let places = vec![CategoryPlace::new(Category::Aed, "Station", "", GeoPoint::new(37.55, 127.05))];
//! assert_eq!(filter_visible(&places, &bounds).len(), 1);
//! ```

pub mod alerts;
pub mod environment;
pub mod geo;
pub mod pagination;
pub mod panel;
pub mod places;
pub mod screen;
pub mod store;
pub mod timed;
pub mod viewport;

pub use geo::{format_distance_km, CameraChange, CameraRegion, GeoPoint};
pub use pagination::{IncrementalListLoader, ListWindow, ScrollMetrics};
pub use panel::{GestureDelta, PanelConfig, PanelGestureController, PanelMode, PanelState};
pub use places::{Category, CategoryPlace, CategorySet, CoordinatePolicy, FieldMap, PlaceNormalizer, RecordError};
pub use screen::{Effect, InfoCard, MarkerTap, RenderModel, ScreenConfig, ScreenEvent, ScreenOrchestrator};
pub use store::CategoryDataStore;
pub use timed::TimedVisibility;
pub use viewport::{filter_visible, GeoBoundsCalculator, ViewportBounds};
