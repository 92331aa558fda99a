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

//! Property-based tests for the viewport filter, the panel state machine and
//! list pagination.

use proptest::prelude::*;

use shelter_core::panel::PanelEvent;
use shelter_core::viewport::{filter_visible, GeoBoundsCalculator};
use shelter_core::{
    CameraRegion, Category, CategoryDataStore, CategoryPlace, CategorySet, GeoPoint, IncrementalListLoader,
    PanelConfig, PanelGestureController, ScrollMetrics,
};

fn places(category: Category) -> impl Strategy<Value = Vec<CategoryPlace>> {
    prop::collection::vec((36.5..38.5f64, 126.0..128.0f64), 0..40).prop_map(move |coords| {
        coords
            .into_iter()
            .enumerate()
            .map(|(i, (lat, lon))| CategoryPlace::new(category, format!("{category}-{i}"), "", GeoPoint::new(lat, lon)))
            .collect()
    })
}

fn region() -> impl Strategy<Value = CameraRegion> {
    (36.5..38.5f64, 126.0..128.0f64, -1.0..1.0f64, -1.0..1.0f64)
        .prop_map(|(lat, lon, dlat, dlon)| CameraRegion::new(lat, lon, dlat, dlon))
}

fn panel_event() -> impl Strategy<Value = PanelEvent> {
    prop_oneof![
        Just(PanelEvent::Grant),
        (-2000.0..2000.0f64).prop_map(|dy| PanelEvent::Move { dy }),
        (-2000.0..2000.0f64).prop_map(|dy| PanelEvent::Release { dy }),
        Just(PanelEvent::Terminate),
        Just(PanelEvent::HandleTap),
        (0..6u64, -2000.0..2000.0f64).prop_map(|(generation, offset)| PanelEvent::SettleFrame { generation, offset }),
        (0..6u64).prop_map(|generation| PanelEvent::SettleComplete { generation }),
    ]
}

fn category() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_bounds_are_ordered(region in region(), padding in -4.0..4.0f64) {
        let bounds = GeoBoundsCalculator::new(padding).bounds(&region);
        prop_assert!(bounds.south_west.latitude <= bounds.north_east.latitude);
        prop_assert!(bounds.south_west.longitude <= bounds.north_east.longitude);
    }

    #[test]
    fn prop_filter_is_ordered_subset(data in places(Category::Dust), region in region()) {
        let bounds = GeoBoundsCalculator::default().bounds(&region);
        let visible = filter_visible(&data, &bounds);

        // Subset in original order
        let mut rest = data.iter();
        for place in &visible {
            prop_assert!(rest.any(|p| p == place), "{place:?} not found in order");
            prop_assert!(bounds.contains(&place.location));
        }
    }

    #[test]
    fn prop_filter_is_idempotent(data in places(Category::Aed), region in region()) {
        let bounds = GeoBoundsCalculator::default().bounds(&region);
        let once = filter_visible(&data, &bounds);
        let twice = filter_visible(&once, &bounds);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_panel_offset_stays_in_range(events in prop::collection::vec(panel_event(), 0..60)) {
        let mut panel = PanelGestureController::new(PanelConfig::new(320.0, 640.0));
        let max = panel.max_offset();
        for event in events {
            for command in panel.handle(event) {
                if let shelter_core::panel::PanelCommand::StartSettle { animation, .. } = command {
                    prop_assert!((0.0..=max).contains(&animation.to));
                }
            }
            prop_assert!((0.0..=max).contains(&panel.offset()), "offset {} after {:?}", panel.offset(), event);
        }
    }

    #[test]
    fn prop_toggle_resets_pagination(
        cold in places(Category::Cold),
        hot in places(Category::Hot),
        loads in 0..4usize,
        toggled in category(),
    ) {
        let enabled: CategorySet = [Category::Cold, Category::Hot].into_iter().collect();
        let mut store = CategoryDataStore::new(enabled);
        store.set_bounds(GeoBoundsCalculator::default().bounds(&CameraRegion::new(37.5, 127.0, 1.0, 1.0)));
        store.set_dataset(Category::Cold, cold);
        store.set_dataset(Category::Hot, hot);

        let mut loader = IncrementalListLoader::new(10, 0.8, store.enabled_categories());
        let bottom = ScrollMetrics { viewport_height: 100.0, scroll_offset: 100.0, content_height: 200.0 };
        for _ in 0..loads {
            if let Some(ticket) = loader.on_scroll(bottom, store.combined_visible_count()) {
                loader.complete_load(ticket, store.combined_visible_count());
            }
        }

        let rows_per_category = |loader: &IncrementalListLoader, store: &CategoryDataStore| {
            let rows = loader.rows(store);
            Category::ALL.map(|c| rows.iter().filter(|p| p.category == c).count())
        };
        let before = rows_per_category(&loader, &store);

        store.toggle(toggled);
        loader.sync_categories(store.enabled_categories());
        store.toggle(toggled);
        loader.sync_categories(store.enabled_categories());

        let after = rows_per_category(&loader, &store);
        prop_assert_eq!(loader.visible_count(toggled), 10);
        for c in Category::ALL {
            if c == toggled {
                let expected = if store.is_enabled(c) { store.visible(c).len().min(10) } else { 0 };
                prop_assert_eq!(after[c.index()], expected);
            } else {
                prop_assert_eq!(after[c.index()], before[c.index()]);
            }
        }
    }
}
