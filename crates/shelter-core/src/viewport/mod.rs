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

//! Viewport bounds and marker visibility.
//!
//! Every camera change produces a padded bounding box. The padding makes the
//! query region larger than the visible screen so that small pans do not
//! churn the visible marker sets.

mod filter;

pub use filter::filter_visible;

use serde::{Deserialize, Serialize};

use crate::geo::{CameraRegion, GeoPoint};

/// Default multiplier applied to the camera's delta span.
pub const DEFAULT_PADDING_FACTOR: f64 = 2.0;

/// Axis-aligned lat/lon rectangle, inclusive on all four edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl ViewportBounds {
    /// Check whether a point lies inside the bounds (edges included).
    #[must_use]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude >= self.south_west.latitude
            && point.latitude <= self.north_east.latitude
            && point.longitude >= self.south_west.longitude
            && point.longitude <= self.north_east.longitude
    }

    /// A box with zero extent on either axis. Nothing is considered visible in it.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.north_east.latitude <= self.south_west.latitude
            || self.north_east.longitude <= self.south_west.longitude
    }
}

/// Derives padded [`ViewportBounds`] from camera regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBoundsCalculator {
    padding_factor: f64,
}

impl Default for GeoBoundsCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_PADDING_FACTOR)
    }
}

impl GeoBoundsCalculator {
    /// Negative factors are treated by magnitude.
    #[must_use]
    pub fn new(padding_factor: f64) -> Self {
        Self {
            padding_factor: padding_factor.abs(),
        }
    }

    #[must_use]
    pub fn padding_factor(&self) -> f64 {
        self.padding_factor
    }

    /// Compute the padded bounds for a camera region.
    ///
    /// Deltas are taken by magnitude, so the result always satisfies
    /// `south_west <= north_east` on both axes. A zero delta yields a
    /// degenerate box rather than an error.
    #[must_use]
    pub fn bounds(&self, region: &CameraRegion) -> ViewportBounds {
        let half_lat = region.latitude_delta.abs() * self.padding_factor / 2.0;
        let half_lon = region.longitude_delta.abs() * self.padding_factor / 2.0;

        ViewportBounds {
            south_west: GeoPoint::new(region.latitude - half_lat, region.longitude - half_lon),
            north_east: GeoPoint::new(region.latitude + half_lat, region.longitude + half_lon),
        }
    }
}
