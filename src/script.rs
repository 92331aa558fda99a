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

//! Headless session scripts.
//!
//! A script is a JSON array of steps standing in for user input:
//!
//! ```json
//! [
//!   { "action": "camera", "region": { "latitude": 37.57, "longitude": 126.98,
//!                                     "latitudeDelta": 0.02, "longitudeDelta": 0.02 } },
//!   { "action": "drag", "dy": 200 },
//!   { "action": "wait", "ms": 1500 },
//!   { "action": "snapshot", "label": "expanded" }
//! ]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::Deserialize;
use shelter_core::panel::FRAME_INTERVAL;
use shelter_core::{CameraRegion, Category, GeoPoint, GestureDelta, MarkerTap, ScreenEvent, ScrollMetrics};
use thiserror::Error;

use crate::runtime::{ScreenRuntime, ScreenSnapshot};

/// Errors raised while loading a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Cannot read script {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid script: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_move_steps() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Camera-change event
    Camera { region: CameraRegion },
    Toggle { category: Category },
    UserLocation { latitude: f64, longitude: f64 },
    ScrollBegin,
    ScrollEnd,
    Scroll {
        viewport_height: f64,
        scroll_offset: f64,
        content_height: f64,
    },
    /// Drag the panel by `dy`, moving in `steps` increments one frame apart.
    /// With `release: false` the responder is taken away instead of released.
    Drag {
        #[serde(default)]
        dx: f64,
        dy: f64,
        #[serde(default = "default_move_steps")]
        steps: usize,
        #[serde(default = "default_true")]
        release: bool,
    },
    TapHandle,
    TapMarker { category: Category, index: usize },
    /// Let background tasks run.
    Wait { ms: u64 },
    /// Record the current render model.
    Snapshot {
        #[serde(default)]
        label: Option<String>,
    },
}

/// A labelled snapshot taken by a script.
#[derive(Debug, Clone)]
pub struct LabelledSnapshot {
    pub label: Option<String>,
    pub snapshot: ScreenSnapshot,
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>, ScriptError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&text)
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    Ok(serde_json::from_str(text)?)
}

/// Play the steps against the runtime and collect the requested snapshots.
pub async fn replay(runtime: &mut ScreenRuntime, steps: &[ScriptStep]) -> Vec<LabelledSnapshot> {
    let mut snapshots = Vec::new();
    for (n, step) in steps.iter().enumerate() {
        info!("Step {}: {:?}", n + 1, step);
        match step {
            ScriptStep::Camera { region } => runtime.dispatch(ScreenEvent::Camera(*region)),
            ScriptStep::Toggle { category } => runtime.dispatch(ScreenEvent::ToggleCategory(*category)),
            ScriptStep::UserLocation { latitude, longitude } => {
                runtime.dispatch(ScreenEvent::UserLocation(GeoPoint::new(*latitude, *longitude)));
            }
            ScriptStep::ScrollBegin => runtime.dispatch(ScreenEvent::ListScrollBegin),
            ScriptStep::ScrollEnd => runtime.dispatch(ScreenEvent::ListScrollEnd),
            ScriptStep::Scroll {
                viewport_height,
                scroll_offset,
                content_height,
            } => runtime.dispatch(ScreenEvent::ListScrolled(ScrollMetrics {
                viewport_height: *viewport_height,
                scroll_offset: *scroll_offset,
                content_height: *content_height,
            })),
            ScriptStep::Drag {
                dx,
                dy,
                steps,
                release,
            } => drag(runtime, *dx, *dy, *steps, *release).await,
            ScriptStep::TapHandle => runtime.dispatch(ScreenEvent::HandleTap),
            ScriptStep::TapMarker { category, index } => runtime.dispatch(ScreenEvent::MarkerTapped(MarkerTap {
                category: *category,
                index: *index,
            })),
            ScriptStep::Wait { ms } => runtime.run_for(Duration::from_millis(*ms)).await,
            ScriptStep::Snapshot { label } => snapshots.push(LabelledSnapshot {
                label: label.clone(),
                snapshot: runtime.snapshot(),
            }),
        }
    }
    snapshots
}

#[allow(
    clippy::cast_precision_loss,
    reason = "step counts are tiny"
)]
async fn drag(runtime: &mut ScreenRuntime, dx: f64, dy: f64, steps: usize, release: bool) {
    let steps = steps.max(1);
    let first = dy / steps as f64;
    runtime.dispatch(ScreenEvent::GestureStart(GestureDelta { dx: dx / steps as f64, dy: first }));
    for i in 1..=steps {
        runtime.dispatch(ScreenEvent::GestureMove {
            dy: dy * i as f64 / steps as f64,
        });
        runtime.run_for(FRAME_INTERVAL).await;
    }
    if release {
        runtime.dispatch(ScreenEvent::GestureRelease { dy });
    } else {
        runtime.dispatch(ScreenEvent::GestureTerminate);
    }
}
