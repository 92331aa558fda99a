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

//! Event loop driving the screen orchestrator.
//!
//! Every input (script steps, fetch results, timer expiries, animation frames)
//! arrives as a [`ScreenEvent`] on one mpsc queue and is applied in order on
//! a single task. Effects returned by the orchestrator become background
//! tasks that report back through the same queue.

use std::time::Duration;

use log::{debug, info};
use serde::Serialize;
use shelter_core::panel::{SettleAnimation, FRAME_INTERVAL};
use shelter_core::{Effect, InfoCard, RenderModel, ScreenEvent, ScreenOrchestrator, TimedVisibility};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::sources::CategorySource;

/// Timing for the background tasks.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub page_load_latency: Duration,
    pub frame_interval: Duration,
    pub info_duration: Duration,
    /// Channel buffer size for queued events.
    pub buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            page_load_latency: Duration::from_secs(1),
            frame_interval: FRAME_INTERVAL,
            info_duration: Duration::from_secs(5),
            buffer_size: 256,
        }
    }
}

/// Render model plus the timed info card.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenSnapshot {
    #[serde(flatten)]
    pub model: RenderModel,
    pub info: Option<InfoCard>,
}

/// Owns the orchestrator and its event queue.
pub struct ScreenRuntime {
    screen: ScreenOrchestrator,
    info: TimedVisibility<InfoCard>,
    config: RuntimeConfig,
    event_tx: mpsc::Sender<ScreenEvent>,
    event_rx: mpsc::Receiver<ScreenEvent>,
    cancel_token: CancellationToken,
    settle_token: Option<CancellationToken>,
}

impl std::fmt::Debug for ScreenRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenRuntime")
            .field("screen", &self.screen)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ScreenRuntime {
    pub fn new(screen: ScreenOrchestrator, config: RuntimeConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.buffer_size);
        Self {
            screen,
            info: TimedVisibility::new(),
            config,
            event_tx,
            event_rx,
            cancel_token: CancellationToken::new(),
            settle_token: None,
        }
    }

    pub fn screen(&self) -> &ScreenOrchestrator {
        &self.screen
    }

    /// Apply one event now and start whatever it asks for.
    pub fn dispatch(&mut self, event: ScreenEvent) {
        for effect in self.screen.handle(event) {
            self.execute(effect);
        }
    }

    /// Process queued events until `duration` has passed.
    pub async fn run_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            tokio::select! {
                biased;
                event = self.event_rx.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => return,
                },
                () = sleep_until(deadline) => return,
            }
        }
    }

    /// Start one fire-and-forget fetch per source.
    pub fn spawn_fetches(&self, sources: Vec<CategorySource>, client: &reqwest::Client, api_key: Option<&str>, online: bool) {
        for source in sources {
            let tx = self.event_tx.clone();
            let client = client.clone();
            let api_key = api_key.map(ToString::to_string);
            let cancel_token = self.cancel_token.clone();

            tokio::spawn(async move {
                let category = source.category();
                let event = tokio::select! {
                    () = cancel_token.cancelled() => return,
                    result = source.load(&client, api_key.as_deref(), online) => match result {
                        Ok(places) => ScreenEvent::DatasetLoaded { category, places },
                        Err(e) => ScreenEvent::FetchFailed {
                            category,
                            reason: e.to_string(),
                        },
                    },
                };
                report(&tx, event).await;
            });
        }
    }

    pub fn snapshot(&self) -> ScreenSnapshot {
        ScreenSnapshot {
            model: self.screen.render(),
            info: self.info.current(),
        }
    }

    /// Stop every background task.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::StartSettle { generation, animation } => self.start_settle(generation, animation),
            Effect::SchedulePageLoad => {
                let tx = self.event_tx.clone();
                let latency = self.config.page_load_latency;
                let cancel_token = self.cancel_token.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        () = cancel_token.cancelled() => {}
                        () = sleep(latency) => {
                            report(&tx, ScreenEvent::PageLoadElapsed).await;
                        }
                    }
                });
            }
            Effect::ShowInfo(card) => {
                info!("Showing {} ({})", card.name, card.category_label);
                self.info.show(card, self.config.info_duration);
            }
            Effect::ListScroll { enabled } => debug!("List scroll enabled={}", enabled),
        }
    }

    fn start_settle(&mut self, generation: u64, animation: SettleAnimation) {
        // Superseded animations would be ignored anyway; stop their frames early
        if let Some(previous) = self.settle_token.take() {
            previous.cancel();
        }
        let token = self.cancel_token.child_token();
        self.settle_token = Some(token.clone());

        let tx = self.event_tx.clone();
        let frame_interval = self.config.frame_interval;
        let frames = animation.frames(frame_interval);
        debug!(
            "Settle #{} from {:.1} to {:.1} in {} frames",
            generation,
            animation.from,
            animation.to,
            frames.len()
        );

        tokio::spawn(async move {
            let mut ticker = interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            for offset in frames {
                tokio::select! {
                    () = token.cancelled() => return,
                    _ = ticker.tick() => {}
                }
                if !report(&tx, ScreenEvent::SettleFrame { generation, offset }).await {
                    return;
                }
            }
            report(&tx, ScreenEvent::SettleComplete { generation }).await;
        });
    }
}

/// Queue an event from a background task. Returns `false` once the runtime
/// has gone away.
async fn report(tx: &mpsc::Sender<ScreenEvent>, event: ScreenEvent) -> bool {
    match tx.send(event).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Runtime gone, dropping event: {}", e);
            false
        }
    }
}

impl Drop for ScreenRuntime {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelter_core::panel::{PanelMode, PanelPhase};
    use shelter_core::{
        CameraRegion, Category, CategoryPlace, GestureDelta, GeoPoint, MarkerTap, ScreenConfig, ScrollMetrics,
    };

    fn runtime() -> ScreenRuntime {
        let mut runtime = ScreenRuntime::new(ScreenOrchestrator::new(ScreenConfig::default()), RuntimeConfig::default());
        runtime.dispatch(ScreenEvent::Camera(CameraRegion::new(37.5665, 126.978, 0.02, 0.02)));
        runtime.dispatch(ScreenEvent::DatasetLoaded {
            category: Category::Cold,
            places: (0..30)
                .map(|i| CategoryPlace::new(Category::Cold, format!("shelter {i}"), "", GeoPoint::new(37.5665, 126.978)))
                .collect(),
        });
        runtime
    }

    fn drag(runtime: &mut ScreenRuntime, dy: f64) {
        runtime.dispatch(ScreenEvent::GestureStart(GestureDelta { dx: 0.0, dy: dy.signum() * 10.0 }));
        runtime.dispatch(ScreenEvent::GestureMove { dy });
        runtime.dispatch(ScreenEvent::GestureRelease { dy });
    }

    #[tokio::test(start_paused = true)]
    async fn test_expand_then_collapse() {
        let mut runtime = runtime();
        let max = runtime.screen().panel().max_offset();

        drag(&mut runtime, max / 2.0);
        assert!(!runtime.snapshot().model.map_interactive);
        runtime.run_for(Duration::from_secs(10)).await;

        let panel = runtime.screen().panel();
        assert_eq!(panel.mode(), PanelMode::Expanded);
        assert_eq!(panel.phase(), PanelPhase::Resting);
        assert!((panel.offset() - max).abs() < f64::EPSILON);
        assert!(!panel.list_scroll_enabled());
        assert!(!runtime.snapshot().model.map_interactive);

        runtime.dispatch(ScreenEvent::HandleTap);
        // Timing collapse takes 700ms
        runtime.run_for(Duration::from_millis(400)).await;
        let offset = runtime.screen().panel().offset();
        assert!(offset > 0.0 && offset < max, "mid-collapse offset {offset}");

        runtime.run_for(Duration::from_millis(500)).await;
        let panel = runtime.screen().panel();
        assert_eq!(panel.mode(), PanelMode::Collapsed);
        assert!(panel.offset().abs() < f64::EPSILON);
        assert!(panel.list_scroll_enabled());
        assert!(runtime.snapshot().model.map_interactive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_small_release_springs_back() {
        let mut runtime = runtime();
        let max = runtime.screen().panel().max_offset();

        drag(&mut runtime, max / 5.0);
        runtime.run_for(Duration::from_secs(10)).await;

        let panel = runtime.screen().panel();
        assert_eq!(panel.mode(), PanelMode::Collapsed);
        assert!(panel.offset().abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grant_interrupts_settle() {
        let mut runtime = runtime();
        let max = runtime.screen().panel().max_offset();

        drag(&mut runtime, max / 2.0);
        runtime.run_for(Duration::from_millis(100)).await;
        runtime.dispatch(ScreenEvent::GestureStart(GestureDelta { dx: 0.0, dy: -10.0 }));
        let frozen = runtime.screen().panel().offset();

        // Frames of the interrupted spring must not move the panel
        runtime.run_for(Duration::from_millis(500)).await;
        assert!((runtime.screen().panel().offset() - frozen).abs() < f64::EPSILON);
        assert_eq!(runtime.screen().panel().phase(), PanelPhase::Dragging);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_load_waits_for_latency() {
        let mut runtime = runtime();
        runtime.dispatch(ScreenEvent::ListScrolled(ScrollMetrics {
            viewport_height: 480.0,
            scroll_offset: 500.0,
            content_height: 1000.0,
        }));
        assert!(runtime.snapshot().model.loading_more);

        runtime.run_for(Duration::from_millis(900)).await;
        assert_eq!(runtime.snapshot().model.list_visible_counts[&Category::Cold], 10);

        runtime.run_for(Duration::from_millis(200)).await;
        let model = runtime.snapshot().model;
        assert_eq!(model.list_visible_counts[&Category::Cold], 20);
        assert!(!model.loading_more);
    }

    #[tokio::test(start_paused = true)]
    async fn test_marker_info_expires() {
        let mut runtime = runtime();
        runtime.dispatch(ScreenEvent::MarkerTapped(MarkerTap {
            category: Category::Cold,
            index: 3,
        }));
        assert_eq!(runtime.snapshot().info.map(|c| c.name).as_deref(), Some("shelter 3"));

        runtime.run_for(Duration::from_millis(5100)).await;
        assert!(runtime.snapshot().info.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_is_isolated() {
        let runtime_config = RuntimeConfig::default();
        let mut runtime = ScreenRuntime::new(ScreenOrchestrator::new(ScreenConfig::default()), runtime_config);
        let source = CategorySource::new(
            crate::config::DataSourceConfig {
                category: Category::Dust,
                url: None,
                csv_file: Some("missing.csv".to_string()),
                fields: shelter_core::FieldMap::default(),
                enabled: true,
            },
            std::path::Path::new("/nonexistent"),
            shelter_core::CoordinatePolicy::Coerce,
        );
        runtime.spawn_fetches(vec![source], &reqwest::Client::new(), None, false);
        runtime.run_for(Duration::from_millis(50)).await;

        assert!(runtime.screen().store().state(Category::Dust).all().is_empty());
        assert_eq!(runtime.snapshot().model.marker_count(), 0);
    }

    #[tokio::test]
    async fn test_report_after_runtime_gone() {
        let (tx, rx) = mpsc::channel(1);
        assert!(report(&tx, ScreenEvent::PageLoadElapsed).await);
        drop(rx);
        assert!(!report(&tx, ScreenEvent::PageLoadElapsed).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_with_pending_tasks() {
        let mut runtime = runtime();
        let max = runtime.screen().panel().max_offset();
        drag(&mut runtime, max / 2.0);
        runtime.dispatch(ScreenEvent::ListScrolled(ScrollMetrics {
            viewport_height: 480.0,
            scroll_offset: 500.0,
            content_height: 1000.0,
        }));
        drop(runtime);
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}
