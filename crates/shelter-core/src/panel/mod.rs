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

//! Bottom-panel drag state machine.
//!
//! The panel splits the screen between the map (top) and the shelter list
//! (bottom). Its `offset` is how far the map has grown past its minimum
//! height, from `0` (collapsed, list fully visible) to `max_offset`
//! (expanded, map at its maximum height).
//!
//! [`PanelGestureController`] receives discrete [`PanelEvent`]s and returns
//! [`PanelCommand`]s for the host to execute (freeze or re-enable the list's
//! own scrolling, start a settle animation). It never runs timers itself.
//! Settle animations are tagged with a generation number; frames and
//! completions from a superseded animation are ignored.
//!
//! # Example
//!
//! ```
//! use shelter_core::panel::{PanelConfig, PanelEvent, PanelGestureController, PanelMode};
//!
//! let mut panel = PanelGestureController::new(PanelConfig::new(300.0, 600.0));
//! panel.handle(PanelEvent::Grant);
//! panel.handle(PanelEvent::Move { dy: 150.0 });
//! panel.handle(PanelEvent::Release { dy: 150.0 });
//! assert_eq!(panel.mode(), PanelMode::Expanded);
//! ```

mod animation;

pub use animation::{ease_in_out, AnimationKind, SettleAnimation, SpringConfig, FRAME_INTERVAL};

use std::time::Duration;

use log::debug;

/// Geometry and tuning for the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelConfig {
    /// Map height when collapsed.
    pub min_map_height: f64,
    /// Map height when expanded.
    pub max_map_height: f64,
    /// A gesture is vertical when `|dy| > claim_ratio * |dx|`.
    pub claim_ratio: f64,
    /// Release threshold is `max_offset / threshold_divisor`.
    pub threshold_divisor: f64,
    /// Spring for expand and snap-back.
    pub spring: SpringConfig,
    /// Duration of the collapse animation.
    pub collapse_duration: Duration,
}

impl PanelConfig {
    #[must_use]
    pub fn new(min_map_height: f64, max_map_height: f64) -> Self {
        Self {
            min_map_height,
            max_map_height,
            claim_ratio: 3.0,
            threshold_divisor: 3.0,
            spring: SpringConfig::default(),
            collapse_duration: Duration::from_millis(700),
        }
    }

    /// `MAX_MAP_HEIGHT - MIN_MAP_HEIGHT`, never negative.
    #[must_use]
    pub fn max_offset(&self) -> f64 {
        (self.max_map_height - self.min_map_height).max(0.0)
    }

    /// Net displacement a release must exceed to toggle the mode.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.max_offset() / self.threshold_divisor
    }
}

/// Last settled (or latched) resting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelMode {
    #[default]
    Collapsed,
    Expanded,
}

/// What the controller is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Resting,
    Dragging,
    Settling { generation: u64 },
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelState {
    pub mode: PanelMode,
    pub offset: f64,
    pub dragging: bool,
}

/// Raw gesture deltas used to decide whether the panel claims a touch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureDelta {
    pub dx: f64,
    pub dy: f64,
}

/// Discrete input events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelEvent {
    /// The panel was granted the touch responder.
    Grant,
    /// Cumulative vertical displacement since the grant.
    Move { dy: f64 },
    /// Finger lifted with the given cumulative displacement.
    Release { dy: f64 },
    /// Another responder took the touch stream.
    Terminate,
    /// Discrete tap on the drag handle.
    HandleTap,
    /// One animation frame for the given settle generation.
    SettleFrame { generation: u64, offset: f64 },
    /// The settle animation for `generation` reached its resting value.
    SettleComplete { generation: u64 },
}

/// Side effects the host must carry out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelCommand {
    FreezeListScroll,
    EnableListScroll,
    StartSettle {
        generation: u64,
        animation: SettleAnimation,
    },
}

/// Drag-driven state machine for the bottom panel.
#[derive(Debug, Clone)]
pub struct PanelGestureController {
    config: PanelConfig,
    mode: PanelMode,
    phase: PanelPhase,
    offset: f64,
    generation: u64,
    list_scroll_enabled: bool,
}

impl PanelGestureController {
    #[must_use]
    pub fn new(config: PanelConfig) -> Self {
        Self {
            config,
            mode: PanelMode::Collapsed,
            phase: PanelPhase::Resting,
            offset: 0.0,
            generation: 0,
            list_scroll_enabled: true,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> PanelMode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self) -> PanelPhase {
        self.phase
    }

    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    #[must_use]
    pub fn max_offset(&self) -> f64 {
        self.config.max_offset()
    }

    #[must_use]
    pub fn state(&self) -> PanelState {
        PanelState {
            mode: self.mode,
            offset: self.offset,
            dragging: self.phase == PanelPhase::Dragging,
        }
    }

    /// Current map height, animated with the offset.
    #[must_use]
    pub fn map_height(&self) -> f64 {
        self.config.min_map_height + self.offset
    }

    /// Whether the inner list may scroll on its own.
    #[must_use]
    pub fn list_scroll_enabled(&self) -> bool {
        self.list_scroll_enabled
    }

    /// Map gestures only reach the map while the panel rests collapsed.
    #[must_use]
    pub fn map_interactive(&self) -> bool {
        self.phase == PanelPhase::Resting && self.mode == PanelMode::Collapsed
    }

    /// Decide whether the panel should claim a touch.
    ///
    /// Only clearly vertical motion is claimed, and never while the list is
    /// mid-scroll, so the panel and the list don't fight over one stream.
    #[must_use]
    pub fn should_claim(&self, delta: GestureDelta, list_scrolling: bool) -> bool {
        !list_scrolling && delta.dy.abs() > self.config.claim_ratio * delta.dx.abs()
    }

    /// Apply one event and return the commands it produces.
    pub fn handle(&mut self, event: PanelEvent) -> Vec<PanelCommand> {
        match event {
            PanelEvent::Grant => self.on_grant(),
            PanelEvent::Move { dy } => {
                if self.phase == PanelPhase::Dragging {
                    self.offset = self.clamp(self.base_offset() + dy);
                }
                Vec::new()
            }
            PanelEvent::Release { dy } => self.on_release(dy),
            PanelEvent::Terminate => {
                if self.phase == PanelPhase::Dragging {
                    let target = self.resting_offset(self.mode);
                    vec![self.start_settle(target, AnimationKind::Spring(self.config.spring))]
                } else {
                    Vec::new()
                }
            }
            PanelEvent::HandleTap => {
                if self.mode == PanelMode::Expanded && self.phase != PanelPhase::Dragging {
                    self.collapse()
                } else {
                    Vec::new()
                }
            }
            PanelEvent::SettleFrame { generation, offset } => {
                if self.is_current_settle(generation) {
                    self.offset = self.clamp(offset);
                }
                Vec::new()
            }
            PanelEvent::SettleComplete { generation } => self.on_settle_complete(generation),
        }
    }

    fn on_grant(&mut self) -> Vec<PanelCommand> {
        if let PanelPhase::Settling { generation } = self.phase {
            debug!("Drag interrupted settle generation {}", generation);
        }
        self.phase = PanelPhase::Dragging;
        self.list_scroll_enabled = false;
        vec![PanelCommand::FreezeListScroll]
    }

    fn on_release(&mut self, dy: f64) -> Vec<PanelCommand> {
        if self.phase != PanelPhase::Dragging {
            return Vec::new();
        }

        let threshold = self.config.threshold();
        match self.mode {
            PanelMode::Collapsed if dy > threshold => {
                self.mode = PanelMode::Expanded;
                debug!("Panel expanding (dy {:.1} > {:.1})", dy, threshold);
                let target = self.max_offset();
                vec![self.start_settle(target, AnimationKind::Spring(self.config.spring))]
            }
            PanelMode::Expanded if dy < -threshold => {
                debug!("Panel collapsing (dy {:.1} < -{:.1})", dy, threshold);
                self.collapse()
            }
            mode => {
                let target = self.resting_offset(mode);
                vec![self.start_settle(target, AnimationKind::Spring(self.config.spring))]
            }
        }
    }

    fn collapse(&mut self) -> Vec<PanelCommand> {
        self.mode = PanelMode::Collapsed;
        let kind = AnimationKind::Timing {
            duration: self.config.collapse_duration,
        };
        vec![self.start_settle(0.0, kind)]
    }

    fn on_settle_complete(&mut self, generation: u64) -> Vec<PanelCommand> {
        if !self.is_current_settle(generation) {
            return Vec::new();
        }

        self.offset = self.resting_offset(self.mode);
        self.phase = PanelPhase::Resting;
        debug!("Panel settled {:?} at {:.1}", self.mode, self.offset);

        if self.mode == PanelMode::Collapsed {
            self.list_scroll_enabled = true;
            vec![PanelCommand::EnableListScroll]
        } else {
            Vec::new()
        }
    }

    fn start_settle(&mut self, target: f64, kind: AnimationKind) -> PanelCommand {
        self.generation += 1;
        self.phase = PanelPhase::Settling {
            generation: self.generation,
        };
        self.list_scroll_enabled = false;
        PanelCommand::StartSettle {
            generation: self.generation,
            animation: SettleAnimation {
                from: self.offset,
                to: target,
                kind,
            },
        }
    }

    fn is_current_settle(&self, generation: u64) -> bool {
        self.phase == PanelPhase::Settling { generation }
    }

    fn base_offset(&self) -> f64 {
        self.resting_offset(self.mode)
    }

    fn resting_offset(&self, mode: PanelMode) -> f64 {
        match mode {
            PanelMode::Collapsed => 0.0,
            PanelMode::Expanded => self.max_offset(),
        }
    }

    fn clamp(&self, offset: f64) -> f64 {
        if offset.is_nan() {
            return self.resting_offset(self.mode);
        }
        offset.clamp(0.0, self.max_offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: f64 = 300.0;

    fn controller() -> PanelGestureController {
        PanelGestureController::new(PanelConfig::new(300.0, 300.0 + MAX))
    }

    fn settle_generation(commands: &[PanelCommand]) -> u64 {
        commands
            .iter()
            .find_map(|c| match c {
                PanelCommand::StartSettle { generation, .. } => Some(*generation),
                _ => None,
            })
            .expect("settle command")
    }

    fn drag(panel: &mut PanelGestureController, dy: f64) -> Vec<PanelCommand> {
        panel.handle(PanelEvent::Grant);
        panel.handle(PanelEvent::Move { dy });
        panel.handle(PanelEvent::Release { dy })
    }

    fn drag_and_settle(panel: &mut PanelGestureController, dy: f64) -> Vec<PanelCommand> {
        let commands = drag(panel, dy);
        let generation = settle_generation(&commands);
        panel.handle(PanelEvent::SettleComplete { generation })
    }

    #[test]
    fn test_claim_requires_vertical_motion() {
        let panel = controller();
        assert!(panel.should_claim(GestureDelta { dx: 1.0, dy: 10.0 }, false));
        assert!(!panel.should_claim(GestureDelta { dx: 5.0, dy: 10.0 }, false));
        assert!(!panel.should_claim(GestureDelta { dx: 1.0, dy: 3.0 }, false));
        assert!(!panel.should_claim(GestureDelta { dx: 0.0, dy: 10.0 }, true));
    }

    #[test]
    fn test_grant_freezes_list() {
        let mut panel = controller();
        let commands = panel.handle(PanelEvent::Grant);
        assert_eq!(commands, vec![PanelCommand::FreezeListScroll]);
        assert!(panel.state().dragging);
        assert!(!panel.list_scroll_enabled());
        assert!(!panel.map_interactive());
    }

    #[test]
    fn test_move_clamps_offset() {
        let mut panel = controller();
        panel.handle(PanelEvent::Grant);
        panel.handle(PanelEvent::Move { dy: 1000.0 });
        assert!((panel.offset() - MAX).abs() < f64::EPSILON);
        panel.handle(PanelEvent::Move { dy: -50.0 });
        assert!(panel.offset().abs() < f64::EPSILON);
        panel.handle(PanelEvent::Move { dy: 120.0 });
        assert!((panel.offset() - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_move_without_grant_is_ignored() {
        let mut panel = controller();
        panel.handle(PanelEvent::Move { dy: 100.0 });
        assert!(panel.offset().abs() < f64::EPSILON);
        assert!(panel.handle(PanelEvent::Release { dy: 100.0 }).is_empty());
        assert_eq!(panel.mode(), PanelMode::Collapsed);
    }

    #[test]
    fn test_release_past_threshold_expands() {
        let mut panel = controller();
        let commands = drag(&mut panel, MAX / 2.0);
        assert_eq!(panel.mode(), PanelMode::Expanded);
        match commands[0] {
            PanelCommand::StartSettle { animation, .. } => {
                assert!((animation.to - MAX).abs() < f64::EPSILON);
                assert_eq!(animation.kind, AnimationKind::Spring(SpringConfig::default()));
            }
            other => panic!("unexpected {other:?}"),
        }

        let commands = panel.handle(PanelEvent::SettleComplete {
            generation: settle_generation(&commands),
        });
        assert!(commands.is_empty());
        assert!((panel.offset() - MAX).abs() < f64::EPSILON);
        assert!((panel.map_height() - 600.0).abs() < f64::EPSILON);
        assert!(!panel.list_scroll_enabled());
        assert!(!panel.map_interactive());
    }

    #[test]
    fn test_release_below_threshold_snaps_back() {
        let mut panel = controller();
        let commands = drag_and_settle(&mut panel, MAX / 5.0);
        assert_eq!(panel.mode(), PanelMode::Collapsed);
        assert!(panel.offset().abs() < f64::EPSILON);
        assert_eq!(commands, vec![PanelCommand::EnableListScroll]);
        assert!(panel.list_scroll_enabled());
    }

    #[test]
    fn test_upward_release_collapses_with_timing() {
        let mut panel = controller();
        drag_and_settle(&mut panel, MAX / 2.0);

        let commands = drag(&mut panel, -MAX / 2.0);
        assert_eq!(panel.mode(), PanelMode::Collapsed);
        match commands[0] {
            PanelCommand::StartSettle { animation, .. } => {
                assert!(animation.to.abs() < f64::EPSILON);
                assert!((animation.from - MAX / 2.0).abs() < f64::EPSILON);
                assert_eq!(
                    animation.kind,
                    AnimationKind::Timing {
                        duration: Duration::from_millis(700)
                    }
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_small_upward_release_stays_expanded() {
        let mut panel = controller();
        drag_and_settle(&mut panel, MAX);
        drag_and_settle(&mut panel, -MAX / 5.0);
        assert_eq!(panel.mode(), PanelMode::Expanded);
        assert!((panel.offset() - MAX).abs() < f64::EPSILON);
    }

    #[test]
    fn test_handle_tap_collapses_only_when_expanded() {
        let mut panel = controller();
        assert!(panel.handle(PanelEvent::HandleTap).is_empty());

        drag_and_settle(&mut panel, MAX);
        let commands = panel.handle(PanelEvent::HandleTap);
        assert_eq!(panel.mode(), PanelMode::Collapsed);
        assert!(matches!(
            commands[0],
            PanelCommand::StartSettle {
                animation: SettleAnimation {
                    kind: AnimationKind::Timing { .. },
                    ..
                },
                ..
            }
        ));
        assert!(!panel.map_interactive());

        panel.handle(PanelEvent::SettleComplete {
            generation: settle_generation(&commands),
        });
        assert!(panel.map_interactive());
    }

    #[test]
    fn test_stale_completion_ignored() {
        let mut panel = controller();
        let first = drag(&mut panel, MAX / 5.0);
        let stale = settle_generation(&first);

        // New drag starts before the snap-back finished
        panel.handle(PanelEvent::Grant);
        let cmds = panel.handle(PanelEvent::SettleComplete { generation: stale });
        assert!(cmds.is_empty());
        assert!(!panel.list_scroll_enabled());
        assert_eq!(panel.phase(), PanelPhase::Dragging);

        panel.handle(PanelEvent::SettleFrame {
            generation: stale,
            offset: 200.0,
        });
        assert!(panel.offset() < 200.0);
    }

    #[test]
    fn test_settle_frames_clamped() {
        let mut panel = controller();
        let commands = drag(&mut panel, MAX / 2.0);
        let generation = settle_generation(&commands);
        panel.handle(PanelEvent::SettleFrame {
            generation,
            offset: MAX + 12.0,
        });
        assert!((panel.offset() - MAX).abs() < f64::EPSILON);
    }

    #[test]
    fn test_terminate_snaps_back() {
        let mut panel = controller();
        panel.handle(PanelEvent::Grant);
        panel.handle(PanelEvent::Move { dy: 250.0 });
        let commands = panel.handle(PanelEvent::Terminate);
        assert_eq!(panel.mode(), PanelMode::Collapsed);
        match commands[0] {
            PanelCommand::StartSettle { animation, .. } => assert!(animation.to.abs() < f64::EPSILON),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_drag_from_expanded_uses_max_offset_base() {
        let mut panel = controller();
        drag_and_settle(&mut panel, MAX);
        panel.handle(PanelEvent::Grant);
        panel.handle(PanelEvent::Move { dy: -40.0 });
        assert!((panel.offset() - (MAX - 40.0)).abs() < f64::EPSILON);
    }
}
