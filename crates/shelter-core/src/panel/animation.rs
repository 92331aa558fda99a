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

//! Settle animations for the bottom panel.
//!
//! Two curves are used: a spring (expand and snap-back) and a fixed-duration
//! ease-in-out timing curve (collapse). Both are sampled into a frame
//! sequence whose last value is exactly the target, so a driver can replay
//! the frames and then fire the completion event.

use std::time::Duration;

/// Default frame interval (~60 fps).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

// Rest thresholds for the spring, in offset units
const REST_DISPLACEMENT_THRESHOLD: f64 = 0.001;
const REST_SPEED_THRESHOLD: f64 = 0.001;
const MAX_SPRING_FRAMES: usize = 600;
const SPRING_SUBSTEPS: u32 = 8;

/// Spring parameters in tension/friction form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub tension: f64,
    pub friction: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            tension: 50.0,
            friction: 10.0,
        }
    }
}

impl SpringConfig {
    /// Tension/friction mapped onto a unit-mass spring's stiffness.
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        (self.tension - 30.0) * 3.62 + 194.0
    }

    #[must_use]
    pub fn damping(&self) -> f64 {
        (self.friction - 8.0) * 3.0 + 25.0
    }
}

/// Curve used to reach the resting offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationKind {
    Spring(SpringConfig),
    Timing { duration: Duration },
}

/// An animation from the current offset to a resting offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleAnimation {
    pub from: f64,
    pub to: f64,
    pub kind: AnimationKind,
}

impl SettleAnimation {
    /// Sample the animation at `frame_interval`.
    ///
    /// Always returns at least one frame and the last frame equals `to`.
    #[must_use]
    pub fn frames(&self, frame_interval: Duration) -> Vec<f64> {
        let mut frames = match self.kind {
            AnimationKind::Spring(spring) => self.spring_frames(spring, frame_interval),
            AnimationKind::Timing { duration } => self.timing_frames(duration, frame_interval),
        };
        match frames.last_mut() {
            Some(last) => *last = self.to,
            None => frames.push(self.to),
        }
        frames
    }

    fn spring_frames(&self, spring: SpringConfig, frame_interval: Duration) -> Vec<f64> {
        let stiffness = spring.stiffness();
        let damping = spring.damping();
        let dt = frame_interval.as_secs_f64() / f64::from(SPRING_SUBSTEPS);

        let mut position = self.from;
        let mut velocity = 0.0;
        let mut frames = Vec::new();

        for _ in 0..MAX_SPRING_FRAMES {
            for _ in 0..SPRING_SUBSTEPS {
                let force = -stiffness * (position - self.to) - damping * velocity;
                velocity += force * dt;
                position += velocity * dt;
            }
            frames.push(position);

            if (position - self.to).abs() <= REST_DISPLACEMENT_THRESHOLD
                && velocity.abs() <= REST_SPEED_THRESHOLD
            {
                break;
            }
        }
        frames
    }

    fn timing_frames(&self, duration: Duration, frame_interval: Duration) -> Vec<f64> {
        let interval = frame_interval.as_secs_f64();
        if interval <= 0.0 || duration.is_zero() {
            return Vec::new();
        }

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "frame count is small and positive"
        )]
        let count = (duration.as_secs_f64() / interval).ceil().max(1.0) as u32;

        (1..=count)
            .map(|i| {
                let progress = ease_in_out(f64::from(i) / f64::from(count));
                self.from + (self.to - self.from) * progress
            })
            .collect()
    }
}

/// Symmetric ease-in-out built from the inertial `ease` curve.
#[must_use]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        ease(t * 2.0) / 2.0
    } else {
        1.0 - ease((1.0 - t) * 2.0) / 2.0
    }
}

/// Cubic bezier (0.42, 0, 1, 1).
fn ease(x: f64) -> f64 {
    cubic_bezier(0.42, 0.0, 1.0, 1.0, x)
}

fn bezier_sample(a1: f64, a2: f64, t: f64) -> f64 {
    ((1.0 - 3.0 * a2 + 3.0 * a1) * t + (3.0 * a2 - 6.0 * a1)) * t * t + 3.0 * a1 * t
}

fn bezier_slope(a1: f64, a2: f64, t: f64) -> f64 {
    3.0 * (1.0 - 3.0 * a2 + 3.0 * a1) * t * t + 2.0 * (3.0 * a2 - 6.0 * a1) * t + 3.0 * a1
}

fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Newton-Raphson first, bisection if the slope is too flat
    let mut t = x;
    for _ in 0..8 {
        let slope = bezier_slope(x1, x2, t);
        if slope.abs() < 1e-6 {
            break;
        }
        let err = bezier_sample(x1, x2, t) - x;
        if err.abs() < 1e-7 {
            return bezier_sample(y1, y2, t);
        }
        t -= err / slope;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    t = x;
    for _ in 0..40 {
        let value = bezier_sample(x1, x2, t);
        if (value - x).abs() < 1e-7 {
            break;
        }
        if value < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) / 2.0;
    }
    bezier_sample(y1, y2, t)
}
