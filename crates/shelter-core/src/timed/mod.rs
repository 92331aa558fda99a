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

//! Values that are shown for a limited time.
//!
//! [`TimedVisibility`] holds an optional value (e.g. the info card for a tapped
//! marker) and clears it after a delay. A new `show` cancels the pending hide
//! of the previous one, so overlapping requests never hide the latest value
//! early. Requires a running tokio runtime.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
struct Shown<T> {
    generation: u64,
    value: T,
}

/// A value with a cancellable auto-hide timer.
#[derive(Debug)]
pub struct TimedVisibility<T> {
    tx: watch::Sender<Option<Shown<T>>>,
    pending: Option<CancellationToken>,
    generation: u64,
}

impl<T: Clone + Send + Sync + 'static> Default for TimedVisibility<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> TimedVisibility<T> {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx,
            pending: None,
            generation: 0,
        }
    }

    /// Show `value` for `duration`, replacing whatever is shown now.
    pub fn show(&mut self, value: T, duration: Duration) {
        self.cancel_pending();
        self.generation += 1;
        let generation = self.generation;
        self.tx.send_replace(Some(Shown { generation, value }));

        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        let tx = self.tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = sleep(duration) => {
                    // Only clear the value this timer was started for
                    tx.send_if_modified(|current| {
                        if current.as_ref().is_some_and(|s| s.generation == generation) {
                            *current = None;
                            true
                        } else {
                            false
                        }
                    });
                }
            }
        });
    }

    /// Hide immediately and cancel any pending timer.
    pub fn hide(&mut self) {
        self.cancel_pending();
        self.tx.send_replace(None);
    }

    /// Currently shown value.
    #[must_use]
    pub fn current(&self) -> Option<T> {
        self.tx.borrow().as_ref().map(|s| s.value.clone())
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.tx.borrow().is_some()
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl<T> Drop for TimedVisibility<T> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_hides_after_duration() {
        let mut info = TimedVisibility::new();
        info.show("shelter", Duration::from_secs(5));
        assert_eq!(info.current(), Some("shelter"));

        sleep(Duration::from_millis(4900)).await;
        assert!(info.is_visible());

        sleep(Duration::from_millis(200)).await;
        assert!(!info.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_show_cancels_previous_hide() {
        let mut info = TimedVisibility::new();
        info.show("first", Duration::from_secs(5));
        sleep(Duration::from_secs(3)).await;

        info.show("second", Duration::from_secs(5));
        // The first timer would have fired at t=5s
        sleep(Duration::from_secs(3)).await;
        assert_eq!(info.current(), Some("second"));

        sleep(Duration::from_millis(2100)).await;
        assert_eq!(info.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_is_immediate() {
        let mut info = TimedVisibility::new();
        info.show(7u32, Duration::from_secs(5));
        info.hide();
        assert!(!info.is_visible());
        sleep(Duration::from_secs(6)).await;
        assert!(!info.is_visible());
    }
}
