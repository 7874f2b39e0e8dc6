//! Redraw coalescing.
//!
//! [`RedrawScheduler::tick`] is driven at a fixed cadence by the UI loop. It
//! merges the three invalidation sources (input, the wall-clock minute and
//! published metrics) into `needs_redraw` and calls the renderer at most
//! once per tick. While an application owns the screen, ticks only check
//! its liveness.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::foreground::{CommandSpec, ForegroundProcess, ForegroundTracker, LaunchError};
use crate::input::UiState;
use crate::metrics::{MetricsSnapshot, SnapshotReader};

/// Draws one frame from the current state.
pub trait FrameRenderer {
    fn render(&mut self, ui: &UiState, metrics: &MetricsSnapshot, now: NaiveDateTime);
}

/// What a tick did, so the caller can adjust window visibility and cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was dirty.
    Idle,
    Repainted,
    /// The foreground application is still running; nothing else was checked.
    Foreground,
    /// The foreground application exited; the UI is visible again and was
    /// repainted in the same tick.
    Restored,
}

/// Minutes since the epoch of a local wall-clock time.
pub fn minute_key(now: NaiveDateTime) -> i64 {
    now.and_utc().timestamp().div_euclid(60)
}

/// The launcher's context object: owns the UI state, the foreground
/// tracker and the reader half of the metrics slot.
pub struct RedrawScheduler {
    ui: UiState,
    tracker: ForegroundTracker,
    metrics: SnapshotReader,
    latest: MetricsSnapshot,
    repaints: u64,
}

impl RedrawScheduler {
    pub fn new(metrics: SnapshotReader) -> Self {
        Self {
            ui: UiState::new(),
            tracker: ForegroundTracker::new(),
            latest: metrics.latest(),
            metrics,
            repaints: 0,
        }
    }

    /// Input routing goes through here; routers flag `needs_redraw`
    /// themselves when they change something.
    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    pub fn is_foreground(&self) -> bool {
        self.ui.foreground_active
    }

    /// Hand the screen to `command`. On success the UI is marked hidden;
    /// on failure nothing changes.
    pub fn launch(&mut self, command: &CommandSpec) -> Result<&ForegroundProcess, LaunchError> {
        let process = self.tracker.launch(command)?;
        self.ui.foreground_active = true;
        Ok(process)
    }

    pub fn tick<R: FrameRenderer>(&mut self, now: NaiveDateTime, renderer: &mut R) -> TickOutcome {
        let mut restored = false;
        if self.ui.foreground_active {
            if self.tracker.is_alive() {
                return TickOutcome::Foreground;
            }
            info!("foreground application gone, restoring launcher");
            self.ui.foreground_active = false;
            self.ui.needs_redraw = true;
            restored = true;
        }

        let minute = minute_key(now);
        if self.ui.last_minute != Some(minute) {
            self.ui.needs_redraw = true;
        }
        if let Some(snapshot) = self.metrics.take_changed() {
            self.latest = snapshot;
            self.ui.needs_redraw = true;
        }

        if !self.ui.needs_redraw {
            return TickOutcome::Idle;
        }

        renderer.render(&self.ui, &self.latest, now);
        self.ui.needs_redraw = false;
        self.ui.last_minute = Some(minute);
        self.repaints += 1;
        debug!(repaints = self.repaints, "repainted");

        if restored {
            TickOutcome::Restored
        } else {
            TickOutcome::Repainted
        }
    }
}
