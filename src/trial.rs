//! Trial countdown.
//!
//! The remaining time is always derived from the license's start date and
//! the trial window, never stored.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::license::LicenseSnapshot;
use crate::util::{
    MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE, MILLIS_PER_SECOND, now_millis,
};

pub const DEFAULT_TRIAL_DAYS: i64 = 3;
pub const EXPIRED_DISPLAY: &str = "00h:00m:00s";

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialStatus {
    pub time_left: String,
    pub is_expired: bool,
}

impl TrialStatus {
    /// Status of a trial started at `start` (ms) with a window of
    /// `window_ms`, observed at `now` (ms).
    pub fn at(start: i64, window_ms: i64, now: i64) -> Self {
        let remaining = start.saturating_add(window_ms) - now;
        Self {
            time_left: format_remaining(remaining),
            is_expired: remaining <= 0,
        }
    }
}

/// Render remaining milliseconds: `"{d}d {h}h {m}m"` from one full day up,
/// `"HHh:MMm:SSs"` below that.
pub fn format_remaining(remaining_ms: i64) -> String {
    if remaining_ms <= 0 {
        return EXPIRED_DISPLAY.to_string();
    }
    let days = remaining_ms / MILLIS_PER_DAY;
    let hours = (remaining_ms % MILLIS_PER_DAY) / MILLIS_PER_HOUR;
    let minutes = (remaining_ms % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE;
    let seconds = (remaining_ms % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else {
        format!("{:02}h:{:02}m:{:02}s", hours, minutes, seconds)
    }
}

/// Ticking countdown bound to the license snapshot channel.
pub struct TrialTimer;

impl TrialTimer {
    /// Start recomputing once per second, and immediately whenever the
    /// license snapshot changes. The first status is computed before
    /// returning. The task ends when `cancel` fires or the license channel
    /// closes.
    pub fn spawn(
        mut license: watch::Receiver<LicenseSnapshot>,
        window_ms: i64,
        cancel: CancellationToken,
    ) -> watch::Receiver<TrialStatus> {
        let start = license.borrow_and_update().license.trial_start_date;
        let (tx, rx) = watch::channel(TrialStatus::at(start, window_ms, now_millis()));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                    changed = license.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let start = license.borrow_and_update().license.trial_start_date;
                let status = TrialStatus::at(start, window_ms, now_millis());
                tx.send_if_modified(|current| {
                    if *current == status {
                        false
                    } else {
                        *current = status;
                        true
                    }
                });
            }
            tracing::debug!("Trial timer stopped");
        });

        rx
    }
}
