//! Console progress bar over simulated days.
//!
//! `init_timeline_progress_bar(days)` turns the bar on; the `Context` event loop then
//! updates it with the current time and finalizes it when the last day is reached. Without
//! initialization, updates do nothing.
use std::sync::OnceLock;

use log::{trace, warn};
use progress_bar::{
    finalize_progress_bar, init_progress_bar, set_progress_bar_action,
    set_progress_bar_progress, Color, Style,
};

static MAX_TIME: OnceLock<f64> = OnceLock::new();

/// Shows a progress bar that completes at `max_time` (in days).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn init_timeline_progress_bar(max_time: f64) {
    trace!("initializing timeline progress bar with max time {max_time}");
    if MAX_TIME.set(max_time).is_err() {
        warn!("timeline progress bar is already initialized");
        return;
    }
    init_progress_bar(max_time.round() as usize);
    set_progress_bar_action("Day", Color::Blue, Style::Bold);
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
pub(crate) fn update_timeline_progress(current_time: f64) {
    let Some(&max_time) = MAX_TIME.get() else {
        return;
    };
    let current_time = current_time.min(max_time);
    set_progress_bar_progress(current_time.floor() as usize);
    if current_time == max_time {
        finalize_progress_bar();
    }
}
