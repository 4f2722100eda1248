//! Simulated wall clock.
//!
//! Context time is measured in days. Hour `k` of a run executes at time `k / 24`, always
//! computed from the integer hour so that plans meant for the same hour compare equal and
//! are ordered by their `ExecutionPhase`.
use std::rc::Rc;

use crate::context::{Context, ExecutionPhase};

pub const HOURS_PER_DAY: u64 = 24;
/// First hour of the working day (inclusive).
pub const WORK_START_HOUR: u32 = 8;
/// End of the working day (exclusive).
pub const WORK_END_HOUR: u32 = 18;

/// Context time at which `hour` begins.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hour_to_time(hour: u64) -> f64 {
    hour as f64 / HOURS_PER_DAY as f64
}

/// `true` between `WORK_START_HOUR` and `WORK_END_HOUR`.
#[must_use]
pub fn is_working_hour(hour_of_day: u32) -> bool {
    (WORK_START_HOUR..WORK_END_HOUR).contains(&hour_of_day)
}

/// `true` when mosquitoes seek blood meals among households and workplaces.
#[must_use]
pub fn is_night_hour(hour_of_day: u32) -> bool {
    hour_of_day > 18 || hour_of_day < 6
}

type RepeatingCallback = Rc<dyn Fn(&mut Context)>;

fn schedule_repeating(
    context: &mut Context,
    hour: u64,
    interval: u64,
    phase: ExecutionPhase,
    callback: RepeatingCallback,
) {
    context.add_plan_with_phase(
        hour_to_time(hour),
        move |context| {
            callback(context);
            schedule_repeating(context, hour + interval, interval, phase, callback);
        },
        phase,
    );
}

pub trait ContextClockExt {
    /// Index of the current hour since the start of the run.
    fn current_hour(&self) -> u64;

    /// Hour of the current day, in `0..24`.
    fn hour_of_day(&self) -> u32;

    /// Index of the current day since the start of the run.
    fn current_day(&self) -> u32;

    /// Runs `callback` at the start of every hour, beginning with hour 0.
    fn add_hourly_plan(&mut self, phase: ExecutionPhase, callback: impl Fn(&mut Context) + 'static);

    /// Runs `callback` once per day, during the last hour of the day.
    fn add_daily_plan(&mut self, phase: ExecutionPhase, callback: impl Fn(&mut Context) + 'static);
}

impl ContextClockExt for Context {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn current_hour(&self) -> u64 {
        (self.get_current_time() * HOURS_PER_DAY as f64).round() as u64
    }

    #[allow(clippy::cast_possible_truncation)]
    fn hour_of_day(&self) -> u32 {
        (self.current_hour() % HOURS_PER_DAY) as u32
    }

    #[allow(clippy::cast_possible_truncation)]
    fn current_day(&self) -> u32 {
        (self.current_hour() / HOURS_PER_DAY) as u32
    }

    fn add_hourly_plan(
        &mut self,
        phase: ExecutionPhase,
        callback: impl Fn(&mut Context) + 'static,
    ) {
        let first = self.current_hour();
        schedule_repeating(self, first, 1, phase, Rc::new(callback));
    }

    fn add_daily_plan(&mut self, phase: ExecutionPhase, callback: impl Fn(&mut Context) + 'static) {
        let first = u64::from(self.current_day()) * HOURS_PER_DAY + HOURS_PER_DAY - 1;
        schedule_repeating(self, first, HOURS_PER_DAY, phase, Rc::new(callback));
    }
}
