//! Run scheduling: fire an organization pass on an interval or daily.
//!
//! The scheduler is a single-threaded poll-sleep loop. Each cycle it checks
//! the armed trigger against the local clock, runs the job synchronously
//! when due (one pass never overlaps another), re-arms, and sleeps about a
//! second. Cancellation is cooperative: a shared atomic flag, set by
//! [`Scheduler::stop`] or an interrupt handler, ends the loop after the
//! current cycle; an in-flight pass always finishes its current file first.

use crate::organizer::{OrganizeError, RunSummary};
use crate::output::OutputFormatter;
use chrono::{DateTime, Days, Duration, Local, NaiveTime};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// How often the supervisory loop wakes to check the trigger.
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// The scheduling rule deciding when a run fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fire every `minutes` minutes, starting one interval after arming.
    Interval { minutes: u64 },
    /// Fire once per calendar day at the given local wall-clock time.
    Daily { at: NaiveTime },
}

impl Trigger {
    /// Computes the first due time after `now`.
    fn first_due(&self, now: DateTime<Local>) -> DateTime<Local> {
        match self {
            Trigger::Interval { minutes } => now + Duration::minutes(*minutes as i64),
            Trigger::Daily { at } => next_daily_fire(*at, now),
        }
    }
}

/// Next local occurrence of `at` strictly after `now`.
///
/// Scans at most a few days forward so that a wall-clock time skipped by a
/// DST transition still resolves.
fn next_daily_fire(at: NaiveTime, now: DateTime<Local>) -> DateTime<Local> {
    for offset in 0..3 {
        if let Some(date) = now.date_naive().checked_add_days(Days::new(offset))
            && let Some(candidate) = date.and_time(at).and_local_timezone(Local).earliest()
            && candidate > now
        {
            return candidate;
        }
    }
    now + Duration::days(1)
}

/// Supervises repeated organization passes.
///
/// The job is any closure running one pass and returning its summary; the
/// scheduler owns nothing else mutable beyond its trigger and stop flag.
pub struct Scheduler<J>
where
    J: FnMut() -> Result<RunSummary, OrganizeError>,
{
    job: J,
    trigger: Option<Trigger>,
    next_due: Option<DateTime<Local>>,
    stop_flag: Arc<AtomicBool>,
}

impl<J> Scheduler<J>
where
    J: FnMut() -> Result<RunSummary, OrganizeError>,
{
    /// Creates an unarmed scheduler around a job.
    pub fn new(job: J) -> Self {
        Self {
            job,
            trigger: None,
            next_due: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared handle for requesting a stop from outside the loop
    /// (e.g. from an interrupt handler).
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Arms a recurring interval trigger; `minutes == 0` clears the trigger
    /// and leaves the scheduler disarmed.
    pub fn configure_interval(&mut self, minutes: u64) {
        if minutes == 0 {
            self.trigger = None;
            self.next_due = None;
            return;
        }
        let trigger = Trigger::Interval { minutes };
        self.next_due = Some(trigger.first_due(Local::now()));
        self.trigger = Some(trigger);
    }

    /// Arms a once-per-day trigger at the given local time.
    pub fn configure_daily(&mut self, at: NaiveTime) {
        let trigger = Trigger::Daily { at };
        self.next_due = Some(trigger.first_due(Local::now()));
        self.trigger = Some(trigger);
    }

    /// Returns true when a trigger is armed.
    pub fn is_armed(&self) -> bool {
        self.trigger.is_some()
    }

    /// Clears the trigger and asks the loop to exit after the current cycle.
    pub fn stop(&mut self) {
        self.trigger = None;
        self.next_due = None;
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Blocking supervisory loop.
    ///
    /// Runs until [`Scheduler::stop`] is called or the stop handle is set.
    /// A failed pass is reported and the loop continues.
    pub fn start(&mut self) {
        while !self.stop_flag.load(Ordering::SeqCst) {
            self.tick(Local::now());
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// One check-and-maybe-run cycle. Returns true when the job fired.
    pub fn tick(&mut self, now: DateTime<Local>) -> bool {
        match self.next_due {
            Some(due) if now >= due => {}
            _ => return false,
        }

        self.run_once();

        // Re-arm relative to completion, so passes never overlap even when
        // a run outlasts the interval.
        self.next_due = self.trigger.map(|t| t.first_due(Local::now()));
        true
    }

    /// Runs the job once, reporting but never propagating its failure.
    pub fn run_once(&mut self) {
        OutputFormatter::info(&format!(
            "{} - starting scheduled organization",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        match (self.job)() {
            Ok(summary) => {
                OutputFormatter::success(&format!(
                    "Scheduled pass finished: {} moved, {} skipped, {} errors",
                    summary.moved, summary.skipped, summary.errors
                ));
            }
            Err(e) => {
                OutputFormatter::error(&format!("Scheduled pass failed: {}", e));
            }
        }
    }
}

/// Parses a "HH:MM" wall-clock time.
pub fn parse_daily_time(value: &str) -> Result<NaiveTime, crate::config::ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| crate::config::ConfigError::InvalidDailyTime(value.to_string()))
}
