//! Store review prompting with an eligibility ladder.
//!
//! The worker never prompts unless every rung passes: prompting enabled,
//! no crash on the previous run, enough launches, first launch old enough,
//! last launch old enough, launch count on-frequency once past the budget,
//! and any previous prompt far enough in the past.

use chrono::{DateTime, Duration, Utc};

use crate::error::WorkerResult;
use crate::platform::SharedReview;

/// When review prompts are allowed to appear.
#[derive(Debug, Clone)]
pub struct ReviewPolicy {
    pub enabled: bool,
    /// Minimum launches before the first prompt.
    pub uses_until_prompt: u32,
    /// Minimum age of the install, in days.
    pub days_until_prompt: i64,
    /// Minimum gap since the most recent launch, in hours.
    pub hours_since_last_launch: i64,
    /// Launch budget; past it, only on-frequency launch counts prompt.
    pub uses_since_first_launch: u32,
    pub uses_frequency: u32,
    /// Minimum gap between prompts, in days.
    pub days_before_reminding: i64,
}

/// Launch history the host application tracks across runs.
#[derive(Debug, Clone)]
pub struct LaunchStats {
    pub launched_count: u32,
    pub launched_first_time: DateTime<Utc>,
    pub launched_last_time: Option<DateTime<Utc>>,
    pub app_did_crash_last_run: bool,
    pub review_request_last_time: Option<DateTime<Utc>>,
}

pub struct ReviewWorker {
    review: SharedReview,
    policy: ReviewPolicy,
}

impl ReviewWorker {
    pub fn new(review: SharedReview, policy: ReviewPolicy) -> Self {
        Self { review, policy }
    }

    /// Present the review prompt if the stats pass the eligibility ladder.
    /// Returns whether a prompt was presented.
    pub fn request_review(&self, stats: &LaunchStats, now: DateTime<Utc>) -> WorkerResult<bool> {
        if !self.eligible(stats, now) {
            return Ok(false);
        }
        self.review.present_prompt()?;
        Ok(true)
    }

    fn eligible(&self, stats: &LaunchStats, now: DateTime<Utc>) -> bool {
        let policy = &self.policy;
        if !policy.enabled {
            return false;
        }
        if stats.app_did_crash_last_run {
            return false;
        }
        if stats.launched_count < policy.uses_until_prompt {
            return false;
        }
        if now - stats.launched_first_time < Duration::days(policy.days_until_prompt) {
            return false;
        }
        // A missing last-launch time reads as "just now".
        let last_launch = stats.launched_last_time.unwrap_or(now);
        if now - last_launch < Duration::hours(policy.hours_since_last_launch) {
            return false;
        }
        if stats.launched_count > policy.uses_since_first_launch {
            if stats.launched_count == 0 || policy.uses_frequency == 0 {
                return false;
            }
            if stats.launched_count % policy.uses_frequency != 0 {
                return false;
            }
        }
        if let Some(last_request) = stats.review_request_last_time {
            if now - last_request < Duration::days(policy.days_before_reminding) {
                return false;
            }
        }
        true
    }
}
