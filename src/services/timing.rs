// src/services/timing.rs

use chrono::{DateTime, Duration, Utc};

use crate::error::AppError;

/// Seconds left on the countdown, floored at zero. `None` for untimed quizzes.
pub fn remaining_seconds(
    time_limit_minutes: Option<i32>,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<i64> {
    time_limit_minutes.map(|minutes| {
        let limit = i64::from(minutes) * 60;
        let elapsed = (now - started_at).num_seconds().max(0);
        (limit - elapsed).max(0)
    })
}

/// The server clock says the time limit has run out.
pub fn limit_exceeded(
    time_limit_minutes: Option<i32>,
    started_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match (time_limit_minutes, started_at) {
        (Some(minutes), Some(start)) => now - start >= Duration::minutes(i64::from(minutes)),
        _ => false,
    }
}

/// Minimum-dwell guard for a submission.
///
/// A forced submission (`time_expired`) always passes. Otherwise the session
/// must have opened the quiz at least `min_dwell_seconds` ago.
pub fn check_dwell(
    started_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    time_expired: bool,
    min_dwell_seconds: i64,
) -> Result<(), AppError> {
    if time_expired {
        return Ok(());
    }

    let started_at = started_at.ok_or_else(|| {
        AppError::Conflict("Quiz was not started in this session. Please open the quiz first.".to_string())
    })?;

    let elapsed = (now - started_at).num_seconds();
    if elapsed < min_dwell_seconds {
        return Err(AppError::Conflict(format!(
            "Submission too fast: please spend at least {} seconds on the quiz.",
            min_dwell_seconds
        )));
    }

    Ok(())
}
