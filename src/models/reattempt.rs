// src/models/reattempt.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of a reattempt request.
///
/// `pending` is created by the user, `approved`/`rejected` by an admin and
/// `completed` once the attempt gate has consumed an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReattemptStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl ReattemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReattemptStatus::Pending => "pending",
            ReattemptStatus::Approved => "approved",
            ReattemptStatus::Rejected => "rejected",
            ReattemptStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ReattemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReattemptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReattemptStatus::Pending),
            "approved" => Ok(ReattemptStatus::Approved),
            "rejected" => Ok(ReattemptStatus::Rejected),
            "completed" => Ok(ReattemptStatus::Completed),
            other => Err(format!("unknown reattempt status '{}'", other)),
        }
    }
}

/// Represents the 'reattempt_requests' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReattemptRequest {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub request_date: chrono::DateTime<chrono::Utc>,
    pub status: String,
    pub admin_id: Option<i64>,
    pub response_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Row for the admin queue, joined with user and quiz names.
#[derive(Debug, Serialize, FromRow)]
pub struct ReattemptQueueEntry {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub request_date: chrono::DateTime<chrono::Utc>,
    pub status: String,
    pub admin_username: Option<String>,
    pub response_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Admin decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReattemptDecision {
    Approve,
    Reject,
}

impl ReattemptDecision {
    pub fn target_status(self) -> ReattemptStatus {
        match self {
            ReattemptDecision::Approve => ReattemptStatus::Approved,
            ReattemptDecision::Reject => ReattemptStatus::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            ReattemptStatus::Pending,
            ReattemptStatus::Approved,
            ReattemptStatus::Rejected,
            ReattemptStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<ReattemptStatus>(), Ok(status));
        }
        assert!("cancelled".parse::<ReattemptStatus>().is_err());
    }

    #[test]
    fn test_decision_targets() {
        assert_eq!(ReattemptDecision::Approve.target_status(), ReattemptStatus::Approved);
        assert_eq!(ReattemptDecision::Reject.target_status(), ReattemptStatus::Rejected);
    }
}
