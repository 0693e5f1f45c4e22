// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    /// Time limit in minutes; `None` means untimed.
    pub time_limit: Option<i32>,
    pub created_by: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 255, message = "Quiz name cannot be empty"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 240, message = "Time limit must be between 1 and 240 minutes"))]
    pub time_limit: Option<i32>,
}

/// DTO for setting a quiz time limit.
#[derive(Debug, Deserialize, Validate)]
pub struct TimeLimitRequest {
    #[validate(range(min = 1, max = 240, message = "Time limit must be between 1 and 240 minutes"))]
    pub time_limit: i32,
}
