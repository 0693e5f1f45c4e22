// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quiz_results' table in the database.
/// One row per (user, quiz) attempt cycle.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizResult {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub total_questions: i32,
    pub correct_answers: i32,
    /// Percentage, two decimals.
    pub score: f64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub time_expired: bool,
}

/// Represents the 'user_responses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub user_id: i64,
    pub question_id: i64,
    /// Letter or sorted comma-joined letters; `None` when unanswered.
    pub selected_answer: Option<String>,
    pub is_correct: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Row of the admin results listing, joined with user and quiz names.
#[derive(Debug, Serialize, FromRow)]
pub struct ResultEntry {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub quiz_id: i64,
    pub quiz_title: String,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub score: f64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub time_expired: bool,
}

/// Query string of `GET /api/admin/results`.
#[derive(Debug, Default, Deserialize)]
pub struct ResultFilter {
    pub quiz_id: Option<i64>,
    pub user_id: Option<i64>,
}
