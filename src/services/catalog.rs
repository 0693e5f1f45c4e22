// src/services/catalog.rs

use sqlx::{PgExecutor, PgPool};

use crate::{
    error::AppError,
    models::{
        question::{Question, QuestionRow},
        quiz::Quiz,
    },
};

const QUESTION_COLUMNS: &str = "id, quiz_id, question_text, option_a, option_b, option_c, option_d, \
     question_type, correct_answer, points";

/// Active quiz by id, or 404.
pub async fn fetch_active_quiz(pool: &PgPool, quiz_id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, description, is_active, time_limit, created_by, created_at
        FROM quizzes
        WHERE id = $1 AND is_active = TRUE
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Invalid quiz or quiz not found.".to_string()))
}

/// Quiz by id regardless of its active flag, for result review.
pub async fn fetch_quiz(pool: &PgPool, quiz_id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, description, is_active, time_limit, created_by, created_at
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found.".to_string()))
}

pub async fn list_active_quizzes(pool: &PgPool) -> Result<Vec<Quiz>, AppError> {
    let quizzes = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, description, is_active, time_limit, created_by, created_at
        FROM quizzes
        WHERE is_active = TRUE
        ORDER BY title
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(quizzes)
}

/// Questions of a quiz ordered by id.
pub async fn fetch_questions<'e>(
    executor: impl PgExecutor<'e>,
    quiz_id: i64,
) -> Result<Vec<Question>, AppError> {
    let rows = sqlx::query_as::<_, QuestionRow>(&format!(
        "SELECT {} FROM questions WHERE quiz_id = $1 ORDER BY id",
        QUESTION_COLUMNS
    ))
    .bind(quiz_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(Question::try_from).collect()
}

/// Like `fetch_questions`, but an empty quiz is a 404.
pub async fn fetch_nonempty_questions(pool: &PgPool, quiz_id: i64) -> Result<Vec<Question>, AppError> {
    let questions = fetch_questions(pool, quiz_id).await?;
    if questions.is_empty() {
        return Err(AppError::NotFound(
            "No questions available for this quiz.".to_string(),
        ));
    }
    Ok(questions)
}
