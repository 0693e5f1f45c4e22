// src/services/attempt.rs

use sqlx::PgPool;

use crate::{
    error::{AppError, is_unique_violation},
    models::result::QuizResult,
    services::grading::GradeReport,
    utils::session::clear_quiz_markers,
};

pub const DUPLICATE_SUBMISSION: &str = "This quiz has already been submitted.";

/// Writes every response row and the single result row of an attempt in one
/// transaction, and drops the quiz's start markers of all the user's
/// sessions. Nothing is visible to other readers until commit; any failure
/// rolls the whole attempt back.
pub async fn persist_attempt(
    pool: &PgPool,
    user_id: i64,
    quiz_id: i64,
    report: &GradeReport,
    time_expired: bool,
) -> Result<QuizResult, AppError> {
    let conflict_or_db = |e: sqlx::Error| {
        if is_unique_violation(&e) {
            AppError::Conflict(DUPLICATE_SUBMISSION.to_string())
        } else {
            tracing::error!("Failed to persist attempt for user {} quiz {}: {:?}", user_id, quiz_id, e);
            AppError::from(e)
        }
    };

    // Dropping `tx` without commit rolls back.
    let mut tx = pool.begin().await?;

    // Inserted first so a concurrent duplicate fails before any response row.
    let result = sqlx::query_as::<_, QuizResult>(
        r#"
        INSERT INTO quiz_results (user_id, quiz_id, total_questions, correct_answers, score, time_expired)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, quiz_id, total_questions, correct_answers, score, completed_at, time_expired
        "#,
    )
    .bind(user_id)
    .bind(quiz_id)
    .bind(report.total_questions)
    .bind(report.correct_answers)
    .bind(report.score)
    .bind(time_expired)
    .fetch_one(&mut *tx)
    .await
    .map_err(conflict_or_db)?;

    for response in &report.responses {
        sqlx::query(
            r#"
            INSERT INTO user_responses (user_id, question_id, selected_answer, is_correct)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(response.question_id)
        .bind(response.selected_answer.as_deref())
        .bind(response.is_correct)
        .execute(&mut *tx)
        .await
        .map_err(conflict_or_db)?;
    }

    clear_quiz_markers(&mut *tx, user_id, quiz_id)
        .await
        .map_err(conflict_or_db)?;

    tx.commit().await.map_err(conflict_or_db)?;

    tracing::info!(
        "User {} completed quiz {}: {}/{} correct, score {:.2}{}",
        user_id,
        quiz_id,
        report.correct_answers,
        report.total_questions,
        report.score,
        if time_expired { " (time expired)" } else { "" }
    );

    Ok(result)
}
