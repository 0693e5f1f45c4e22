// src/services/gate.rs

use sqlx::PgPool;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        reattempt::{ReattemptRequest, ReattemptStatus},
        result::QuizResult,
    },
    utils::session::clear_quiz_markers,
};

/// Where a user stands with one quiz.
#[derive(Debug, Clone)]
pub enum GateState {
    /// Never taken, or a reattempt was consumed: the quiz may be taken.
    NoAttempt,
    /// A result exists and no reattempt is in flight.
    Completed(QuizResult),
    /// The user asked for a reattempt; an admin has not answered yet.
    ReattemptPending {
        result: QuizResult,
        request: ReattemptRequest,
    },
    /// An admin approved a reattempt that has not been consumed yet.
    ReattemptApproved {
        result: Option<QuizResult>,
        request: ReattemptRequest,
    },
}

impl GateState {
    /// Classifies from the three facts the gate looks at.
    pub fn classify(
        result: Option<QuizResult>,
        pending: Option<ReattemptRequest>,
        approved: Option<ReattemptRequest>,
    ) -> GateState {
        match (result, pending, approved) {
            (result, _, Some(request)) => GateState::ReattemptApproved { result, request },
            (Some(result), Some(request), None) => GateState::ReattemptPending { result, request },
            (Some(result), None, None) => GateState::Completed(result),
            (None, _, None) => GateState::NoAttempt,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GateState::NoAttempt => "no_attempt",
            GateState::Completed(_) => "completed",
            GateState::ReattemptPending { .. } => "reattempt_pending",
            GateState::ReattemptApproved { .. } => "reattempt_approved",
        }
    }
}

pub const PENDING_MESSAGE: &str = "Your request for reattempt is pending admin approval. Please wait.";

/// Most recent result for (user, quiz).
pub async fn latest_result(
    pool: &PgPool,
    user_id: i64,
    quiz_id: i64,
) -> Result<Option<QuizResult>, AppError> {
    let result = sqlx::query_as::<_, QuizResult>(
        r#"
        SELECT id, user_id, quiz_id, total_questions, correct_answers, score, completed_at, time_expired
        FROM quiz_results
        WHERE user_id = $1 AND quiz_id = $2
        ORDER BY completed_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?;

    Ok(result)
}

/// Most recent request in `status` for (user, quiz).
async fn latest_request(
    pool: &PgPool,
    user_id: i64,
    quiz_id: i64,
    status: ReattemptStatus,
) -> Result<Option<ReattemptRequest>, AppError> {
    let request = sqlx::query_as::<_, ReattemptRequest>(
        r#"
        SELECT id, user_id, quiz_id, request_date, status, admin_id, response_date
        FROM reattempt_requests
        WHERE user_id = $1 AND quiz_id = $2 AND status = $3
        ORDER BY request_date DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(quiz_id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

pub async fn load_gate(pool: &PgPool, user_id: i64, quiz_id: i64) -> Result<GateState, AppError> {
    let result = latest_result(pool, user_id, quiz_id).await?;
    let pending = latest_request(pool, user_id, quiz_id, ReattemptStatus::Pending).await?;
    let approved = latest_request(pool, user_id, quiz_id, ReattemptStatus::Approved).await?;

    Ok(GateState::classify(result, pending, approved))
}

/// Consumes an approved reattempt in one transaction: removes the prior
/// result, its responses and every session's start marker for the quiz,
/// then marks the request `completed`.
///
/// Returns `false` (and changes nothing) if the request was no longer
/// `approved`, e.g. a concurrent page load consumed it first.
pub async fn consume_approval(
    pool: &PgPool,
    user_id: i64,
    quiz_id: i64,
    request_id: i64,
) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    let marked = sqlx::query(
        r#"
        UPDATE reattempt_requests
        SET status = 'completed'
        WHERE id = $1 AND user_id = $2 AND quiz_id = $3 AND status = 'approved'
        "#,
    )
    .bind(request_id)
    .bind(user_id)
    .bind(quiz_id)
    .execute(&mut *tx)
    .await?;

    if marked.rows_affected() != 1 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(
        r#"
        DELETE FROM user_responses
        WHERE user_id = $1
          AND question_id IN (SELECT id FROM questions WHERE quiz_id = $2)
        "#,
    )
    .bind(user_id)
    .bind(quiz_id)
    .execute(&mut *tx)
    .await?;

    let removed = sqlx::query("DELETE FROM quiz_results WHERE user_id = $1 AND quiz_id = $2")
        .bind(user_id)
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    // The new attempt starts on its own first render.
    clear_quiz_markers(&mut *tx, user_id, quiz_id).await?;

    tx.commit().await?;

    tracing::info!(
        "Reattempt {} consumed for user {} quiz {} ({} prior result(s) removed)",
        request_id,
        user_id,
        quiz_id,
        removed.rows_affected()
    );

    Ok(true)
}

/// Files a `pending` reattempt request. Only valid from `Completed`.
pub async fn request_reattempt(
    pool: &PgPool,
    user_id: i64,
    quiz_id: i64,
) -> Result<ReattemptRequest, AppError> {
    match load_gate(pool, user_id, quiz_id).await? {
        GateState::Completed(_) => {}
        GateState::ReattemptPending { .. } => {
            return Err(AppError::Conflict(PENDING_MESSAGE.to_string()));
        }
        GateState::ReattemptApproved { .. } => {
            return Err(AppError::Conflict(
                "Your reattempt was already approved. Open the quiz to retake it.".to_string(),
            ));
        }
        GateState::NoAttempt => {
            return Err(AppError::BadRequest(
                "You have not completed this quiz yet.".to_string(),
            ));
        }
    }

    sqlx::query_as::<_, ReattemptRequest>(
        r#"
        INSERT INTO reattempt_requests (user_id, quiz_id, status)
        VALUES ($1, $2, 'pending')
        RETURNING id, user_id, quiz_id, request_date, status, admin_id, response_date
        "#,
    )
    .bind(user_id)
    .bind(quiz_id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        // Partial unique index: one pending request per (user, quiz)
        if is_unique_violation(&e) {
            AppError::Conflict(PENDING_MESSAGE.to_string())
        } else {
            tracing::error!("Failed to file reattempt request: {:?}", e);
            AppError::from(e)
        }
    })
}
