// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::auth::insert_user,
    models::{
        question::{QuestionDetail, QuestionFilter, QuestionRequest, ValidQuestion},
        quiz::{CreateQuizRequest, Quiz, TimeLimitRequest},
        reattempt::{ReattemptDecision, ReattemptQueueEntry, ReattemptRequest, ReattemptStatus},
        result::{ResultEntry, ResultFilter},
        user::AdminCreateUserRequest,
    },
    services::catalog,
    utils::{html::clean_html, jwt::CurrentUser},
};

/// Creates a user, optionally with admin rights.
/// Admin only.
pub async fn create_user(
    State(pool): State<PgPool>,
    Json(payload): Json<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = insert_user(&pool, &payload.account, payload.is_admin).await?;
    tracing::info!("Admin created user {} (admin: {})", user.username, user.is_admin);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Creates a new quiz owned by the calling admin.
/// Admin only.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    admin: CurrentUser,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let title = clean_html(payload.title.trim());
    if title.is_empty() {
        return Err(AppError::validation("title", "Quiz name cannot be empty"));
    }
    let description = payload
        .description
        .map(|d| clean_html(d.trim()))
        .filter(|d| !d.is_empty());

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        INSERT INTO quizzes (title, description, is_active, time_limit, created_by)
        VALUES ($1, $2, TRUE, $3, $4)
        RETURNING id, title, description, is_active, time_limit, created_by, created_at
        "#,
    )
    .bind(&title)
    .bind(&description)
    .bind(payload.time_limit)
    .bind(admin.id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Sets the time limit (minutes) of an active quiz.
/// Admin only.
pub async fn set_time_limit(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<TimeLimitRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.validate().is_err() {
        return Err(AppError::validation(
            "time_limit",
            "Time limit must be between 1 and 240 minutes",
        ));
    }

    let result = sqlx::query("UPDATE quizzes SET time_limit = $1 WHERE id = $2 AND is_active = TRUE")
        .bind(payload.time_limit)
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to set time limit: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    tracing::info!("Quiz {} time limit set to {} minutes", id, payload.time_limit);
    Ok(StatusCode::OK)
}

async fn ensure_quiz_exists(pool: &PgPool, quiz_id: i64) -> Result<(), AppError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM quizzes WHERE id = $1")
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?;

    exists
        .map(|_| ())
        .ok_or(AppError::validation("quiz_id", "Please select a quiz"))
}

/// Questions of one quiz with their answer keys, for editing.
/// Admin only.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Query(filter): Query<QuestionFilter>,
) -> Result<impl IntoResponse, AppError> {
    catalog::fetch_quiz(&pool, filter.quiz_id).await?;

    let questions: Vec<QuestionDetail> = catalog::fetch_questions(&pool, filter.quiz_id)
        .await?
        .into_iter()
        .map(QuestionDetail::from)
        .collect();

    Ok(Json(questions))
}

/// Creates a new question. The answer key is validated before any write.
/// Admin only.
pub async fn create_question(
    State(pool): State<PgPool>,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question: ValidQuestion = payload.into_valid()?;
    ensure_quiz_exists(&pool, question.quiz_id).await?;

    let [option_a, option_b, option_c, option_d] = question.options;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions
        (quiz_id, question_text, option_a, option_b, option_c, option_d, question_type, correct_answer, points)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(question.quiz_id)
    .bind(&question.text)
    .bind(option_a)
    .bind(option_b)
    .bind(option_c)
    .bind(option_d)
    .bind(question.key.question_type().as_str())
    .bind(question.key.encode())
    .bind(question.points)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Replaces a question. Same validation as creation.
/// Admin only.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = payload.into_valid()?;
    ensure_quiz_exists(&pool, question.quiz_id).await?;

    let [option_a, option_b, option_c, option_d] = question.options;

    let result = sqlx::query(
        r#"
        UPDATE questions
        SET quiz_id = $1, question_text = $2,
            option_a = $3, option_b = $4, option_c = $5, option_d = $6,
            question_type = $7, correct_answer = $8, points = $9
        WHERE id = $10
        "#,
    )
    .bind(question.quiz_id)
    .bind(&question.text)
    .bind(option_a)
    .bind(option_b)
    .bind(option_c)
    .bind(option_d)
    .bind(question.key.question_type().as_str())
    .bind(question.key.encode())
    .bind(question.points)
    .bind(id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a question; its recorded responses go with it (FK cascade).
/// Admin only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

const QUEUE_SELECT: &str = r#"
    SELECT r.id, r.user_id, u.username, r.quiz_id, q.title AS quiz_title,
           r.request_date, r.status, a.username AS admin_username, r.response_date
    FROM reattempt_requests r
    JOIN users u ON r.user_id = u.id
    JOIN quizzes q ON r.quiz_id = q.id
    LEFT JOIN users a ON r.admin_id = a.id
"#;

/// Pending reattempt requests (oldest first) and the 50 most recently processed.
/// Admin only.
pub async fn list_reattempts(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let pending = sqlx::query_as::<_, ReattemptQueueEntry>(&format!(
        "{} WHERE r.status = 'pending' ORDER BY r.request_date ASC",
        QUEUE_SELECT
    ))
    .fetch_all(&pool)
    .await?;

    let processed = sqlx::query_as::<_, ReattemptQueueEntry>(&format!(
        "{} WHERE r.status <> 'pending' ORDER BY r.response_date DESC NULLS LAST LIMIT 50",
        QUEUE_SELECT
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "pending": pending,
        "processed": processed
    })))
}

/// Approves or rejects a pending reattempt request.
/// Admin only. Requests that are no longer pending are left untouched.
pub async fn decide_reattempt(
    State(pool): State<PgPool>,
    admin: CurrentUser,
    Path((id, decision)): Path<(i64, ReattemptDecision)>,
) -> Result<impl IntoResponse, AppError> {
    let status = decision.target_status();

    let updated = sqlx::query_as::<_, ReattemptRequest>(
        r#"
        UPDATE reattempt_requests
        SET status = $1, admin_id = $2, response_date = CURRENT_TIMESTAMP
        WHERE id = $3 AND status = $4
        RETURNING id, user_id, quiz_id, request_date, status, admin_id, response_date
        "#,
    )
    .bind(status.as_str())
    .bind(admin.id)
    .bind(id)
    .bind(ReattemptStatus::Pending.as_str())
    .fetch_optional(&pool)
    .await?;

    match updated {
        Some(request) => {
            tracing::info!(
                "Admin {} marked reattempt request {} as {}",
                admin.username,
                id,
                status
            );
            Ok(Json(request))
        }
        None => {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM reattempt_requests WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&pool)
                    .await?;

            match current {
                Some(current) => Err(AppError::Conflict(format!(
                    "Request is already {}",
                    current
                ))),
                None => Err(AppError::NotFound("Reattempt request not found".to_string())),
            }
        }
    }
}

/// Submitted results, newest first, optionally narrowed to a quiz and/or user.
/// Admin only.
pub async fn list_results(
    State(pool): State<PgPool>,
    Query(filter): Query<ResultFilter>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, ResultEntry>(
        r#"
        SELECT r.id, r.user_id, u.username, r.quiz_id, q.title AS quiz_title,
               r.total_questions, r.correct_answers, r.score, r.completed_at, r.time_expired
        FROM quiz_results r
        JOIN users u ON r.user_id = u.id
        JOIN quizzes q ON r.quiz_id = q.id
        WHERE ($1::BIGINT IS NULL OR r.quiz_id = $1)
          AND ($2::BIGINT IS NULL OR r.user_id = $2)
        ORDER BY r.completed_at DESC, r.id DESC
        "#,
    )
    .bind(filter.quiz_id)
    .bind(filter.user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(results))
}
