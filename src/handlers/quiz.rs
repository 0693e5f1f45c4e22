// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::{
    config::Config,
    error::AppError,
    models::{
        answer::{Letter, LetterSet},
        quiz::Quiz,
        result::{QuizResult, UserResponse},
        submission::Submission,
    },
    services::{
        attempt::{DUPLICATE_SUBMISSION, persist_attempt},
        catalog,
        gate::{self, GateState, PENDING_MESSAGE},
        grading::{Selection, grade},
        render::{OptionView, QuestionView, render_questions},
        timing,
    },
    state::Sessions,
    utils::jwt::CurrentUser,
};

/// What the quiz page shows.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuizPage {
    /// Already taken: show the score and offer a reattempt request.
    Completed {
        quiz_id: i64,
        title: String,
        score: f64,
        correct_answers: i32,
        total_questions: i32,
        completed_at: DateTime<Utc>,
        can_request_reattempt: bool,
    },
    /// The question set, ready to answer.
    Ready {
        quiz: Quiz,
        questions: Vec<QuestionView>,
        started_at: DateTime<Utc>,
        remaining_seconds: Option<i64>,
        reattempt_approved: bool,
    },
}

/// Lists active quizzes.
pub async fn list_quizzes(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(catalog::list_active_quizzes(&pool).await?))
}

/// Opens a quiz for the current user.
///
/// * Runs the attempt gate (completed / pending / approved / fresh).
/// * Consumes an approved reattempt before rendering.
/// * Records the session's start time on first render only; never writes
///   responses or results.
pub async fn take_quiz(
    State(pool): State<PgPool>,
    State(sessions): State<Sessions>,
    user: CurrentUser,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = catalog::fetch_active_quiz(&pool, quiz_id).await?;

    let mut reattempt_approved = false;
    let mut state = gate::load_gate(&pool, user.id, quiz_id).await?;
    tracing::debug!("Quiz {} gate for user {}: {}", quiz_id, user.id, state.name());

    let approved_request = match &state {
        GateState::ReattemptApproved { request, .. } => Some(request.id),
        _ => None,
    };
    if let Some(request_id) = approved_request {
        reattempt_approved = gate::consume_approval(&pool, user.id, quiz_id, request_id).await?;
        // Re-read: a concurrent load may have consumed it instead.
        state = gate::load_gate(&pool, user.id, quiz_id).await?;
    }

    match state {
        GateState::NoAttempt => {}
        GateState::Completed(result) => {
            return Ok(Json(QuizPage::Completed {
                quiz_id,
                title: quiz.title,
                score: result.score,
                correct_answers: result.correct_answers,
                total_questions: result.total_questions,
                completed_at: result.completed_at,
                can_request_reattempt: true,
            }));
        }
        GateState::ReattemptPending { .. } => {
            return Err(AppError::Conflict(PENDING_MESSAGE.to_string()));
        }
        // Only reachable if another approval landed between the consume and the re-read.
        GateState::ReattemptApproved { .. } => {
            return Err(AppError::Conflict(
                "Your reattempt is being prepared. Please reload the quiz.".to_string(),
            ));
        }
    }

    let questions = catalog::fetch_nonempty_questions(&pool, quiz_id).await?;

    let now = Utc::now();
    let started_at = sessions
        .mark_started(user.session_id, user.id, quiz_id, now)
        .await?;
    let remaining_seconds = timing::remaining_seconds(quiz.time_limit, started_at, now);

    tracing::debug!(
        "User {} opened quiz {} (started {}, remaining {:?})",
        user.id,
        quiz_id,
        started_at,
        remaining_seconds
    );

    Ok(Json(QuizPage::Ready {
        questions: render_questions(&questions),
        quiz,
        started_at,
        remaining_seconds,
        reattempt_approved,
    }))
}

/// Files a reattempt request for a completed quiz.
pub async fn request_reattempt(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    catalog::fetch_active_quiz(&pool, quiz_id).await?;

    let request = gate::request_reattempt(&pool, user.id, quiz_id).await?;
    tracing::info!("User {} requested a reattempt of quiz {}", user.id, quiz_id);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "request": request,
            "message": "Your request for reattempt has been submitted to admin."
        })),
    ))
}

/// Grades and stores a quiz form post.
///
/// * Rejects posts blocked by the attempt gate.
/// * Enforces the minimum dwell time from the server-held start time unless
///   the countdown expired.
/// * Persists responses and the result atomically; the start markers go with
///   the same commit.
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    State(sessions): State<Sessions>,
    State(config): State<Config>,
    user: CurrentUser,
    Path(quiz_id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let submission = Submission::from_form(fields)?;
    if !submission.submit_quiz && !submission.time_expired {
        return Err(AppError::BadRequest("Missing submit_quiz field".to_string()));
    }

    let quiz = catalog::fetch_active_quiz(&pool, quiz_id).await?;

    match gate::load_gate(&pool, user.id, quiz_id).await? {
        GateState::NoAttempt => {}
        GateState::Completed(_) => {
            return Err(AppError::Conflict(DUPLICATE_SUBMISSION.to_string()));
        }
        GateState::ReattemptPending { .. } => {
            return Err(AppError::Conflict(PENDING_MESSAGE.to_string()));
        }
        GateState::ReattemptApproved { .. } => {
            return Err(AppError::Conflict(
                "Open the quiz again to start your approved reattempt.".to_string(),
            ));
        }
    }

    let now = Utc::now();
    let started_at = sessions.started_at(user.session_id, quiz_id).await?;
    timing::check_dwell(
        started_at,
        now,
        submission.time_expired,
        config.min_dwell_seconds,
    )?;

    let questions = catalog::fetch_nonempty_questions(&pool, quiz_id).await?;
    let report = grade(&questions, &submission);
    let time_expired =
        submission.time_expired || timing::limit_exceeded(quiz.time_limit, started_at, now);

    let result = persist_attempt(&pool, user.id, quiz_id, &report, time_expired).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "result": result,
            "points_earned": report.points_earned,
            "points_possible": report.points_possible,
            "message": "Quiz submitted successfully"
        })),
    ))
}

/// One reviewed question on the result page.
#[derive(Debug, Serialize)]
pub struct ReviewItem {
    pub question_id: i64,
    pub text: String,
    pub options: Vec<OptionView>,
    pub selected: LetterSet,
    pub correct: LetterSet,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct ResultReview {
    pub quiz_id: i64,
    pub title: String,
    pub result: QuizResult,
    pub questions: Vec<ReviewItem>,
}

/// Latest result of the current user for a quiz, with per-question review.
///
/// Correctness is recomputed from the stored selections with the grading
/// rules.
pub async fn get_result(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = catalog::fetch_quiz(&pool, quiz_id).await?;
    let result = gate::latest_result(&pool, user.id, quiz_id)
        .await?
        .ok_or(AppError::NotFound("No results found for this quiz.".to_string()))?;

    let responses = sqlx::query_as::<_, UserResponse>(
        r#"
        SELECT ur.id, ur.user_id, ur.question_id, ur.selected_answer, ur.is_correct, ur.created_at
        FROM user_responses ur
        JOIN questions q ON ur.question_id = q.id
        WHERE ur.user_id = $1 AND q.quiz_id = $2
        ORDER BY ur.question_id
        "#,
    )
    .bind(user.id)
    .bind(quiz_id)
    .fetch_all(&pool)
    .await?;

    let selected_by_question: HashMap<i64, Option<String>> = responses
        .into_iter()
        .map(|r| (r.question_id, r.selected_answer))
        .collect();

    let questions = catalog::fetch_questions(&pool, quiz_id).await?;
    let review = questions
        .iter()
        .filter_map(|question| {
            let stored = selected_by_question.get(&question.id)?;
            let values: Vec<String> = stored
                .as_deref()
                .map(|s| s.split(',').map(str::to_string).collect())
                .unwrap_or_default();
            let selection = Selection::parse(&question.key, Some(values.as_slice()));
            let selected = match &selection {
                Selection::One(letter) => std::iter::once(*letter).collect(),
                Selection::Many(set) => set.clone(),
                Selection::Unanswered | Selection::Invalid => LetterSet::new(),
            };

            Some(ReviewItem {
                question_id: question.id,
                text: question.text.clone(),
                options: Letter::ALL
                    .into_iter()
                    .filter_map(|letter| {
                        question.option(letter).map(|text| OptionView {
                            letter,
                            text: text.to_string(),
                        })
                    })
                    .collect(),
                selected,
                correct: question.key.letters(),
                is_correct: selection.matches(&question.key),
            })
        })
        .collect();

    Ok(Json(ResultReview {
        quiz_id,
        title: quiz.title,
        result,
        questions: review,
    }))
}
