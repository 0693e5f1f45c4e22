// tests/api_tests.rs
//
// End-to-end flows against a real Postgres. Each test is skipped when
// DATABASE_URL is not set.

use std::sync::Arc;

use quizdesk::{
    config::Config, handlers::auth::insert_user, models::user::CreateUserRequest, routes,
    state::AppState, utils::session::PgSessionStore,
};
use serde_json::{Value, json};
use sqlx::{PgPool, postgres::PgPoolOptions};

struct TestApp {
    address: String,
    pool: PgPool,
    client: reqwest::Client,
}

/// Spawns the app on a random port. Returns `None` without a database.
async fn spawn_app() -> Option<TestApp> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        admin_email: None,
        min_dwell_seconds: 30,
        port: 0,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
        sessions: Arc::new(PgSessionStore::new(pool.clone(), chrono::Duration::seconds(600))),
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: reqwest::Client::new(),
    })
}

fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..10])
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Registers a learner and returns (user id, token).
    async fn learner(&self) -> (i64, String) {
        let (id, _, token) = self.learner_with_name().await;
        (id, token)
    }

    /// Registers a learner and returns (user id, username, token).
    async fn learner_with_name(&self) -> (i64, String, String) {
        let username = unique_name("learner");
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "password123"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        let id = body["id"].as_i64().unwrap();
        let token = self.login(&username, "password123").await;
        (id, username, token)
    }

    async fn admin(&self) -> String {
        let username = unique_name("admin");
        let account = CreateUserRequest {
            username: username.clone(),
            email: format!("{}@example.com", username),
            password: "adminpass".to_string(),
        };
        insert_user(&self.pool, &account, true).await.unwrap();
        self.login(&username, "adminpass").await
    }

    /// Creates a quiz with the given questions.
    async fn quiz_with(&self, admin: &str, questions: &[QuestionSpec]) -> (i64, Vec<i64>) {
        let response = self
            .client
            .post(self.url("/api/admin/quizzes"))
            .bearer_auth(admin)
            .json(&json!({ "title": unique_name("Quiz"), "description": "Test quiz" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let quiz: Value = response.json().await.unwrap();
        let quiz_id = quiz["id"].as_i64().unwrap();

        let mut ids = Vec::new();
        for (i, (question_type, options, correct)) in questions.iter().enumerate() {
            let mut payload = json!({
                "quiz_id": quiz_id,
                "question_text": format!("Question {}", i + 1),
                "question_type": question_type,
                "correct_answer": correct,
            });
            for (letter, text) in ["a", "b", "c", "d"].iter().zip(options.iter()) {
                payload[format!("option_{}", letter)] = json!(text);
            }

            let response = self
                .client
                .post(self.url("/api/admin/questions"))
                .bearer_auth(admin)
                .json(&payload)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 201);
            let body: Value = response.json().await.unwrap();
            ids.push(body["id"].as_i64().unwrap());
        }

        (quiz_id, ids)
    }

    async fn open(&self, token: &str, quiz_id: i64) -> reqwest::Response {
        self.client
            .get(self.url(&format!("/api/quizzes/{}", quiz_id)))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn submit(&self, token: &str, quiz_id: i64, body: String) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/quizzes/{}/submit", quiz_id)))
            .bearer_auth(token)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .unwrap()
    }

    async fn set_time_limit(&self, admin: &str, quiz_id: i64, minutes: i32) {
        let response = self
            .client
            .put(self.url(&format!("/api/admin/quizzes/{}/time-limit", quiz_id)))
            .bearer_auth(admin)
            .json(&json!({ "time_limit": minutes }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    async fn reattempt_approved(&self, token: &str, admin: &str, quiz_id: i64) {
        let response = self
            .client
            .post(self.url(&format!("/api/quizzes/{}/reattempt", quiz_id)))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        let request_id = body["request"]["id"].as_i64().unwrap();

        let approve = self
            .client
            .post(self.url(&format!("/api/admin/reattempts/{}/approve", request_id)))
            .bearer_auth(admin)
            .send()
            .await
            .unwrap();
        assert_eq!(approve.status().as_u16(), 200);
    }

    async fn marker_count(&self, user_id: i64, quiz_id: i64) -> i64 {
        self.count(
            "SELECT COUNT(*) FROM session_quiz_starts WHERE user_id = $1 AND quiz_id = $2",
            user_id,
            quiz_id,
        )
        .await
    }

    async fn count(&self, sql: &str, user_id: i64, quiz_id: i64) -> i64 {
        sqlx::query_scalar(sql)
            .bind(user_id)
            .bind(quiz_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    async fn result_count(&self, user_id: i64, quiz_id: i64) -> i64 {
        self.count(
            "SELECT COUNT(*) FROM quiz_results WHERE user_id = $1 AND quiz_id = $2",
            user_id,
            quiz_id,
        )
        .await
    }

    async fn response_count(&self, user_id: i64, quiz_id: i64) -> i64 {
        self.count(
            r#"SELECT COUNT(*) FROM user_responses ur
               JOIN questions q ON ur.question_id = q.id
               WHERE ur.user_id = $1 AND q.quiz_id = $2"#,
            user_id,
            quiz_id,
        )
        .await
    }
}

/// (type, option texts, correct letters)
type QuestionSpec = (&'static str, &'static [&'static str], &'static [&'static str]);

fn q(
    question_type: &'static str,
    options: &'static [&'static str],
    correct: &'static [&'static str],
) -> QuestionSpec {
    (question_type, options, correct)
}

const ABCD: &[&str] = &["one", "two", "three", "four"];

#[tokio::test]
async fn rendering_writes_nothing_and_early_submit_is_rejected() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let (user_id, token) = app.learner().await;
    let (quiz_id, ids) = app.quiz_with(&admin, &[q("single", ABCD, &["a"])]).await;

    let first = app.open(&token, quiz_id).await;
    assert_eq!(first.status().as_u16(), 200);
    let first: Value = first.json().await.unwrap();
    assert_eq!(first["state"], "ready");
    assert_eq!(first["questions"][0]["field_name"], format!("question_{}", ids[0]));

    // Re-render keeps the original start time.
    let second: Value = app.open(&token, quiz_id).await.json().await.unwrap();
    assert_eq!(first["started_at"], second["started_at"]);

    assert_eq!(app.result_count(user_id, quiz_id).await, 0);
    assert_eq!(app.response_count(user_id, quiz_id).await, 0);

    let response = app
        .submit(&token, quiz_id, format!("question_{}=a&submit_quiz=1", ids[0]))
        .await;
    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(app.result_count(user_id, quiz_id).await, 0);
    assert_eq!(app.response_count(user_id, quiz_id).await, 0);
}

#[tokio::test]
async fn submission_without_render_is_rejected() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let (user_id, token) = app.learner().await;
    let (quiz_id, ids) = app.quiz_with(&admin, &[q("single", ABCD, &["a"])]).await;

    let response = app
        .submit(&token, quiz_id, format!("question_{}=a&submit_quiz=1", ids[0]))
        .await;
    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(app.result_count(user_id, quiz_id).await, 0);
}

#[tokio::test]
async fn graded_submission_after_dwell() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let (user_id, token) = app.learner().await;
    let (quiz_id, ids) = app
        .quiz_with(
            &admin,
            &[
                q("single", ABCD, &["a"]),
                q("single", ABCD, &["b"]),
                q("multi", ABCD, &["a", "c"]),
                q("true_false", &[], &["b"]),
            ],
        )
        .await;

    assert_eq!(app.open(&token, quiz_id).await.status().as_u16(), 200);

    // Age the start marker past the minimum dwell.
    sqlx::query(
        "UPDATE session_quiz_starts SET started_at = started_at - INTERVAL '5 minutes' WHERE quiz_id = $1",
    )
    .bind(quiz_id)
    .execute(&app.pool)
    .await
    .unwrap();

    let body = format!(
        "question_{q1}=a&question_{q2}=c&question_{q3}%5B%5D=c&question_{q3}%5B%5D=a&question_{q4}=b&submit_quiz=1",
        q1 = ids[0],
        q2 = ids[1],
        q3 = ids[2],
        q4 = ids[3],
    );
    let response = app.submit(&token, quiz_id, body).await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["total_questions"], 4);
    assert_eq!(body["result"]["correct_answers"], 3);
    assert_eq!(body["result"]["score"], 75.0);
    assert_eq!(body["result"]["time_expired"], false);

    assert_eq!(app.result_count(user_id, quiz_id).await, 1);
    assert_eq!(app.response_count(user_id, quiz_id).await, 4);

    let stored: Option<String> = sqlx::query_scalar(
        "SELECT selected_answer FROM user_responses WHERE user_id = $1 AND question_id = $2",
    )
    .bind(user_id)
    .bind(ids[2])
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(stored.as_deref(), Some("a,c"));

    // Already taken: the page shows the score, a second post is refused.
    let page: Value = app.open(&token, quiz_id).await.json().await.unwrap();
    assert_eq!(page["state"], "completed");
    assert_eq!(page["score"], 75.0);

    let again = app
        .submit(&token, quiz_id, format!("question_{}=a&time_expired=1", ids[0]))
        .await;
    assert_eq!(again.status().as_u16(), 409);
    assert_eq!(app.result_count(user_id, quiz_id).await, 1);

    let review: Value = app
        .client
        .get(app.url(&format!("/api/quizzes/{}/result", quiz_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = review["questions"].as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[1]["is_correct"], false);
    assert_eq!(items[2]["is_correct"], true);
}

#[tokio::test]
async fn reattempt_cycle() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let (user_id, token) = app.learner().await;
    let (quiz_id, ids) = app
        .quiz_with(&admin, &[q("single", ABCD, &["a"]), q("single", ABCD, &["b"])])
        .await;

    // Countdown-forced submission bypasses the dwell check.
    assert_eq!(app.open(&token, quiz_id).await.status().as_u16(), 200);
    let response = app
        .submit(&token, quiz_id, format!("question_{}=a&time_expired=1", ids[0]))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["time_expired"], true);
    assert_eq!(body["result"]["score"], 50.0);

    let reattempt_url = app.url(&format!("/api/quizzes/{}/reattempt", quiz_id));
    let first = app.client.post(&reattempt_url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 201);
    let first: Value = first.json().await.unwrap();
    let request_id = first["request"]["id"].as_i64().unwrap();

    let second = app.client.post(&reattempt_url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 409);
    let pending = app
        .count(
            "SELECT COUNT(*) FROM reattempt_requests WHERE user_id = $1 AND quiz_id = $2 AND status = 'pending'",
            user_id,
            quiz_id,
        )
        .await;
    assert_eq!(pending, 1);

    // Pending blocks the quiz.
    assert_eq!(app.open(&token, quiz_id).await.status().as_u16(), 409);

    let queue: Value = app
        .client
        .get(app.url("/api/admin/reattempts"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        queue["pending"]
            .as_array()
            .unwrap()
            .iter()
            .any(|entry| entry["id"].as_i64() == Some(request_id))
    );

    let approve = app
        .client
        .post(app.url(&format!("/api/admin/reattempts/{}/approve", request_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(approve.status().as_u16(), 200);

    let again = app
        .client
        .post(app.url(&format!("/api/admin/reattempts/{}/reject", request_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);

    // Opening the quiz consumes the approval and clears the prior attempt.
    let page = app.open(&token, quiz_id).await;
    assert_eq!(page.status().as_u16(), 200);
    let page: Value = page.json().await.unwrap();
    assert_eq!(page["state"], "ready");
    assert_eq!(page["reattempt_approved"], true);

    assert_eq!(app.result_count(user_id, quiz_id).await, 0);
    assert_eq!(app.response_count(user_id, quiz_id).await, 0);
    let status: String = sqlx::query_scalar("SELECT status FROM reattempt_requests WHERE id = $1")
        .bind(request_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(status, "completed");

    let response = app
        .submit(
            &token,
            quiz_id,
            format!("question_{}=a&question_{}=b&time_expired=1", ids[0], ids[1]),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["score"], 100.0);
    assert_eq!(app.result_count(user_id, quiz_id).await, 1);
}

#[tokio::test]
async fn admin_question_validation_and_time_limit() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let (quiz_id, ids) = app.quiz_with(&admin, &[q("single", ABCD, &["a"])]).await;

    let response = app
        .client
        .post(app.url("/api/admin/questions"))
        .bearer_auth(&admin)
        .json(&json!({
            "quiz_id": quiz_id,
            "question_text": "Pick",
            "question_type": "single",
            "option_a": "yes",
            "option_b": "no",
            "correct_answer": ["c"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["field"], "correct_answer");

    let limit_url = app.url(&format!("/api/admin/quizzes/{}/time-limit", quiz_id));
    let bad = app
        .client
        .put(&limit_url)
        .bearer_auth(&admin)
        .json(&json!({ "time_limit": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 422);

    let ok = app
        .client
        .put(&limit_url)
        .bearer_auth(&admin)
        .json(&json!({ "time_limit": 15 }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status().as_u16(), 200);

    let (_, token) = app.learner().await;
    let page: Value = app.open(&token, quiz_id).await.json().await.unwrap();
    let remaining = page["remaining_seconds"].as_i64().unwrap();
    assert!(remaining > 14 * 60 && remaining <= 15 * 60);

    let delete = app
        .client
        .delete(app.url(&format!("/api/admin/questions/{}", ids[0])))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status().as_u16(), 204);

    // No questions left.
    assert_eq!(app.open(&token, quiz_id).await.status().as_u16(), 404);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let Some(app) = spawn_app().await else { return };
    let username = unique_name("dup");
    let payload = json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "password123"
    });

    let first = app.client.post(app.url("/api/auth/register")).json(&payload).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 201);
    let second = app.client.post(app.url("/api/auth/register")).json(&payload).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 409);

    let wrong = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "username": username, "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);
}

#[tokio::test]
async fn reattempt_restarts_the_clock_in_every_session() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let (user_id, username, first_session) = app.learner_with_name().await;
    let second_session = app.login(&username, "password123").await;
    let (quiz_id, ids) = app.quiz_with(&admin, &[q("single", ABCD, &["a"])]).await;
    app.set_time_limit(&admin, quiz_id, 5).await;

    // First session opens the quiz and then sits idle past the time limit.
    assert_eq!(app.open(&first_session, quiz_id).await.status().as_u16(), 200);
    sqlx::query(
        "UPDATE session_quiz_starts SET started_at = started_at - INTERVAL '9 minutes' WHERE user_id = $1 AND quiz_id = $2",
    )
    .bind(user_id)
    .bind(quiz_id)
    .execute(&app.pool)
    .await
    .unwrap();

    assert_eq!(app.open(&second_session, quiz_id).await.status().as_u16(), 200);
    assert_eq!(app.marker_count(user_id, quiz_id).await, 2);
    let response = app
        .submit(&second_session, quiz_id, format!("question_{}=a&time_expired=1", ids[0]))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    // Persisting the attempt drops the markers of both sessions.
    assert_eq!(app.marker_count(user_id, quiz_id).await, 0);

    app.reattempt_approved(&second_session, &admin, quiz_id).await;

    let page = app.open(&first_session, quiz_id).await;
    assert_eq!(page.status().as_u16(), 200);
    let page: Value = page.json().await.unwrap();
    assert_eq!(page["reattempt_approved"], true);
    let remaining = page["remaining_seconds"].as_i64().unwrap();
    assert!(remaining > 290, "remaining_seconds = {}", remaining);

    // The dwell guard applies to the new attempt.
    let response = app
        .submit(&first_session, quiz_id, format!("question_{}=a&submit_quiz=1", ids[0]))
        .await;
    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(app.result_count(user_id, quiz_id).await, 0);
}

#[tokio::test]
async fn consuming_an_approval_drops_leftover_markers() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let (user_id, token) = app.learner().await;
    let (quiz_id, ids) = app.quiz_with(&admin, &[q("single", ABCD, &["a"])]).await;

    assert_eq!(app.open(&token, quiz_id).await.status().as_u16(), 200);
    let response = app
        .submit(&token, quiz_id, format!("question_{}=a&time_expired=1", ids[0]))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    app.reattempt_approved(&token, &admin, quiz_id).await;

    // A marker written by some other login while the approval was waiting.
    sqlx::query(
        r#"INSERT INTO session_quiz_starts (session_id, user_id, quiz_id, started_at)
           VALUES ($1, $2, $3, NOW() - INTERVAL '8 minutes')"#,
    )
    .bind(uuid::Uuid::new_v4())
    .bind(user_id)
    .bind(quiz_id)
    .execute(&app.pool)
    .await
    .unwrap();

    assert_eq!(app.open(&token, quiz_id).await.status().as_u16(), 200);
    // Only the marker of the render that consumed the approval remains.
    assert_eq!(app.marker_count(user_id, quiz_id).await, 1);
}

#[tokio::test]
async fn expired_markers_are_pruned() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let (user_id, token) = app.learner().await;
    let (quiz_id, _) = app.quiz_with(&admin, &[q("single", ABCD, &["a"])]).await;

    let stale_session = uuid::Uuid::new_v4();
    sqlx::query(
        r#"INSERT INTO session_quiz_starts (session_id, user_id, quiz_id, started_at)
           VALUES ($1, $2, $3, NOW() - INTERVAL '2 hours')"#,
    )
    .bind(stale_session)
    .bind(user_id)
    .bind(quiz_id)
    .execute(&app.pool)
    .await
    .unwrap();

    assert_eq!(app.open(&token, quiz_id).await.status().as_u16(), 200);

    let stale: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM session_quiz_starts WHERE session_id = $1")
        .bind(stale_session)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(stale, 0);
    assert_eq!(app.marker_count(user_id, quiz_id).await, 1);
}

#[tokio::test]
async fn concurrent_duplicate_submission_keeps_one_result() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let (user_id, token) = app.learner().await;
    let (quiz_id, ids) = app
        .quiz_with(&admin, &[q("single", ABCD, &["a"]), q("single", ABCD, &["b"])])
        .await;

    assert_eq!(app.open(&token, quiz_id).await.status().as_u16(), 200);

    let body = format!("question_{}=a&question_{}=b&time_expired=1", ids[0], ids[1]);
    let (first, second) = tokio::join!(
        app.submit(&token, quiz_id, body.clone()),
        app.submit(&token, quiz_id, body.clone()),
    );

    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, [201, 409]);

    assert_eq!(app.result_count(user_id, quiz_id).await, 1);
    assert_eq!(app.response_count(user_id, quiz_id).await, 2);
}

#[tokio::test]
async fn admin_lists_results_and_questions() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let (first_id, first) = app.learner().await;
    let (second_id, second) = app.learner().await;
    let (quiz_id, ids) = app
        .quiz_with(&admin, &[q("single", ABCD, &["a"]), q("multi", ABCD, &["a", "c"])])
        .await;

    for token in [&first, &second] {
        assert_eq!(app.open(token, quiz_id).await.status().as_u16(), 200);
        let response = app
            .submit(token, quiz_id, format!("question_{}=a&time_expired=1", ids[0]))
            .await;
        assert_eq!(response.status().as_u16(), 201);
    }

    let results: Value = app
        .client
        .get(app.url(&format!("/api/admin/results?quiz_id={}", quiz_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 2);
    // Newest first.
    assert_eq!(results[0]["user_id"].as_i64(), Some(second_id));
    assert_eq!(results[1]["user_id"].as_i64(), Some(first_id));
    assert!(results[0]["username"].as_str().unwrap().starts_with("learner_"));
    assert_eq!(results[0]["score"], 50.0);

    let narrowed: Value = app
        .client
        .get(app.url(&format!(
            "/api/admin/results?quiz_id={}&user_id={}",
            quiz_id, first_id
        )))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(narrowed.as_array().unwrap().len(), 1);

    let questions: Value = app
        .client
        .get(app.url(&format!("/api/admin/questions?quiz_id={}", quiz_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let questions = questions.as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["id"].as_i64(), Some(ids[0]));
    assert_eq!(questions[1]["question_type"], "multi");
    assert_eq!(questions[1]["correct_answer"], json!(["a", "c"]));

    let missing = app
        .client
        .get(app.url("/api/admin/questions?quiz_id=-1"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let forbidden = app
        .client
        .get(app.url("/api/admin/results"))
        .bearer_auth(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);
}
