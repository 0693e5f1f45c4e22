// src/utils/session.rs

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppError;

/// Server-side session state: when a session first opened a quiz.
///
/// The marker is written once per (session, quiz) and never taken from the
/// client. Markers of a (user, quiz) are dropped when an attempt is persisted
/// or an approved reattempt is consumed, see [`clear_quiz_markers`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Records `now` as the start time unless one is already set.
    /// Returns the effective start time.
    async fn mark_started(
        &self,
        session_id: Uuid,
        user_id: i64,
        quiz_id: i64,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, AppError>;

    async fn started_at(
        &self,
        session_id: Uuid,
        quiz_id: i64,
    ) -> Result<Option<DateTime<Utc>>, AppError>;
}

/// `SessionStore` backed by the `session_quiz_starts` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
    /// Markers older than this belong to expired logins.
    max_age: Duration,
}

impl PgSessionStore {
    pub fn new(pool: PgPool, max_age: Duration) -> Self {
        Self { pool, max_age }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn mark_started(
        &self,
        session_id: Uuid,
        user_id: i64,
        quiz_id: i64,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, AppError> {
        let pruned = sqlx::query("DELETE FROM session_quiz_starts WHERE started_at < $1")
            .bind(now - self.max_age)
            .execute(&self.pool)
            .await?;
        if pruned.rows_affected() > 0 {
            tracing::debug!("Pruned {} expired quiz start markers", pruned.rows_affected());
        }

        // The no-op update makes RETURNING yield the existing row on conflict.
        let started_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO session_quiz_starts (session_id, user_id, quiz_id, started_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (session_id, quiz_id)
            DO UPDATE SET started_at = session_quiz_starts.started_at
            RETURNING started_at
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(quiz_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(started_at)
    }

    async fn started_at(
        &self,
        session_id: Uuid,
        quiz_id: i64,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let started_at = sqlx::query_scalar(
            "SELECT started_at FROM session_quiz_starts WHERE session_id = $1 AND quiz_id = $2",
        )
        .bind(session_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(started_at)
    }
}

/// Drops the start markers of every session of `user_id` for `quiz_id`.
/// Runs on the caller's connection so it commits with the attempt change.
pub async fn clear_quiz_markers(
    conn: &mut PgConnection,
    user_id: i64,
    quiz_id: i64,
) -> Result<u64, sqlx::Error> {
    let cleared = sqlx::query("DELETE FROM session_quiz_starts WHERE user_id = $1 AND quiz_id = $2")
        .bind(user_id)
        .bind(quiz_id)
        .execute(conn)
        .await?;

    Ok(cleared.rows_affected())
}

#[cfg(test)]
pub(crate) mod memory {
    use std::{collections::HashMap, sync::Mutex};

    use super::*;

    /// In-process store for unit tests.
    #[derive(Default)]
    pub struct MemorySessionStore {
        starts: Mutex<HashMap<(Uuid, i64), (i64, DateTime<Utc>)>>,
    }

    impl MemorySessionStore {
        pub fn clear_quiz(&self, user_id: i64, quiz_id: i64) {
            self.starts
                .lock()
                .unwrap()
                .retain(|(_, quiz), (user, _)| !(*user == user_id && *quiz == quiz_id));
        }
    }

    #[async_trait]
    impl SessionStore for MemorySessionStore {
        async fn mark_started(
            &self,
            session_id: Uuid,
            user_id: i64,
            quiz_id: i64,
            now: DateTime<Utc>,
        ) -> Result<DateTime<Utc>, AppError> {
            let mut starts = self.starts.lock().unwrap();
            Ok(starts.entry((session_id, quiz_id)).or_insert((user_id, now)).1)
        }

        async fn started_at(
            &self,
            session_id: Uuid,
            quiz_id: i64,
        ) -> Result<Option<DateTime<Utc>>, AppError> {
            Ok(self
                .starts
                .lock()
                .unwrap()
                .get(&(session_id, quiz_id))
                .map(|(_, started)| *started))
        }
    }

    #[tokio::test]
    async fn test_first_mark_wins_until_cleared() {
        let store = MemorySessionStore::default();
        let sid = Uuid::new_v4();
        let first = Utc::now() - Duration::seconds(90);
        let later = Utc::now();

        assert_eq!(store.mark_started(sid, 1, 7, first).await.unwrap(), first);
        assert_eq!(store.mark_started(sid, 1, 7, later).await.unwrap(), first);
        assert_eq!(store.started_at(sid, 7).await.unwrap(), Some(first));
        assert_eq!(store.started_at(Uuid::new_v4(), 7).await.unwrap(), None);

        store.clear_quiz(1, 7);
        assert_eq!(store.started_at(sid, 7).await.unwrap(), None);
        assert_eq!(store.mark_started(sid, 1, 7, later).await.unwrap(), later);
    }

    #[tokio::test]
    async fn test_clear_covers_every_session_of_the_user() {
        let store = MemorySessionStore::default();
        let (s1, s2, other) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();

        store.mark_started(s1, 1, 7, now).await.unwrap();
        store.mark_started(s2, 1, 7, now).await.unwrap();
        store.mark_started(other, 2, 7, now).await.unwrap();
        store.mark_started(s1, 1, 8, now).await.unwrap();

        store.clear_quiz(1, 7);
        assert_eq!(store.started_at(s1, 7).await.unwrap(), None);
        assert_eq!(store.started_at(s2, 7).await.unwrap(), None);
        assert_eq!(store.started_at(other, 7).await.unwrap(), Some(now));
        assert_eq!(store.started_at(s1, 8).await.unwrap(), Some(now));
    }
}
