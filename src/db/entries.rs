use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::journal::JournalEntry;

/// Persistence boundary for journal entries. All access to the
/// `journal_entries` table goes through here; the one-entry-per-day
/// invariant is enforced by the unique index on `(user_id, entry_date)`.
#[derive(Clone)]
pub struct EntryStore {
    pool: PgPool,
}

impl EntryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert today's entry for the user, or fail with `Conflict` if one
    /// already exists. The insert is a single atomic statement — no
    /// check-then-write — so concurrent same-day submits cannot both
    /// succeed, even across server instances.
    pub async fn try_create(
        &self,
        user_id: Uuid,
        content: &str,
        mood: Option<&str>,
        goal_id: Option<Uuid>,
    ) -> AppResult<JournalEntry> {
        let entry_date = Utc::now().date_naive();

        let inserted = sqlx::query_as::<_, JournalEntry>(
            r#"
            INSERT INTO journal_entries (id, user_id, content, mood, goal_id, entry_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, entry_date) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(content)
        .bind(mood)
        .bind(goal_id)
        .bind(entry_date)
        .fetch_optional(&self.pool)
        .await?;

        inserted.ok_or(AppError::Conflict(
            "You've already written a journal for today".into(),
        ))
    }

    /// All entries for a user, newest-created first.
    pub async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<JournalEntry>> {
        let entries = sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT * FROM journal_entries
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn get_by_id(&self, user_id: Uuid, id: Uuid) -> AppResult<JournalEntry> {
        sqlx::query_as::<_, JournalEntry>(
            "SELECT * FROM journal_entries WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Journal entry not found".into()))
    }

    /// Entry dates in descending order, the streak calculator's input.
    /// The unique index guarantees the dates are already distinct.
    pub async fn entry_dates(&self, user_id: Uuid) -> AppResult<Vec<NaiveDate>> {
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT entry_date FROM journal_entries
            WHERE user_id = $1
            ORDER BY entry_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(dates)
    }

    /// Attach both AI fields in one statement. An entry is either
    /// unannotated or carries both fields; there is no half-written state.
    pub async fn attach_feedback(
        &self,
        id: Uuid,
        summary: &str,
        feedback: &str,
    ) -> AppResult<JournalEntry> {
        sqlx::query_as::<_, JournalEntry>(
            r#"
            UPDATE journal_entries SET
                ai_summary = $2,
                ai_feedback = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(summary)
        .bind(feedback)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Journal entry not found".into()))
    }
}
