use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub mood: Option<String>,
    /// Associative reference to a goal owned elsewhere; nothing here
    /// checks that it resolves.
    pub goal_id: Option<Uuid>,
    /// Calendar day this entry is attributed to. Derived from the server
    /// clock (UTC) at submission, never client-supplied.
    pub entry_date: NaiveDate,
    pub ai_summary: Option<String>,
    pub ai_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// POST /api/journals
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJournalRequest {
    #[validate(length(min = 1, max = 10000, message = "Content must be 1-10000 characters"))]
    pub content: String,

    #[validate(length(max = 100, message = "Mood must be under 100 characters"))]
    pub mood: Option<String>,

    pub goal_id: Option<Uuid>,
}
