use super::models::{Note, NoteDraft};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPool, query, query_as};
use uuid::Uuid;

/// Everything the store needs from the system of record. Postgres is the
/// real implementation; tests swap in an in-memory one.
#[async_trait]
pub trait NoteBackend: Send + Sync {
    /// All notes, most recently updated first.
    async fn list(&self) -> Result<Vec<Note>>;
    async fn get(&self, id: Uuid) -> Result<Option<Note>>;
    /// Returns the row as the database stored it, including the id and
    /// timestamps it assigned.
    async fn insert(&self, draft: &NoteDraft) -> Result<Note>;
    async fn update(
        &self,
        id: Uuid,
        draft: &NoteDraft,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;
    async fn set_completed(
        &self,
        id: Uuid,
        completed: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct PgBackend {
    db: PgPool,
}

impl PgBackend {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NoteBackend for PgBackend {
    async fn list(&self) -> Result<Vec<Note>> {
        let notes = query_as::<_, Note>(
            "select id, title, content, tags, completed, created_at, updated_at
            from notes
            order by updated_at desc",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(notes)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Note>> {
        let note = query_as::<_, Note>(
            "select id, title, content, tags, completed, created_at, updated_at
            from notes
            where id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(note)
    }

    async fn insert(&self, draft: &NoteDraft) -> Result<Note> {
        let note = query_as::<_, Note>(
            "
            insert into notes (title, content, tags, completed, updated_at)
            values ($1, $2, $3, $4, now())
            returning id, title, content, tags, completed, created_at, updated_at
            ",
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(&draft.tags)
        .bind(draft.completed)
        .fetch_one(&self.db)
        .await?;

        Ok(note)
    }

    async fn update(
        &self,
        id: Uuid,
        draft: &NoteDraft,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        query(
            "
            update notes
            set
                title = $1,
                content = $2,
                tags = $3,
                completed = $4,
                updated_at = $5
            where id = $6
            ",
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(&draft.tags)
        .bind(draft.completed)
        .bind(updated_at)
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn set_completed(
        &self,
        id: Uuid,
        completed: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        query("update notes set completed = $1, updated_at = $2 where id = $3")
            .bind(completed)
            .bind(updated_at)
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        query("delete from notes where id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
