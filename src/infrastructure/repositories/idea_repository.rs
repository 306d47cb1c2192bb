use crate::infrastructure::db::DbPool;
use crate::{
    domain::idea::Idea,
    error::AppResult,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct IdeaRepository {
    pool: Arc<DbPool>,
}

impl IdeaRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// All ideas, newest first
    pub async fn find_all(&self) -> AppResult<Vec<Idea>> {
        let pool = self.pool.as_ref();
        let ideas = sqlx::query_as::<_, Idea>(
            r#"
            SELECT id, title, description, created_at, updated_at
            FROM ideas
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(ideas)
    }

    pub async fn find_by_id(&self, idea_id: Uuid) -> AppResult<Option<Idea>> {
        let pool = self.pool.as_ref();
        let idea = sqlx::query_as::<_, Idea>(
            r#"
            SELECT id, title, description, created_at, updated_at
            FROM ideas
            WHERE id = $1
            "#,
        )
        .bind(idea_id)
        .fetch_optional(pool)
        .await?;

        Ok(idea)
    }

    pub async fn create(&self, id: Uuid, title: &str, description: Option<&str>) -> AppResult<Idea> {
        let pool = self.pool.as_ref();
        let now = chrono::Utc::now();

        let idea = sqlx::query_as::<_, Idea>(
            r#"
            INSERT INTO ideas (id, title, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, title, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(idea)
    }

    /// Returns `None` when no idea has this id
    pub async fn update(
        &self,
        idea_id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> AppResult<Option<Idea>> {
        let pool = self.pool.as_ref();
        let idea = sqlx::query_as::<_, Idea>(
            r#"
            UPDATE ideas
            SET title = $1, description = $2, updated_at = $3
            WHERE id = $4
            RETURNING id, title, description, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(chrono::Utc::now())
        .bind(idea_id)
        .fetch_optional(pool)
        .await?;

        Ok(idea)
    }

    pub async fn delete(&self, idea_id: Uuid) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            DELETE FROM ideas
            WHERE id = $1
            "#,
        )
        .bind(idea_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
