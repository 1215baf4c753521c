//! Postgres store backend over sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::models::{Note, User, UserRole};
use crate::database::store::{
    NoteSort, NoteStore, Page, PageRequest, SortDirection, StoreError, UserStore,
};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect, then bring the schema up to date with the embedded
    /// migrations.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tracing::info!("connected to postgres store");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// role is stored as VARCHAR, so users are read through an intermediate row
#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    username: String,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = row
            .role
            .parse()
            .map_err(|e: String| StoreError::Unavailable(e))?;
        Ok(User {
            id: row.id,
            name: row.name,
            username: row.username,
            password_hash: row.password_hash,
            role,
        })
    }
}

fn note_from_row(row: PgRow) -> Result<Note, sqlx::Error> {
    Ok(Note {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        tags: row.try_get::<Vec<String>, _>("tags")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn order_clause(request: &PageRequest) -> &'static str {
    match (request.sort, request.direction) {
        (NoteSort::Title, SortDirection::Asc) => "title ASC",
        (NoteSort::Title, SortDirection::Desc) => "title DESC",
        (NoteSort::CreatedAt, SortDirection::Asc) => "created_at ASC",
        (NoteSort::CreatedAt, SortDirection::Desc) => "created_at DESC",
        (NoteSort::UpdatedAt, SortDirection::Asc) => "updated_at ASC",
        (NoteSort::UpdatedAt, SortDirection::Desc) => "updated_at DESC",
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, username, password_hash, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn save(&self, user: User) -> Result<User, StoreError> {
        let result = sqlx::query(
            "INSERT INTO users (id, name, username, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE \
             SET name = $2, username = $3, password_hash = $4, role = $5",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateUsername(user.username)),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

const NOTE_COLUMNS: &str = "id, user_id, tags, title, content, created_at, updated_at";

fn collect_notes(rows: Vec<PgRow>) -> Result<Vec<Note>, sqlx::Error> {
    rows.into_iter().map(note_from_row).collect()
}

#[async_trait]
impl NoteStore for PostgresStore {
    async fn save(&self, note: Note) -> Result<Note, StoreError> {
        let row = sqlx::query(
            "INSERT INTO notes (id, user_id, tags, title, content) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE \
             SET tags = $3, title = $4, content = $5, updated_at = now() \
             RETURNING id, user_id, tags, title, content, created_at, updated_at",
        )
        .bind(note.id)
        .bind(note.user_id)
        .bind(&note.tags)
        .bind(&note.title)
        .bind(&note.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(note_from_row(row)?)
    }

    async fn find_by_user_and_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<Note>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, tags, title, content, created_at, updated_at \
             FROM notes WHERE user_id = $1 AND id = $2",
        )
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(note_from_row).transpose().map_err(Into::into)
    }

    async fn exists_by_user_and_id(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM notes WHERE user_id = $1 AND id = $2)")
                .bind(user_id)
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn find_by_user(&self, user_id: Uuid, request: &PageRequest) -> Result<Page<Note>, StoreError> {
        let sql = format!(
            "SELECT {} FROM notes WHERE user_id = $1 ORDER BY {} LIMIT $2 OFFSET $3",
            NOTE_COLUMNS,
            order_clause(request)
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(request.size as i64)
            .bind(request.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(collect_notes(rows)?, request, total as u64))
    }

    async fn search_by_term(
        &self,
        user_id: Uuid,
        term: &str,
        request: &PageRequest,
    ) -> Result<Page<Note>, StoreError> {
        let pattern = format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"));
        let sql = format!(
            "SELECT {} FROM notes \
             WHERE user_id = $1 AND (title ILIKE $2 OR content ILIKE $2) \
             ORDER BY {} LIMIT $3 OFFSET $4",
            NOTE_COLUMNS,
            order_clause(request)
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(&pattern)
            .bind(request.size as i64)
            .bind(request.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notes \
             WHERE user_id = $1 AND (title ILIKE $2 OR content ILIKE $2)",
        )
        .bind(user_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page::new(collect_notes(rows)?, request, total as u64))
    }

    async fn search_by_tags(
        &self,
        user_id: Uuid,
        tags: &[String],
        request: &PageRequest,
    ) -> Result<Page<Note>, StoreError> {
        let lowered: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        let tag_match = "EXISTS (SELECT 1 FROM unnest(tags) AS t WHERE lower(t) = ANY($2))";
        let sql = format!(
            "SELECT {} FROM notes WHERE user_id = $1 AND {} ORDER BY {} LIMIT $3 OFFSET $4",
            NOTE_COLUMNS,
            tag_match,
            order_clause(request)
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(&lowered)
            .bind(request.size as i64)
            .bind(request.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM notes WHERE user_id = $1 AND {}", tag_match);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(user_id)
            .bind(&lowered)
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(collect_notes(rows)?, request, total as u64))
    }

    async fn delete_by_user_and_id(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("note {}", id)));
        }
        Ok(())
    }

    async fn delete_by_user(&self, user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM notes WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
