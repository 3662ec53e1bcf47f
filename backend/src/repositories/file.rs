//! File metadata repository

use anyhow::Result;
use chrono::{DateTime, Utc};
use filevault_shared::FileResponse;
use sqlx::PgPool;
use uuid::Uuid;

/// File record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    pub id: i32,
    pub uuid: Uuid,
    pub user_uuid: Uuid,
    pub filename: String,
    pub filepath: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            uuid: record.uuid,
            user_uuid: record.user_uuid,
            filename: record.filename,
            filepath: record.filepath,
            description: record.description,
            created_at: record.created_at,
        }
    }
}

/// Input for creating a file record
#[derive(Debug, Clone)]
pub struct CreateFileRecord {
    pub uuid: Uuid,
    pub user_uuid: Uuid,
    pub filename: String,
    pub filepath: String,
    pub description: Option<String>,
}

/// File repository for database operations
pub struct FileRepository;

impl FileRepository {
    /// Insert a file record
    pub async fn create(pool: &PgPool, input: CreateFileRecord) -> Result<FileRecord> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO files (uuid, user_uuid, filename, filepath, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, uuid, user_uuid, filename, filepath, description, created_at
            "#,
        )
        .bind(input.uuid)
        .bind(input.user_uuid)
        .bind(&input.filename)
        .bind(&input.filepath)
        .bind(&input.description)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// List the files owned by a user
    pub async fn list_for_user(pool: &PgPool, user_uuid: Uuid) -> Result<Vec<FileRecord>> {
        let records = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, uuid, user_uuid, filename, filepath, description, created_at
            FROM files
            WHERE user_uuid = $1
            ORDER BY id
            "#,
        )
        .bind(user_uuid)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Find a file by uuid, only if it belongs to `user_uuid`
    pub async fn find_for_user(
        pool: &PgPool,
        file_uuid: Uuid,
        user_uuid: Uuid,
    ) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, uuid, user_uuid, filename, filepath, description, created_at
            FROM files
            WHERE uuid = $1 AND user_uuid = $2
            "#,
        )
        .bind(file_uuid)
        .bind(user_uuid)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }
}
