//! File metadata service

use crate::error::ApiError;
use crate::repositories::{CreateFileRecord, FileRecord, FileRepository, UserRepository};
use crate::storage::StoredFile;
use filevault_shared::FileResponse;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// File service for per-user file operations
pub struct FileService;

impl FileService {
    /// Fail with 404 unless the user exists
    pub async fn ensure_user_exists(pool: &PgPool, user_uuid: Uuid) -> Result<(), ApiError> {
        if UserRepository::exists(pool, user_uuid)
            .await
            .map_err(ApiError::Internal)?
        {
            Ok(())
        } else {
            Err(ApiError::NotFound("User not found".to_string()))
        }
    }

    /// List a user's files
    pub async fn list_files(pool: &PgPool, user_uuid: Uuid) -> Result<Vec<FileResponse>, ApiError> {
        let records = FileRepository::list_for_user(pool, user_uuid)
            .await
            .map_err(ApiError::Internal)?;
        Ok(records.into_iter().map(FileResponse::from).collect())
    }

    /// Persist metadata for a file already written to storage
    pub async fn record_upload(
        pool: &PgPool,
        user_uuid: Uuid,
        stored: &StoredFile,
        description: Option<String>,
    ) -> Result<FileResponse, ApiError> {
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let record = FileRepository::create(
            pool,
            CreateFileRecord {
                uuid: stored.file_uuid,
                user_uuid,
                filename: stored.filename.clone(),
                filepath: stored.relative_path.clone(),
                description,
            },
        )
        .await
        .map_err(ApiError::Internal)?;

        info!(user = %user_uuid, file = %record.uuid, bytes = stored.size, "File uploaded");
        Ok(record.into())
    }

    /// Find one of a user's files
    pub async fn find_file(
        pool: &PgPool,
        user_uuid: Uuid,
        file_uuid: Uuid,
    ) -> Result<FileRecord, ApiError> {
        FileRepository::find_for_user(pool, file_uuid, user_uuid)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("File not found".to_string()))
    }
}
