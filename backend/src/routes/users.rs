//! User and file routes
//!
//! Every route here sits behind the authentication gate. Listing users is
//! admin-only; everything under `/:uuid` is self-or-admin.

use crate::auth::{authenticate, require_admin, require_self_or_admin, Identity};
use crate::error::{ApiError, ApiResult};
use crate::services::{FileService, UserService};
use crate::state::AppState;
use crate::storage::{self, FileStorage, StoredFile, UploadError};
use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection}, DefaultBodyLimit, Multipart,
        Path, State,
    },
    http::{header, StatusCode},
    middleware,
    response::Response,
    routing::get,
    Json, Router,
};
use filevault_shared::{FileResponse, UserResponse};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Room for multipart boundaries, part headers and the description field
const MULTIPART_OVERHEAD: usize = 64 * 1024;

const MALFORMED_MULTIPART: &str = "Malformed multipart body";

const FILE_FIELD: &str = "file";
const DESCRIPTION_FIELD: &str = "description";

/// Create user routes
///
/// Needs the state up front to mount the authentication gate.
pub fn user_routes(state: AppState) -> Router<AppState> {
    let upload_limit = state.storage().max_file_size() as usize + MULTIPART_OVERHEAD;

    let admin = Router::new()
        .route("/", get(list_users))
        .route_layer(middleware::from_fn(require_admin));

    let owner = Router::new()
        .route("/:uuid", get(get_user))
        .route(
            "/:uuid/files",
            get(list_files)
                .post(upload_file)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/:uuid/files/:file_uuid/download", get(download_file))
        .route_layer(middleware::from_fn(require_self_or_admin));

    admin
        .merge(owner)
        .route_layer(middleware::from_fn_with_state(state, authenticate))
}

fn parse_uuid(raw: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation(format!("Invalid {} uuid", what)))
}

/// GET /users (admin only)
async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = UserService::list_users(state.db()).await?;
    Ok(Json(users))
}

/// GET /users/:uuid
async fn get_user(
    State(state): State<AppState>,
    Path(user_uuid): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user_uuid = parse_uuid(&user_uuid, "user")?;
    let user = UserService::get_user(state.db(), user_uuid).await?;
    Ok(Json(user))
}

/// GET /users/:uuid/files
async fn list_files(
    State(state): State<AppState>,
    Path(user_uuid): Path<String>,
) -> ApiResult<Json<Vec<FileResponse>>> {
    let user_uuid = parse_uuid(&user_uuid, "user")?;
    let files = FileService::list_files(state.db(), user_uuid).await?;
    Ok(Json(files))
}

/// POST /users/:uuid/files
///
/// Multipart body with a single `file` part and an optional `description`
/// text part. The file is streamed to disk before the record is written;
/// if the record cannot be written the file is removed again.
async fn upload_file(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_uuid): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<FileResponse>)> {
    let multipart = multipart.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "Rejected upload body");
        ApiError::BadRequest("Expected a multipart/form-data body".to_string())
    })?;
    let user_uuid = parse_uuid(&user_uuid, "user")?;
    FileService::ensure_user_exists(state.db(), user_uuid).await?;

    let (stored, description) = receive_upload(state.storage(), user_uuid, multipart).await?;

    match FileService::record_upload(state.db(), user_uuid, &stored, description).await {
        Ok(file) => {
            info!(
                actor = %identity.user_uuid,
                owner = %user_uuid,
                file = %file.uuid,
                "Upload accepted"
            );
            Ok((StatusCode::CREATED, Json(file)))
        }
        Err(e) => {
            state.storage().remove(&stored.relative_path).await;
            Err(e)
        }
    }
}

/// GET /users/:uuid/files/:file_uuid/download
async fn download_file(
    State(state): State<AppState>,
    identity: Identity,
    Path((user_uuid, file_uuid)): Path<(String, String)>,
) -> ApiResult<Response> {
    let user_uuid = parse_uuid(&user_uuid, "user")?;
    let file_uuid = parse_uuid(&file_uuid, "file")?;

    let record = FileService::find_file(state.db(), user_uuid, file_uuid).await?;

    let (file, len) = state
        .storage()
        .open(&record.filepath)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| {
            warn!(file = %record.uuid, path = %record.filepath, "File record without file on disk");
            ApiError::NotFound("File not found on disk".to_string())
        })?;

    let name = storage::original_name(&record.filename);
    info!(actor = %identity.user_uuid, file = %record.uuid, bytes = len, "Serving download");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        )
        .header(header::CONTENT_LENGTH, len)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Response build failed: {}", e)))
}

fn multipart_error(e: MultipartError, limit: u64) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        upload_error(UploadError::TooLarge { limit })
    } else {
        debug!(reason = %e.body_text(), "Malformed multipart body");
        ApiError::BadRequest(MALFORMED_MULTIPART.to_string())
    }
}

fn upload_error(e: UploadError) -> ApiError {
    match e {
        UploadError::TooLarge { .. } => ApiError::PayloadTooLarge(e.to_string()),
        UploadError::Io(e) => ApiError::Internal(e.into()),
    }
}

/// Read the multipart body, streaming the file part into storage
///
/// On any failure nothing is left behind on disk.
async fn receive_upload(
    storage: &FileStorage,
    user_uuid: Uuid,
    mut multipart: Multipart,
) -> ApiResult<(StoredFile, Option<String>)> {
    let limit = storage.max_file_size();
    let mut stored: Option<StoredFile> = None;
    let mut description: Option<String> = None;

    let result = async {
        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, limit))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);

            match (name.as_str(), file_name) {
                (FILE_FIELD, Some(file_name)) => {
                    if stored.is_some() {
                        return Err(ApiError::BadRequest("Too many files".to_string()));
                    }

                    let mut upload = storage
                        .begin_upload(user_uuid, &file_name)
                        .await
                        .map_err(upload_error)?;

                    loop {
                        let chunk = match field.chunk().await {
                            Ok(Some(chunk)) => chunk,
                            Ok(None) => break,
                            Err(e) => {
                                upload.abort().await;
                                return Err(multipart_error(e, limit));
                            }
                        };
                        if let Err(e) = upload.write_chunk(&chunk).await {
                            upload.abort().await;
                            return Err(upload_error(e));
                        }
                    }

                    stored = Some(upload.finish().await.map_err(upload_error)?);
                }
                (DESCRIPTION_FIELD, None) => {
                    let text = field.text().await.map_err(|e| multipart_error(e, limit))?;
                    description = Some(text);
                }
                (_, Some(_)) => {
                    return Err(ApiError::BadRequest("Unexpected file field".to_string()));
                }
                // Unknown text fields are ignored
                (_, None) => {}
            }
        }
        Ok::<(), ApiError>(())
    }
    .await;

    match (result, stored) {
        (Ok(()), Some(stored)) => Ok((stored, description)),
        (Ok(()), None) => Err(ApiError::BadRequest("No file uploaded".to_string())),
        (Err(e), stored) => {
            if let Some(stored) = stored {
                storage.remove(&stored.relative_path).await;
            }
            Err(e)
        }
    }
}
