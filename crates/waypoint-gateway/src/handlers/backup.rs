use crate::error::{ApiError, Result};
use crate::model::{ApiResponse, CleanResponse, DeleteBackupResponse, RestoreRequest};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;
use waypoint_vault::{BackupList, RestoreOutcome, Snapshot};

pub async fn create_backup_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Snapshot>>)> {
    let snapshot = state.engine().create_backup().await?;

    info!(filename = %snapshot.filename, "backup created by operator");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(snapshot, "backup created")),
    ))
}

pub async fn list_backups_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BackupList>>> {
    let list = state.engine().backup_list().await?;
    Ok(Json(ApiResponse::data(list)))
}

pub async fn restore_backup_handler(
    State(state): State<AppState>,
    Json(request): Json<RestoreRequest>,
) -> Result<Json<ApiResponse<RestoreOutcome>>> {
    if request.filename.is_empty() {
        return Err(ApiError::Validation(
            "backup filename is required".to_string(),
        ));
    }

    let outcome = state.engine().restore_backup(&request.filename).await?;

    info!(filename = %request.filename, "backup restored by operator");
    let message = outcome.message.clone();
    Ok(Json(ApiResponse::with_message(outcome, message)))
}

pub async fn delete_backup_handler(
    Path(filename): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DeleteBackupResponse>>> {
    state.engine().delete_backup(&filename).await?;

    info!(filename = %filename, "backup deleted by operator");
    Ok(Json(ApiResponse::with_message(
        DeleteBackupResponse { filename },
        "backup deleted",
    )))
}

/// Streams the snapshot bytes as an attachment.
///
/// The engine only resolves the artifact path; the copy out happens
/// here, at the HTTP boundary.
pub async fn download_backup_handler(
    Path(filename): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let path = state.engine().download_backup(&filename).await?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to read backup '{filename}': {e}")))?;

    info!(filename = %filename, size = bytes.len(), "backup downloaded");
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

pub async fn clean_backups_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CleanResponse>>> {
    let report = state.engine().clean_old_backups().await?;

    info!(deleted = report.deleted, "retention prune run by operator");
    Ok(Json(ApiResponse::with_message(
        CleanResponse {
            deleted: report.deleted,
        },
        format!("removed {} expired backup(s)", report.deleted),
    )))
}
