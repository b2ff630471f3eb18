use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Refuses serving traffic while a restore is in progress.
///
/// Applied to the redirect path and the link CRUD API, not to the
/// backup admin surface: the operator must still be able to inspect
/// and manage backups while the gate is engaged.
pub async fn maintenance_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.gate().is_engaged() {
        return ApiError::Maintenance.into_response();
    }
    next.run(request).await
}
