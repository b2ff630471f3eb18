use crate::error::{ApiError, Result};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Redirect;
use waypoint_core::ShortCode;

/// Resolves a short code and redirects to its target.
///
/// Unknown, invalid and inactive codes are all a plain 404; the
/// redirect path leaks nothing about why a code does not resolve.
pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let Ok(code) = ShortCode::new(&short_code) else {
        return Err(ApiError::NotFound(format!("unknown link: {short_code}")));
    };

    let record = state
        .repository()
        .get(&code)
        .await?
        .filter(|record| record.is_active)
        .ok_or_else(|| ApiError::NotFound(format!("unknown link: {short_code}")))?;

    Ok(Redirect::temporary(&record.target_url))
}
