use crate::error::{ApiError, Result};
use crate::model::{ApiResponse, CreateLinkRequest, LinkResponse, UpdateLinkRequest};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use waypoint_core::{LinkUpdate, NewLink, ShortCode};

pub async fn list_links_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LinkResponse>>>> {
    let records = state.repository().list().await?;
    let links = records
        .into_iter()
        .map(|record| LinkResponse::from_record(record, state.base_url()))
        .collect();

    Ok(Json(ApiResponse::data(links)))
}

pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LinkResponse>>)> {
    let code = ShortCode::new(&request.short_code)?;
    validate_target_url(&request.target_url)?;
    if request.name.trim().is_empty() {
        return Err(ApiError::Validation("link name cannot be empty".to_string()));
    }

    let record = state
        .repository()
        .insert(NewLink {
            short_code: code,
            name: request.name,
            target_url: request.target_url,
            description: request.description,
        })
        .await?;

    info!(short_code = %record.short_code, "link created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(LinkResponse::from_record(
            record,
            state.base_url(),
        ))),
    ))
}

pub async fn get_link_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<LinkResponse>>> {
    let code = ShortCode::new(&short_code)?;
    let record = state
        .repository()
        .get(&code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("link not found: {short_code}")))?;

    Ok(Json(ApiResponse::data(LinkResponse::from_record(
        record,
        state.base_url(),
    ))))
}

pub async fn update_link_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateLinkRequest>,
) -> Result<Json<ApiResponse<LinkResponse>>> {
    let code = ShortCode::new(&short_code)?;
    if let Some(target_url) = &request.target_url {
        validate_target_url(target_url)?;
    }

    let record = state
        .repository()
        .update(
            &code,
            LinkUpdate {
                name: request.name,
                target_url: request.target_url,
                description: request.description,
                is_active: request.is_active,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("link not found: {short_code}")))?;

    info!(short_code = %record.short_code, "link updated");
    Ok(Json(ApiResponse::data(LinkResponse::from_record(
        record,
        state.base_url(),
    ))))
}

pub async fn delete_link_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    let code = ShortCode::new(&short_code)?;
    let deleted = state.repository().delete(&code).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("link not found: {short_code}")));
    }

    info!(short_code = %code, "link deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Validates that the URL has a valid format (has a scheme and host).
fn validate_target_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(ApiError::Validation("URL cannot be empty".to_string()));
    }

    // Basic validation: check for scheme and host presence
    // A valid URL should have "://" and something after it
    let parts: Vec<&str> = url.split("://").collect();
    if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ApiError::Validation(format!(
            "URL must have a valid scheme and host: {}",
            url
        )));
    }

    let scheme = parts[0].to_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(ApiError::Validation(format!(
            "URL scheme must be http or https: {}",
            scheme
        )));
    }

    Ok(())
}
