use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use tally_core::domain::url_host;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateWebsiteRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

fn tracking_snippet(public_url: &str) -> String {
    format!(
        "<script defer src=\"{public_url}/static/js/tracker.js\"></script>\n\
         <noscript><img src=\"{public_url}/api/track-noscript\" alt=\"\" width=\"1\" height=\"1\"></noscript>"
    )
}

/// `POST /api/websites`: register a website.
pub async fn create_website(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWebsiteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = req.name.trim();
    let url = req.url.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    if url.is_empty() {
        return Err(AppError::BadRequest("url is required".to_string()));
    }
    if url_host(url).is_none() {
        return Err(AppError::BadRequest("url must include a hostname".to_string()));
    }

    let website = state.store.add_website(name, url).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": {
                "id": website.id,
                "name": website.name,
                "url": website.url,
                "created_at": website.created_at,
                "tracking_snippet": tracking_snippet(&state.config.public_url),
            }
        })),
    ))
}

/// `GET /api/websites`
pub async fn list_websites(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let websites = state.store.list_websites().await?;
    Ok(Json(json!({ "data": websites })))
}

/// `DELETE /api/websites/{id}`: unregister a website. Its events are kept.
pub async fn delete_website(
    State(state): State<Arc<AppState>>,
    Path(website_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_website(&website_id).await? {
        return Err(AppError::NotFound("Website not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
