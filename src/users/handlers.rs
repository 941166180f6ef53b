use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{error::ApiError, state::AppState};

use super::{
    dto::PublicUser,
    repo::{Document, User},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/get/:user_id", get(get_user))
        .route("/user/get/document/:user_id", get(get_user_document))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(PublicUser::from_user(user)))
}

/// Streams the stored document bytes with their original MIME type and an
/// inline disposition.
#[instrument(skip(state))]
pub async fn get_user_document(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Response, ApiError> {
    let doc = Document::find_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Document not found"))?;

    let headers = [
        (header::CONTENT_TYPE, doc.mime_type),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", doc.name),
        ),
    ];
    Ok((StatusCode::OK, headers, doc.data).into_response())
}
