use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::AuthUser,
    error::ApiError,
    media::decode_base64_upload,
    state::AppState,
    users::repo::User,
};

use super::{
    dto::{CreateServiceRequest, ServiceResponse},
    repo::{Service, ServiceDetails},
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/service/get/all", get(get_all_services))
        .route("/service/get/:service_id", get(get_service))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/service/post/:user_id", post(create_service))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}

#[instrument(skip(state, payload))]
pub async fn create_service(
    State(state): State<AppState>,
    AuthUser(auth_id): AuthUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceResponse>), ApiError> {
    // Authorization, not authentication: the token must belong to the path user.
    if auth_id != user_id {
        return Err(ApiError::Forbidden);
    }

    let title = payload.title.trim();
    let description = payload.description.trim();
    if title.is_empty()
        || description.is_empty()
        || payload.time_chronos.is_none()
        || payload.service_image.is_empty()
    {
        return Err(ApiError::validation(
            "Title, description, time in Chronos and image are required",
        ));
    }
    let time_chronos = payload.time_chronos.unwrap_or_default();
    if time_chronos < 0 {
        return Err(ApiError::validation("Time in Chronos must be non-negative"));
    }

    let owner = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let image = decode_base64_upload(&payload.service_image)?;
    let category_names: Vec<String> = payload
        .category_entities
        .iter()
        .map(|c| c.name.clone())
        .collect();

    let (service, categories) = Service::create(
        &state.db,
        user_id,
        title,
        description,
        time_chronos,
        &image.bytes,
        &category_names,
    )
    .await?;

    info!(service_id = service.id, user_id, "service created");
    let details = ServiceDetails {
        service,
        owner,
        categories,
    };
    Ok((
        StatusCode::CREATED,
        Json(ServiceResponse::from_details(details)),
    ))
}

#[instrument(skip(state))]
pub async fn get_service(
    State(state): State<AppState>,
    Path(service_id): Path<i64>,
) -> Result<Json<ServiceResponse>, ApiError> {
    let details = Service::find_by_id(&state.db, service_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;
    Ok(Json(ServiceResponse::from_details(details)))
}

#[instrument(skip(state))]
pub async fn get_all_services(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<Vec<ServiceResponse>>, ApiError> {
    let all = Service::list_all(&state.db).await?;
    let items = all.into_iter().map(ServiceResponse::from_details).collect();
    Ok(Json(items))
}
