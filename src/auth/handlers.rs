use axum::{
    extract::{DefaultBodyLimit, FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    error::ApiError,
    media::decode_base64_upload,
    state::AppState,
    users::{
        dto::PublicUser,
        repo::{NewDocument, User},
    },
};

use super::{
    dto::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
    jwt::{AuthUser, JwtKeys},
    password::{hash_password, verify_password},
};

const DEFAULT_DOCUMENT_NAME: &str = "foto.png";
const DEFAULT_DOCUMENT_MIME: &str = "image/png";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Strip formatting characters from a phone number and parse the digits.
/// Rejects numbers with fewer than ten digits.
fn normalize_phone(raw: &str) -> Result<i64, ApiError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = digits.trim_start_matches('0');
    if digits.len() < 10 {
        return Err(ApiError::validation("Invalid phone number"));
    }
    digits
        .parse::<i64>()
        .map_err(|_| ApiError::validation("Invalid phone number"))
}

fn validate_register(payload: &RegisterRequest) -> Result<(), ApiError> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.phone_number.is_empty()
        || payload.password.is_empty()
        || payload.confirm_password.is_empty()
    {
        return Err(ApiError::validation("All fields are required"));
    }
    if payload.password != payload.confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }
    if payload.document.is_empty() {
        return Err(ApiError::validation("Identity document is required"));
    }
    if !is_valid_email(payload.email.trim()) {
        return Err(ApiError::validation("Invalid email"));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    validate_register(&payload)?;

    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();
    let phone_number = normalize_phone(&payload.phone_number)?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::conflict("Email already in use"));
    }
    if User::find_by_phone(&state.db, phone_number).await?.is_some() {
        warn!(phone_number, "phone number already registered");
        return Err(ApiError::conflict("Phone number already registered"));
    }

    let document = decode_base64_upload(&payload.document)?;
    let mime_type = document
        .mime_type
        .as_deref()
        .unwrap_or(DEFAULT_DOCUMENT_MIME);
    let hash = hash_password(&payload.password)?;

    let user = User::create_with_document(
        &state.db,
        name,
        &email,
        phone_number,
        &hash,
        NewDocument {
            name: DEFAULT_DOCUMENT_NAME,
            mime_type,
            data: &document.bytes,
        },
    )
    .await?;

    info!(user_id = user.id, %email, "user registered");
    Ok((StatusCode::CREATED, Json(PublicUser::from_user(user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Please fill in all fields"));
    }

    // Unknown email and wrong password answer identically.
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| {
            warn!(%email, "login unknown email");
            ApiError::unauthorized("Invalid credentials")
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse {
        access_token,
        user_id: user.id,
    }))
}

/// Acknowledges logout. Tokens are not revoked server-side; they remain
/// valid until natural expiry.
#[instrument]
pub async fn logout(AuthUser(user_id): AuthUser) -> Json<MessageResponse> {
    info!(user_id, "user logged out");
    Json(MessageResponse {
        message: "Logout successful".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> RegisterRequest {
        RegisterRequest {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone_number: "(11) 98888-7777".into(),
            password: "hunter2".into(),
            confirm_password: "hunter2".into(),
            document: "aGVsbG8=".into(),
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(validate_register(&valid_payload()).is_ok());
    }

    #[test]
    fn missing_fields_are_rejected() {
        for strip in ["name", "email", "phone", "password", "confirm"] {
            let mut p = valid_payload();
            match strip {
                "name" => p.name.clear(),
                "email" => p.email.clear(),
                "phone" => p.phone_number.clear(),
                "password" => p.password.clear(),
                _ => p.confirm_password.clear(),
            }
            let err = validate_register(&p).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "field: {strip}");
        }
    }

    #[test]
    fn password_mismatch_is_rejected() {
        let mut p = valid_payload();
        p.confirm_password = "other".into();
        assert!(matches!(
            validate_register(&p).unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn short_password_is_rejected() {
        let mut p = valid_payload();
        p.password = "12345".into();
        p.confirm_password = "12345".into();
        assert!(validate_register(&p).is_err());
    }

    #[test]
    fn missing_document_is_rejected() {
        let mut p = valid_payload();
        p.document.clear();
        assert!(validate_register(&p).is_err());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut p = valid_payload();
        p.email = "not-an-email".into();
        assert!(validate_register(&p).is_err());
    }

    #[test]
    fn phone_normalization_strips_formatting() {
        assert_eq!(normalize_phone("(11) 98888-7777").unwrap(), 11988887777);
        assert_eq!(normalize_phone("+55 11 98888 7777").unwrap(), 5511988887777);
    }

    #[test]
    fn phone_with_too_few_digits_is_rejected() {
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("abc-def").is_err());
    }
}
