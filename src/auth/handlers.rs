use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, PublicGuest, RefreshRequest, RegisterRequest,
            UpdateProfileRequest,
        },
        repo::Guest,
        services::{hash_password, is_valid_email, verify_password, AuthGuest, JwtKeys},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).put(update_me))
}

fn public(guest: Guest) -> PublicGuest {
    PublicGuest {
        id: guest.guest_id,
        email: guest.email,
        first_name: guest.first_name,
        last_name: guest.last_name,
        phone: guest.phone,
        birth_date: guest.birth_date,
        gender: guest.gender,
    }
}

fn token_pair(keys: &JwtKeys, guest_id: i32) -> Result<(String, String), ApiError> {
    let access = keys.sign_access(guest_id)?;
    let refresh = keys.sign_refresh(guest_id)?;
    Ok((access, refresh))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(ApiError::Validation("Name must not be empty".into()));
    }

    // Email uniqueness lives here, not in the schema.
    if Guest::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let guest = Guest::create(
        &state.db,
        &payload.email,
        &hash,
        payload.first_name.trim(),
        payload.last_name.trim(),
        payload.phone.trim(),
    )
    .await?;

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = token_pair(&keys, guest.guest_id)?;

    info!(guest_id = %guest.guest_id, email = %guest.email, "guest registered");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        guest: public(guest),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    // Unknown email and wrong password answer identically.
    let Some(guest) = Guest::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &guest.password_hash)? {
        warn!(guest_id = %guest.guest_id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = token_pair(&keys, guest.guest_id)?;

    info!(guest_id = %guest.guest_id, email = %guest.email, "guest logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        guest: public(guest),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let guest = Guest::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Guest not found".into()))?;

    let (access_token, refresh_token) = token_pair(&keys, guest.guest_id)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        guest: public(guest),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthGuest(guest_id): AuthGuest,
) -> Result<Json<PublicGuest>, ApiError> {
    let guest = Guest::find_by_id(&state.db, guest_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Guest not found".into()))?;
    Ok(Json(public(guest)))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthGuest(guest_id): AuthGuest,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicGuest>, ApiError> {
    let guest = Guest::update_profile(&state.db, guest_id, &payload)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Guest not found".into()))?;
    info!(guest_id = %guest.guest_id, "profile updated");
    Ok(Json(public(guest)))
}
