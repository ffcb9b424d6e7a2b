/*
 * Responsibility
 * - /user 系 handler (signup / login / me)
 * - Json を DTO で受け、validation → repo/service 呼び出し
 * - login は token pair を発行し、refresh token を user row に保存する
 */
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::AppendHeaders,
};
use tracing::{info, warn};

use crate::{
    api::v1::dto::{
        token::TokenResponse,
        users::{LoginRequest, SignUpRequest, UserResponse},
    },
    api::v1::extractors::AuthCtxExtractor,
    error::AppError,
    repos::user_repo::{self, Role},
    services::auth::{password, token_provider::AuthenticatedUser},
    state::AppState,
};

/// Response headers carrying the token pair on login (wire compatibility
/// with the existing frontend).
const ACCESS_TOKEN_HEADER: &str = "auth";
const REFRESH_TOKEN_HEADER: &str = "refresh";

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, &'static str), AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_PARAMETER", m))?;

    if user_repo::exists_by_username(&state.db, &req.id).await? {
        info!(id = %req.id, "signup rejected: duplicate id");
        return Err(AppError::conflict("DUPLICATE_ID", "id already exists"));
    }
    if user_repo::exists_by_email(&state.db, &req.email).await? {
        info!("signup rejected: duplicate email");
        return Err(AppError::conflict("DUPLICATE_EMAIL", "email already exists"));
    }
    if user_repo::exists_by_nickname(&state.db, &req.nickname).await? {
        info!("signup rejected: duplicate nickname");
        return Err(AppError::conflict(
            "DUPLICATE_NICKNAME",
            "nickname already exists",
        ));
    }

    let password_hash = password::hash_password(&req.pw)?;

    user_repo::create(
        &state.db,
        &req.id,
        &password_hash,
        &req.email,
        &req.nickname,
        Role::User,
        req.phone.as_deref(),
    )
    .await?;

    info!(id = %req.id, "signup completed");
    Ok((StatusCode::OK, "SUCCESS"))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<
    (
        AppendHeaders<[(&'static str, String); 2]>,
        Json<TokenResponse>,
    ),
    AppError,
> {
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_PARAMETER", m))?;

    let user = user_repo::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| {
            info!(username = %req.username, "login rejected: unknown user");
            AppError::Unauthorized
        })?;

    if !password::verify_password(&req.pw, &user.user_pw) {
        warn!(username = %req.username, "login rejected: password mismatch");
        return Err(AppError::Unauthorized);
    }

    let identity = AuthenticatedUser {
        principal: user.username.clone(),
        authorities: vec![user.authority()],
    };

    let pair = state.tokens.issue_for_identity(&identity)?;

    // Persist the refresh token against the user record. The token layer
    // itself never touches storage.
    user_repo::save_refresh_token(&state.db, user.uid, &pair.refresh_token).await?;

    info!(username = %user.username, "login succeeded, token pair issued");

    let headers = AppendHeaders([
        (ACCESS_TOKEN_HEADER, pair.access_token.clone()),
        (REFRESH_TOKEN_HEADER, pair.refresh_token.clone()),
    ]);

    Ok((headers, Json(TokenResponse::from(pair))))
}

pub async fn me(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<UserResponse>, AppError> {
    let user = user_repo::find_by_username(&state.db, &ctx.principal)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(UserResponse {
        uid: user.uid,
        username: user.username,
        email: user.email,
        nickname: user.nickname,
        role: user.role,
        phone: user.phone,
    }))
}
