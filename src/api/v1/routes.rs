/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /user/any 以下は未認証で到達できる（signup/login）
 * - protected route は AuthCtxExtractor を受け取ることで 401 を返す
 *   （auth gate 自体はリクエストを落とさない）
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    health::health,
    users::{login, me, signup},
};
use crate::state::AppState;

/// Routes reachable without a bearer token, relative to the `/api/v1` nest
/// (the gate runs inside the nest, where the prefix is already stripped).
/// The gate still runs on them; route-level authorization simply never
/// consults the authentication context for these handlers. Kept as a table
/// so the bypass set is data, not logic baked into the gate.
pub const PUBLIC_PATHS: &[&str] = &["/health", "/user/any/signup", "/user/any/login"];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/user/any/signup", post(signup))
        .route("/user/any/login", post(login))
        .route("/user/me", get(me))
}
