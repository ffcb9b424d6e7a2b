/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は Arc/PgPool で cheap)
 */
use std::sync::Arc;

use sqlx::PgPool;

use crate::services::auth::TokenProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: Arc<TokenProvider>,
}

impl AppState {
    pub fn new(db: PgPool, tokens: Arc<TokenProvider>) -> Self {
        Self { db, tokens }
    }
}
