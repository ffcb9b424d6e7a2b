/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware (auth gate) が検証して request extensions に格納し、
 *   handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証ロジックは services/auth 側の責務
 * - request extensions はリクエスト毎に新規なので、並行リクエスト間で
 *   identity が漏れることはない
 */

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `principal` はアクセストークンの `sub`（ここでは username）
/// - `authorities` は `ROLE_*` 形式の権限文字列（認可判断は下流の責務）
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub principal: String,
    pub authorities: Vec<String>,
}

impl AuthCtx {
    pub fn new(principal: String, authorities: Vec<String>) -> Self {
        Self {
            principal,
            authorities,
        }
    }
}
