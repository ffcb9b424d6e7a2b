/*
 * Responsibility
 * - Bearer トークンの検証 (ヘッダ抽出 → 検証 → AuthCtx を extensions に載せる)
 * - この gate はリクエストを落とさない: 検証に失敗しても「未認証のまま」
 *   次へ渡すだけ。401 を返すかどうかは route 側（AuthCtxExtractor）の責務
 */
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, info, warn};

use crate::api::v1::PUBLIC_PATHS;
use crate::api::v1::extractors::AuthCtx;
use crate::state::AppState;

/// The scheme check is literal and case-sensitive; nothing but `Bearer` is
/// accepted.
const BEARER_PREFIX: &str = "Bearer ";

/// `/api/v1/*` 全体に auth gate を適用する。
///
/// 例：
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、
    // `from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

enum SkipReason {
    HeaderAbsent,
    SchemeMismatch,
}

fn resolve_token(header_value: Option<&str>) -> Result<&str, SkipReason> {
    let value = header_value.ok_or(SkipReason::HeaderAbsent)?;
    value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(SkipReason::SchemeMismatch)
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match resolve_token(auth_header.as_deref()) {
        Ok(token) => {
            if state.tokens.is_valid(token) {
                match state.tokens.authenticate(token) {
                    Ok(user) => {
                        info!(principal = %user.principal, %path, "authenticated request");
                        // extensions はリクエスト毎に新規: ここに入れた
                        // identity が他のリクエストから見えることはない
                        req.extensions_mut()
                            .insert(AuthCtx::new(user.principal, user.authorities));
                    }
                    Err(err) => {
                        // A token that validates but yields no identity was
                        // never issued by us.
                        warn!(error = %err, %path, "valid token without usable identity");
                    }
                }
            } else {
                // is_valid already logged the failure category.
                info!(%path, "no valid JWT in request");
            }
        }
        Err(SkipReason::HeaderAbsent) => {
            if PUBLIC_PATHS.contains(&path.as_str()) {
                debug!(%path, "no bearer token on public path");
            } else {
                info!(%path, "no Authorization header");
            }
        }
        Err(SkipReason::SchemeMismatch) => {
            info!(%path, "Authorization header is not a Bearer token");
        }
    }

    // 成否に関わらず必ず次へ。最終的な accept/reject は route 側の判断。
    next.run(req).await
}
