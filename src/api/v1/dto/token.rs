/*
 * Responsibility
 * - Login 成功時の token response DTO
 * - body は camelCase（既存クライアントとの wire 互換）
 */
use serde::Serialize;

use crate::services::auth::token_provider::TokenPair;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub grant_type: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch millis; mirrors the access token's `exp` so clients need not
    /// decode the token.
    pub access_token_expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            grant_type: pair.grant_type.to_string(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            access_token_expires_in: pair.access_token_expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_keys() {
        let res = TokenResponse {
            grant_type: "bearer".to_string(),
            access_token: "a.b.c".to_string(),
            refresh_token: "d.e.f".to_string(),
            access_token_expires_in: 1_700_000_000_000,
        };

        let json = serde_json::to_value(&res).expect("serialize");
        assert_eq!(json["grantType"], "bearer");
        assert_eq!(json["accessToken"], "a.b.c");
        assert_eq!(json["refreshToken"], "d.e.f");
        assert_eq!(json["accessTokenExpiresIn"], 1_700_000_000_000_i64);
    }
}
