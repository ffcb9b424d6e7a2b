//! Token issuance and verification on top of the HS512 codec.
//!
//! - Issuer: builds the access/refresh token pair at login. Access tokens
//!   carry `sub` + comma-joined `auth`; refresh tokens carry only `exp` and
//!   identify nobody.
//! - Verifier: boolean validity check for the request gate, plus claims ->
//!   identity extraction. The failure taxonomy is logged for observability
//!   but collapses to `false` for callers.
//!
//! Pure computation plus one clock read per issuance; persisting the refresh
//! token against the user row is the login handler's job.

use std::{error::Error as StdError, fmt, sync::Arc};

use chrono::{Duration, Utc};
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::services::auth::jwt::{Claims, DecodeError, JwtCodec};

const ACCESS_TOKEN_EXPIRE_SECONDS: i64 = 60 * 60;
const REFRESH_TOKEN_EXPIRE_SECONDS: i64 = 60 * 60 * 24 * 7;
const GRANT_TYPE_BEARER: &str = "bearer";

/// Token pair handed out at login.
///
/// `access_token_expires_in` duplicates the access token's `exp` (as epoch
/// millis) so clients need not decode the token to schedule a refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub grant_type: &'static str,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_in: i64,
}

/// Identity reconstructed from a verified access token.
///
/// Lives for one request; never persisted.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub principal: String,
    pub authorities: Vec<String>,
}

#[derive(Debug)]
pub enum AuthTokenError {
    Decode(DecodeError),
    /// Token passed signature checks but carries no `auth` claim. We never
    /// issue access tokens without authorities, so this is an integrity
    /// failure, not an ordinary credential failure.
    MissingAuthorities,
}

impl fmt::Display for AuthTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "token decode failed: {}", e),
            Self::MissingAuthorities => write!(f, "token has no authorities claim"),
        }
    }
}

impl StdError for AuthTokenError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::MissingAuthorities => None,
        }
    }
}

impl From<DecodeError> for AuthTokenError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

#[derive(Clone, Debug)]
pub struct TokenProvider {
    codec: Arc<JwtCodec>,
}

impl TokenProvider {
    pub fn new(codec: JwtCodec) -> Self {
        Self {
            codec: Arc::new(codec),
        }
    }

    /// Issue an access/refresh pair for an already-authenticated subject.
    ///
    /// `authorities` is the comma-joined authority list as it will appear in
    /// the `auth` claim.
    pub fn issue(&self, subject: &str, authorities: &str) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let access_expires_at = now + Duration::seconds(ACCESS_TOKEN_EXPIRE_SECONDS);
        let refresh_expires_at = now + Duration::seconds(REFRESH_TOKEN_EXPIRE_SECONDS);

        let access_claims = Claims {
            sub: Some(subject.to_string()),
            auth: Some(authorities.to_string()),
            exp: access_expires_at.timestamp(),
        };

        // Refresh tokens are expiry-bearing artifacts only: no subject, no
        // authorities.
        let refresh_claims = Claims {
            sub: None,
            auth: None,
            exp: refresh_expires_at.timestamp(),
        };

        let access_token = self.sign(&access_claims)?;
        let refresh_token = self.sign(&refresh_claims)?;

        Ok(TokenPair {
            grant_type: GRANT_TYPE_BEARER,
            access_token,
            refresh_token,
            access_token_expires_in: access_expires_at.timestamp_millis(),
        })
    }

    /// Convenience form: join the identity's authorities and issue.
    pub fn issue_for_identity(&self, user: &AuthenticatedUser) -> Result<TokenPair, AppError> {
        let authorities = user.authorities.join(",");
        self.issue(&user.principal, &authorities)
    }

    /// True only on a clean decode. Every failure branch is logged with its
    /// category; callers get a plain boolean.
    pub fn is_valid(&self, token: &str) -> bool {
        match self.codec.decode(token) {
            Ok(_) => {
                debug!("JWT validated");
                true
            }
            Err(DecodeError::BadSignature) => {
                warn!("invalid JWT signature");
                false
            }
            Err(DecodeError::Expired(_)) => {
                info!("expired JWT");
                false
            }
            Err(DecodeError::UnsupportedVariant) => {
                warn!("unsupported JWT variant");
                false
            }
            Err(DecodeError::Malformed) => {
                warn!("malformed JWT");
                false
            }
        }
    }

    /// Extract the authenticated identity from a token.
    ///
    /// Expired tokens still yield their claims: an expired credential no
    /// longer authenticates a request, but its subject stays readable for
    /// callers that need to know who it belonged to.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthTokenError> {
        let claims = match self.codec.decode(token) {
            Ok(claims) => claims,
            Err(DecodeError::Expired(claims)) => claims,
            Err(e) => return Err(AuthTokenError::Decode(e)),
        };

        let authorities_csv = claims.auth.ok_or(AuthTokenError::MissingAuthorities)?;

        let authorities = authorities_csv
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(AuthenticatedUser {
            principal: claims.sub.unwrap_or_default(),
            authorities,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        self.codec.encode(claims).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            AppError::Internal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;

    fn provider() -> TokenProvider {
        let secret = BASE64.encode(b"a-64-byte-minimum-hmac-sha512-test-secret-0123456789-0123456789-");
        let codec = JwtCodec::from_base64_secret(&secret).expect("codec from test secret");
        TokenProvider::new(codec)
    }

    #[test]
    fn issued_access_token_round_trips_identity() {
        let p = provider();
        let pair = p.issue("alice", "ROLE_USER,ROLE_ADMIN").expect("issue");

        assert!(p.is_valid(&pair.access_token));

        let user = p.authenticate(&pair.access_token).expect("authenticate");
        assert_eq!(user.principal, "alice");

        let mut authorities = user.authorities.clone();
        authorities.sort();
        assert_eq!(authorities, vec!["ROLE_ADMIN", "ROLE_USER"]);
    }

    #[test]
    fn issue_for_identity_joins_authorities() {
        let p = provider();
        let identity = AuthenticatedUser {
            principal: "alice".to_string(),
            authorities: vec!["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()],
        };

        let pair = p.issue_for_identity(&identity).expect("issue");
        let user = p.authenticate(&pair.access_token).expect("authenticate");

        let mut expected = identity.authorities.clone();
        expected.sort();
        let mut actual = user.authorities.clone();
        actual.sort();
        assert_eq!(actual, expected);
    }

    #[test]
    fn refresh_token_carries_no_identity() {
        let p = provider();
        let pair = p.issue("alice", "ROLE_USER").expect("issue");

        // Refresh token is valid but must not authenticate anyone.
        assert!(p.is_valid(&pair.refresh_token));
        assert!(matches!(
            p.authenticate(&pair.refresh_token),
            Err(AuthTokenError::MissingAuthorities)
        ));
    }

    #[test]
    fn expires_in_matches_the_one_hour_access_lifetime() {
        let p = provider();
        let before = Utc::now().timestamp_millis();
        let pair = p.issue("alice", "ROLE_USER").expect("issue");
        let after = Utc::now().timestamp_millis();

        let lifetime_millis = ACCESS_TOKEN_EXPIRE_SECONDS * 1000;
        assert!(pair.access_token_expires_in >= before + lifetime_millis);
        assert!(pair.access_token_expires_in <= after + lifetime_millis);
        assert_eq!(pair.grant_type, "bearer");
    }

    #[test]
    fn expired_access_token_fails_is_valid_but_still_identifies() {
        let p = provider();
        let expired = Claims {
            sub: Some("alice".to_string()),
            auth: Some("ROLE_USER".to_string()),
            exp: Utc::now().timestamp() - 1,
        };
        let token = p.codec.encode(&expired).expect("encode");

        assert!(!p.is_valid(&token));

        // Internal path: expired tokens still yield an identity.
        let user = p.authenticate(&token).expect("authenticate expired");
        assert_eq!(user.principal, "alice");
    }

    #[test]
    fn refresh_token_outlives_the_access_token() {
        let p = provider();
        let pair = p.issue("alice", "ROLE_USER").expect("issue");

        // Decode both and compare wire-level expirations directly.
        let access = p.codec.decode(&pair.access_token).expect("access claims");
        let refresh = p.codec.decode(&pair.refresh_token).expect("refresh claims");

        assert_eq!(
            refresh.exp - access.exp,
            REFRESH_TOKEN_EXPIRE_SECONDS - ACCESS_TOKEN_EXPIRE_SECONDS
        );
        assert!(refresh.sub.is_none());
        assert!(refresh.auth.is_none());
    }

    #[test]
    fn tampered_token_is_invalid() {
        let p = provider();
        let pair = p.issue("alice", "ROLE_USER").expect("issue");

        let mut tampered = pair.access_token.clone();
        let last = tampered.pop().expect("non-empty token");
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert!(!p.is_valid(&tampered));
    }

    #[test]
    fn token_without_authorities_is_an_integrity_error() {
        let p = provider();
        let claims = Claims {
            sub: Some("alice".to_string()),
            auth: None,
            exp: Utc::now().timestamp() + 3600,
        };
        let token = p.codec.encode(&claims).expect("encode");

        // Validity check passes (well-signed, unexpired) ...
        assert!(p.is_valid(&token));
        // ... but identity extraction must refuse it.
        assert!(matches!(
            p.authenticate(&token),
            Err(AuthTokenError::MissingAuthorities)
        ));
    }
}
