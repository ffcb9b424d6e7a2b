//! Signed-token codec (HS512 compact JWT).
//!
//! Pure encode/decode over a symmetric key; no state beyond the key
//! material, which is derived once at startup from the base64-encoded
//! `JWT_SECRET` and read-only afterwards.
//!
//! Decode failures come back as a tagged `DecodeError` instead of a typed
//! exception hierarchy, so callers can pattern-match. `Expired` carries the
//! parsed claims: an expired-but-genuine token still identifies who it was
//! issued to.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::{error::Error as StdError, fmt};

/// Claim set carried by issued tokens.
///
/// Wire format (claim keys) is fixed for compatibility with previously
/// issued tokens:
/// - `sub`: principal identifier (access tokens only)
/// - `auth`: comma-joined authority names (access tokens only)
/// - `exp`: absolute expiry, epoch seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    pub exp: i64,
}

#[derive(Debug)]
pub enum DecodeError {
    /// Signature does not verify (tampered token or wrong key).
    BadSignature,
    /// Not a well-formed compact JWT.
    Malformed,
    /// Signature is valid but `exp` is in the past. The parsed claims are
    /// retained so callers can still see who the token belonged to.
    Expired(Claims),
    /// Structurally valid token signed with an algorithm we do not accept.
    UnsupportedVariant,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadSignature => write!(f, "invalid token signature"),
            Self::Malformed => write!(f, "malformed token"),
            Self::Expired(_) => write!(f, "expired token"),
            Self::UnsupportedVariant => write!(f, "unsupported token variant"),
        }
    }
}

impl StdError for DecodeError {}

/// HS512 codec shared read-only by the issuer and the verifier.
#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("JwtCodec")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtCodec {
    /// Build the codec from the base64-encoded symmetric secret.
    ///
    /// A malformed secret is a startup-time configuration error; once this
    /// returns `Ok`, encoding cannot fail for key-related reasons.
    pub fn from_base64_secret(secret_base64: &str) -> Result<Self, base64::DecodeError> {
        let key_bytes = BASE64.decode(secret_base64)?;

        let mut validation = Validation::new(Algorithm::HS512);
        // Expiry is classified by `decode` itself so that expired tokens
        // still yield their claims.
        validation.validate_exp = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&key_bytes),
            decoding_key: DecodingKey::from_secret(&key_bytes),
            validation,
        })
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        let header = Header::new(Algorithm::HS512);
        jsonwebtoken::encode(&header, claims, &self.encoding_key)
    }

    /// Verify signature and structure, then classify expiry.
    pub fn decode(&self, token: &str) -> Result<Claims, DecodeError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(classify)?;

        let claims = data.claims;
        if claims.exp < Utc::now().timestamp() {
            return Err(DecodeError::Expired(claims));
        }

        Ok(claims)
    }
}

fn classify(e: jsonwebtoken::errors::Error) -> DecodeError {
    use jsonwebtoken::errors::ErrorKind;

    match e.kind() {
        ErrorKind::InvalidSignature => DecodeError::BadSignature,
        ErrorKind::InvalidAlgorithm => DecodeError::UnsupportedVariant,
        // InvalidToken / Base64 / Json / Utf8 / missing claims: not a token
        // this codec ever issued.
        _ => DecodeError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    fn test_codec() -> JwtCodec {
        let secret = BASE64.encode(b"a-64-byte-minimum-hmac-sha512-test-secret-0123456789-0123456789-");
        JwtCodec::from_base64_secret(&secret).expect("codec from test secret")
    }

    fn future_exp() -> i64 {
        Utc::now().timestamp() + 3600
    }

    #[test]
    fn round_trips_access_claims() {
        let codec = test_codec();
        let claims = Claims {
            sub: Some("alice".to_string()),
            auth: Some("ROLE_USER,ROLE_ADMIN".to_string()),
            exp: future_exp(),
        };

        let token = codec.encode(&claims).expect("encode");
        let decoded = codec.decode(&token).expect("decode");

        assert_eq!(decoded.sub.as_deref(), Some("alice"));
        assert_eq!(decoded.auth.as_deref(), Some("ROLE_USER,ROLE_ADMIN"));
        assert_eq!(decoded.exp, claims.exp);
    }

    #[test]
    fn omits_absent_claims_from_the_payload() {
        let codec = test_codec();
        let claims = Claims {
            sub: None,
            auth: None,
            exp: future_exp(),
        };

        let token = codec.encode(&claims).expect("encode");

        // Inspect the raw payload segment: `sub`/`auth` must not be present
        // at all, not just null.
        let payload_b64 = token.split('.').nth(1).expect("payload segment");
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .expect("base64url payload");
        let json: serde_json::Value = serde_json::from_slice(&payload).expect("payload json");

        assert!(json.get("sub").is_none());
        assert!(json.get("auth").is_none());
        assert!(json.get("exp").is_some());
    }

    #[test]
    fn rejects_tampered_signature_as_bad_signature() {
        let codec = test_codec();
        let claims = Claims {
            sub: Some("alice".to_string()),
            auth: Some("ROLE_USER".to_string()),
            exp: future_exp(),
        };
        let token = codec.encode(&claims).expect("encode");

        // Flip a character in the middle of the signature segment. The
        // final char only carries base64 trailing bits, so a flip there can
        // decode-fail as Malformed instead; a mid-segment flip is guaranteed
        // to alter actual signature bits.
        let sig_start = token.rfind('.').expect("signature segment") + 1;
        let mid = sig_start + (token.len() - sig_start) / 2;
        let mut tampered = token.clone().into_bytes();
        tampered[mid] = if tampered[mid] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).expect("ascii token");

        assert!(matches!(
            codec.decode(&tampered),
            Err(DecodeError::BadSignature)
        ));
    }

    #[test]
    fn rejects_garbage_as_malformed() {
        let codec = test_codec();

        assert!(matches!(
            codec.decode("not-a-token"),
            Err(DecodeError::Malformed)
        ));
        assert!(matches!(codec.decode(""), Err(DecodeError::Malformed)));
    }

    #[test]
    fn rejects_other_algorithms_as_unsupported() {
        let codec = test_codec();
        let claims = Claims {
            sub: Some("alice".to_string()),
            auth: Some("ROLE_USER".to_string()),
            exp: future_exp(),
        };

        // Same key, HS384 header: structurally fine, but not our variant.
        let secret = b"a-64-byte-minimum-hmac-sha512-test-secret-0123456789-0123456789-";
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("encode hs384");

        assert!(matches!(
            codec.decode(&token),
            Err(DecodeError::UnsupportedVariant)
        ));
    }

    #[test]
    fn expired_token_still_yields_its_claims() {
        let codec = test_codec();
        let claims = Claims {
            sub: Some("alice".to_string()),
            auth: Some("ROLE_USER".to_string()),
            exp: Utc::now().timestamp() - 60,
        };
        let token = codec.encode(&claims).expect("encode");

        match codec.decode(&token) {
            Err(DecodeError::Expired(recovered)) => {
                assert_eq!(recovered.sub.as_deref(), Some("alice"));
                assert_eq!(recovered.auth.as_deref(), Some("ROLE_USER"));
            }
            other => panic!("expected Expired, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_base64_secret_at_construction() {
        assert!(JwtCodec::from_base64_secret("***not base64***").is_err());
    }
}
