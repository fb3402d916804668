use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{config::AppConfig, errors::ApiError};

/// Claims
///
/// The payload carried inside a signed bearer token. The issuing endpoint
/// accepts an arbitrary JSON object, so beyond the timestamps only `email`
/// is modeled explicitly (it is what the authorization checks key on);
/// everything else round-trips through `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Claims {
    /// The caller's email, when the issued payload carried one.
    pub email: Option<String>,
    /// Issued At (iat): timestamp when the token was signed.
    pub iat: usize,
    /// Expiration Time (exp): timestamp after which the token must not be accepted.
    pub exp: usize,
    /// Remaining issued payload fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// issue_token
///
/// Signs an arbitrary claims payload with the server secret. The payload must
/// be a JSON object; `iat` and `exp` are stamped in, with the expiry fixed at
/// `ttl_secs` from now. No other validation is performed on the claim shape.
pub fn issue_token(payload: Value, secret: &str, ttl_secs: i64) -> Result<String, ApiError> {
    let Value::Object(mut claims) = payload else {
        return Err(ApiError::bad_request("token payload must be a JSON object"));
    };

    let now = Utc::now().timestamp();
    claims.insert("iat".to_string(), Value::from(now));
    claims.insert("exp".to_string(), Value::from(now + ttl_secs));

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.to_string()))
}

/// verify_token
///
/// Decodes a token and validates its signature and expiry against the server
/// secret. Every failure mode (bad signature, malformed token, expired)
/// collapses into `Unauthorized`; the distinction is not surfaced to clients.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    // Ensure expiration time validation is always active.
    validation.validate_exp = true;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| ApiError::Unauthorized)
}

/// AuthClaims Extractor
///
/// The resolved identity of an authenticated request. Implements Axum's
/// FromRequestParts trait, making the decoded claims usable as a function
/// argument in any protected handler. A missing `Authorization` header, a
/// non-Bearer scheme, or a failed verification rejects the request with a
/// 401 before the handler body ever runs, so no handler can observe a
/// half-authenticated request.
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
    // Allows the extractor to pull the AppConfig (for the token secret).
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        // Token Extraction
        // Retrieve the Authorization header and ensure it is prefixed with "Bearer ".
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let claims = verify_token(token, &config.jwt_secret)?;

        Ok(AuthClaims(claims))
    }
}
