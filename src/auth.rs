use crate::{
    config::AppConfig,
    error::ApiError,
    jwks::{self, JwksError, KeySet},
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, Validation, decode, decode_header, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fmt, sync::Arc};

/// The only signing algorithm accepted on access tokens.
pub const ALGORITHM: Algorithm = Algorithm::RS256;

/// Claims
///
/// The verified payload of an access token. `permissions` is kept apart because the gate
/// reads it; every other claim (`aud`, `iat`, `azp`, `scope`, ...) lands in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: u64,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Handlers behind the permission gate receive the verified claims as an argument.
///
/// Rejection: the generic 401 envelope when no gate ran for this route.
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// AuthError
///
/// Classified authorization failure. It owns its HTTP status, a stable machine code and a
/// human description; the envelope exposes the status and the description.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthError {
    pub status: StatusCode,
    pub code: &'static str,
    pub description: String,
}

impl AuthError {
    fn new(status: StatusCode, code: &'static str, description: &str) -> Self {
        Self {
            status,
            code,
            description: description.to_string(),
        }
    }

    pub fn header_missing() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "authorization_header_missing",
            "Authorization header is expected.",
        )
    }

    pub fn invalid_header(description: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "invalid_header", description)
    }

    pub fn unparsable_token() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_header",
            "Unable to parse authentication token.",
        )
    }

    pub fn token_expired() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "token_expired", "Token expired.")
    }

    pub fn invalid_claims() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "invalid_claims",
            "Incorrect claims. Please, check the audience and issuer.",
        )
    }

    pub fn permissions_missing() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_claims",
            "Permissions not included in JWT.",
        )
    }

    pub fn permission_not_found() -> Self {
        Self::new(StatusCode::FORBIDDEN, "unauthorized", "Permission not found.")
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.description)
    }
}

/// bearer_token
///
/// Pulls the raw token out of `Authorization: Bearer <token>`. The scheme is matched
/// case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = match headers.get(header::AUTHORIZATION) {
        None => return Err(AuthError::header_missing()),
        Some(value) => value
            .to_str()
            .map_err(|_| AuthError::invalid_header("Authorization header is not valid text."))?,
    };

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [] => Err(AuthError::header_missing()),
        [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => Err(AuthError::invalid_header(
            "Authorization header must start with \"Bearer\".",
        )),
        [_] => Err(AuthError::invalid_header("Token not found.")),
        [_, token] => Ok(*token),
        _ => Err(AuthError::invalid_header(
            "Authorization header must be bearer token.",
        )),
    }
}

/// check_permissions
///
/// Exact string membership; no wildcards, no hierarchy.
pub fn check_permissions(permission: &str, claims: &Claims) -> Result<(), AuthError> {
    let granted = claims
        .permissions
        .as_ref()
        .ok_or_else(AuthError::permissions_missing)?;

    if granted.iter().any(|p| p == permission) {
        Ok(())
    } else {
        Err(AuthError::permission_not_found())
    }
}

/// TokenVerifier
///
/// Verifies RS256 access tokens against the identity provider's key set, which is fetched once
/// at startup and never mutated afterwards.
pub struct TokenVerifier {
    issuer: String,
    audience: String,
    keys: KeySet,
}

impl TokenVerifier {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>, keys: KeySet) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            keys,
        }
    }

    /// Builds a verifier for the configured tenant by downloading its published keys.
    pub async fn discover(config: &AppConfig) -> Result<Self, JwksError> {
        Self::from_jwks_url(config.issuer(), config.api_audience.clone(), &config.jwks_url()).await
    }

    pub async fn from_jwks_url(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        jwks_url: &str,
    ) -> Result<Self, JwksError> {
        let client = reqwest::Client::new();
        let keys = jwks::fetch(&client, jwks_url).await?;
        Ok(Self::new(issuer, audience, keys))
    }

    /// verify
    ///
    /// Steps, each with its own failure:
    /// 1. header decodes and names a `kid`,
    /// 2. the `kid` is in the key set,
    /// 3. signature, expiry, audience and issuer check out.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::unparsable_token())?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::invalid_header("Authorization malformed."))?;

        let key = self
            .keys
            .get(&kid)
            .ok_or_else(|| AuthError::invalid_header("Unable to find the appropriate key."))?;

        let mut validation = Validation::new(ALGORITHM);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);

        decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::token_expired(),
                ErrorKind::InvalidAudience
                | ErrorKind::InvalidIssuer
                | ErrorKind::MissingRequiredClaim(_) => AuthError::invalid_claims(),
                ErrorKind::InvalidSignature => {
                    AuthError::invalid_header("Unable to verify token signature.")
                }
                _ => AuthError::unparsable_token(),
            })
    }
}

/// PermissionGate
///
/// State of one gated route: the permission it demands and the shared verifier.
#[derive(Clone)]
pub struct PermissionGate {
    pub permission: &'static str,
    pub verifier: Arc<TokenVerifier>,
}

/// require_permission
///
/// Route middleware: verify the bearer token, demand the gate's permission, then hand the
/// claims to the handler through the request extensions.
pub async fn require_permission(
    State(gate): State<PermissionGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_token(request.headers())
        .and_then(|token| gate.verifier.verify(token))
        .and_then(|claims| check_permissions(gate.permission, &claims).map(|_| claims))
        .map_err(|err| {
            tracing::warn!(permission = gate.permission, "authorization rejected: {}", err);
            err
        })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
