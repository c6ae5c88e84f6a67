use std::{
    fmt::Display,
    future::{ready, Ready},
    time::Duration,
};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 7);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Administrators can do everything a user can.
    pub fn grants(&self, required: &Role) -> bool {
        matches!((self, required), (Role::Admin, _) | (Role::User, Role::User))
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

/// The claims carried by an access token. Tokens are issued by the account service and signed with the shared
/// HS256 secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtClaims {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    pub fn new<S: Into<String>>(user_id: S, email: S, role: Role, lifetime: Duration) -> Self {
        let iat = Utc::now().timestamp();
        let exp = iat.saturating_add(i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX));
        Self { user_id: user_id.into(), email: email.into(), role, iat, exp }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.role.grants(role)
    }
}

/// Handlers that take `JwtClaims` as an argument get the claims that the JWT middleware verified and stored for the
/// request.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
            warn!("🔐️ No JWT claims found in request extensions. Is the route behind the JWT middleware?");
            ServerError::AuthenticationError(AuthError::MissingToken)
        });
        ready(claims)
    }
}

/// Reads the access token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

//----------------------------------------------   TokenVerifier  ----------------------------------------------------
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        match decode::<JwtClaims>(token, &self.key, &self.validation) {
            Ok(data) => {
                trace!("🔐️ Access token verified for {}", data.claims.user_id);
                Ok(data.claims)
            },
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => {
                    debug!("🔐️ Access token has expired");
                    Err(AuthError::TokenExpired)
                },
                _ => {
                    debug!("🔐️ Access token rejected. {e}");
                    Err(AuthError::InvalidToken(e.to_string()))
                },
            },
        }
    }
}

//----------------------------------------------   TokenIssuer  ------------------------------------------------------
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn sign(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.key).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))
    }

    /// Issues an access token for the user, valid for `lifetime` (seven days by default).
    pub fn issue_token(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        lifetime: Option<Duration>,
    ) -> Result<String, AuthError> {
        let claims = JwtClaims::new(user_id, email, role, lifetime.unwrap_or(DEFAULT_TOKEN_LIFETIME));
        self.sign(&claims)
    }
}
