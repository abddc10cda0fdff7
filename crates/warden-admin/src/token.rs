//! Token handshake.
//!
//! 1. The caller proves possession of its api secret by sending
//!    `sha256_hex(user_id + api_secret)` ([`encode_token_request`]).
//! 2. [`issue`] answers with an HS256 token whose signing key is the user id
//!    followed by the process token key, so a token is only valid for the
//!    user it was minted for.
//! 3. Later requests present `Bearer <token>`; [`validate`] checks it
//!    against the resolved [`Session`].

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use warden_crypto::aead::Key;
use warden_crypto::digest::{digest_eq, sha256_hex};
use zeroize::Zeroizing;

use crate::session::{AuthError, Session};
use crate::state::AppState;

/// Header carrying the proof of possession.
pub const TOKEN_REQUEST_HEADER: &str = "X-Warden-Token-Request";
/// Header carrying the bearer token.
pub const AUTHORIZATION: &str = "Authorization";
/// Scheme prefix of the authorization header value.
pub const SCHEME: &str = "Bearer";
/// Scope granted to every issued token.
pub const SCOPE: &str = "app";

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Digest of the user's email.
    pub aud: String,
    /// Org id.
    pub org: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

/// An issued token and its expiry (Unix seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub bearer: String,
    pub expires: i64,
}

/// The proof a caller sends to obtain a token.
pub fn encode_token_request(user_id: &str, api_secret: &str) -> String {
    sha256_hex(&format!("{user_id}{api_secret}"))
}

/// Whether `request` is the proof for this user. Compared in constant time.
pub fn verify_token_request(request: &str, user_id: &str, api_secret: &str) -> bool {
    digest_eq(&encode_token_request(user_id, api_secret), request)
}

fn signing_key(user_id: &str, token_key: &Key) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(Vec::with_capacity(user_id.len() + token_key.as_bytes().len()));
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(token_key.as_bytes());
    key
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Sign `claims` for `user_id`.
pub fn encode(claims: &Claims, user_id: &str, token_key: &Key) -> Result<String, AuthError> {
    let key = signing_key(user_id, token_key);
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(&key),
    )
    .map_err(|e| AuthError::Internal(format!("token encode: {e}")))
}

/// Check the signature and audience of `token` for `user_id`.
///
/// Expiry is not checked here; see [`validate`].
pub fn decode(
    token: &str,
    user_id: &str,
    audience: &str,
    token_key: &Key,
) -> Result<Claims, AuthError> {
    let key = signing_key(user_id, token_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["sub", "aud", "exp"]);

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&key), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })
}

/// Issue a token to the session's user, given its proof of possession.
pub fn issue(
    state: &AppState,
    session: &Session,
    proof: Option<&str>,
) -> Result<Token, AuthError> {
    let proof = proof
        .filter(|p| !p.is_empty())
        .ok_or(AuthError::MissingHeader(TOKEN_REQUEST_HEADER))?;

    let user = &session.user;
    if !verify_token_request(proof, &user.id, &user.api_secret) {
        tracing::debug!(user = %user.id, "token request rejected");
        return Err(AuthError::InvalidProof);
    }

    let iat = now();
    let claims = Claims {
        sub: user.id.clone(),
        aud: user.email_digest.clone(),
        org: user.org.clone(),
        scope: SCOPE.to_string(),
        iat,
        exp: iat + state.token_ttl().as_secs() as i64,
    };

    let bearer = encode(&claims, &user.id, state.token_key())?;
    Ok(Token {
        bearer,
        expires: claims.exp,
    })
}

/// Validate the authorization header value against the session.
pub fn validate(
    state: &AppState,
    session: &Session,
    header: Option<&str>,
) -> Result<Claims, AuthError> {
    let token = header
        .map(from_header_val)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingHeader(AUTHORIZATION))?;

    let claims = decode(
        token,
        &session.user.id,
        &session.user.email_digest,
        state.token_key(),
    )?;

    if claims.sub != session.user.id || claims.org != session.org.id {
        return Err(AuthError::TokenMismatch);
    }
    if claims.exp < now() {
        return Err(AuthError::Expired);
    }
    Ok(claims)
}

/// `Bearer <token>`.
pub fn to_header_val(token: &str) -> String {
    format!("{SCHEME} {token}")
}

/// Strip one leading `Bearer ` from a header value.
pub fn from_header_val(value: &str) -> &str {
    value
        .strip_prefix(SCHEME)
        .and_then(|rest| rest.strip_prefix(' '))
        .unwrap_or(value)
}
