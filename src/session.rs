use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

/// Claims we read out of the session token's payload.
///
/// The decode is NOT a signature verification. The remote API is the only
/// party that validates the token; we only pull the user id out of the
/// payload to know whose posts to ask for. Nothing security-relevant may
/// ever depend on these fields.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Identifier of the authenticated user.
    pub user: String,
    /// Issued-at, seconds since epoch. Present in tokens from the remote
    /// API but unused here.
    #[serde(default)]
    pub iat: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is not a three-segment JWT")]
    MalformedToken,

    #[error("payload is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("payload is not a valid claims object: {0}")]
    InvalidClaims(#[from] serde_json::Error),
}

/// A session established from the `tkn` cookie: the raw token (forwarded to
/// the remote API on every call) plus the claims decoded from it.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub claims: Claims,
}

impl Session {
    pub fn from_token(token: &str) -> Result<Self, TokenError> {
        let claims = decode_claims(token)?;
        Ok(Self {
            token: token.to_string(),
            claims,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.claims.user
    }
}

/// Decode the payload segment of a JWT without verifying its signature.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let payload = token
        .splitn(3, '.')
        .nth(1)
        .filter(|_| token.matches('.').count() == 2)
        .ok_or(TokenError::MalformedToken)?;

    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    let claims = serde_json::from_slice(&bytes)?;
    Ok(claims)
}

#[cfg(test)]
pub fn encode_token(user_id: &str) -> String {
    // Unsigned test token with the same segment layout the remote API uses
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({ "user": user_id, "iat": 1_700_000_000 }).to_string(),
    );
    format!("{header}.{payload}.sig")
}
