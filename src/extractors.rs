use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::session::Session;
use crate::state::AppState;

pub const FLASH_COOKIE: &str = "flash";

/// Extractor that requires a decodable session.
///
/// Missing cookie: the visitor is not logged in, bounce to the login page.
/// Undecodable cookie: the stored token is junk; clear it so the route
/// guard stops treating the visitor as logged in, then bounce.
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie_name = &state.config.auth.cookie_name;
        let token = get_cookie_value(parts, cookie_name)
            .ok_or_else(AppError::unauthorized)?;

        Session::from_token(token).map_err(|e| {
            tracing::warn!("Rejecting undecodable session token: {}", e);
            AppError::Unauthorized {
                clear_cookie: Some(clear_cookie(cookie_name)),
            }
        })
    }
}

/// Presence-only session indicator for the route guard. No decode, no
/// expiry check; a stored token of any shape counts as "logged in".
pub struct TokenPresent(pub bool);

impl FromRequestParts<AppState> for TokenPresent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let present = get_cookie_value(parts, &state.config.auth.cookie_name)
            .is_some_and(|v| !v.is_empty());
        Ok(TokenPresent(present))
    }
}

/// One-shot notification carried across a redirect in a short-lived cookie.
#[derive(Debug, Clone, PartialEq)]
pub enum Flash {
    Success(String),
    Error(String),
}

impl Flash {
    pub fn message(&self) -> &str {
        match self {
            Flash::Success(msg) | Flash::Error(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Flash::Error(_))
    }

    /// Set-Cookie value carrying this flash to the next page load.
    pub fn cookie(&self) -> String {
        let (kind, msg) = match self {
            Flash::Success(msg) => ("success", msg),
            Flash::Error(msg) => ("error", msg),
        };
        format!(
            "{}={}:{}; SameSite=Strict; Path=/; Max-Age=60",
            FLASH_COOKIE,
            kind,
            urlencoding::encode(msg)
        )
    }

    fn parse(value: &str) -> Option<Self> {
        let (kind, encoded) = value.split_once(':')?;
        let msg = urlencoding::decode(encoded).ok()?.into_owned();
        match kind {
            "success" => Some(Flash::Success(msg)),
            "error" => Some(Flash::Error(msg)),
            _ => None,
        }
    }
}

/// Optional flash extractor. The page that renders the flash clears the
/// cookie in its response; see [`clear_flash_cookie`].
pub struct MaybeFlash(pub Option<Flash>);

impl FromRequestParts<AppState> for MaybeFlash {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let flash = get_cookie_value(parts, FLASH_COOKIE).and_then(Flash::parse);
        Ok(MaybeFlash(flash))
    }
}

// -- Cookie helpers --

pub fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

pub fn clear_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", name)
}

pub fn clear_flash_cookie() -> String {
    format!("{}=; SameSite=Strict; Path=/; Max-Age=0", FLASH_COOKIE)
}

pub fn get_cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_cookie(cookie: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(header::COOKIE, cookie)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn get_cookie_value_finds_the_named_cookie() {
        let parts = parts_with_cookie("other=1; tkn=abc.def.ghi; x=2");
        assert_eq!(get_cookie_value(&parts, "tkn"), Some("abc.def.ghi"));
        assert_eq!(get_cookie_value(&parts, "missing"), None);
    }

    #[test]
    fn flash_round_trips_through_cookie_value() {
        let flash = Flash::Error("Cannot upload empty photo".to_string());
        let cookie = flash.cookie();
        let value = cookie
            .strip_prefix("flash=")
            .unwrap()
            .split(';')
            .next()
            .unwrap();
        assert_eq!(Flash::parse(value), Some(flash));
    }

    #[test]
    fn flash_parse_rejects_unknown_kind() {
        assert_eq!(Flash::parse("warning:hello"), None);
        assert_eq!(Flash::parse("no-separator"), None);
    }

    #[test]
    fn session_cookie_sets_http_only_and_max_age() {
        let cookie = session_cookie("tkn", "abc", 2);
        assert!(cookie.starts_with("tkn=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=7200"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        assert!(clear_cookie("tkn").contains("Max-Age=0"));
        assert!(clear_flash_cookie().contains("Max-Age=0"));
    }
}
