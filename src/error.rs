use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No usable session. Browsers get bounced to the login page; when the
    /// stored token was unusable the stale cookie is cleared on the way out.
    #[error("Unauthorized")]
    Unauthorized { clear_cookie: Option<String> },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized { clear_cookie: None }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized { clear_cookie } => {
                let redirect = Redirect::to("/");
                match clear_cookie {
                    Some(cookie) => ([(header::SET_COOKIE, cookie)], redirect).into_response(),
                    None => redirect.into_response(),
                }
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
