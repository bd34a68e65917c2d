use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::AppResult;
use crate::session::Session;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub user_id: String,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Landing page for an authenticated session. The feed itself lives on the
/// profile page; this is just the redirect target the route guard points at.
pub async fn index(session: Session) -> AppResult<Response> {
    Ok(Html(HomeTemplate {
        user_id: session.user_id().to_string(),
    })
    .into_response())
}
