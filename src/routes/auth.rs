use askama::Template;
use axum::extract::State;
use axum::http::header::{self, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::post;
use axum::{Form, Router};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extractors::{
    clear_cookie, clear_flash_cookie, session_cookie, Flash, MaybeFlash, TokenPresent,
};
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub flash: Option<Flash>,
}

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupTemplate;

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// GET / — login screen, wrapped by the logged-in route guard: a visitor
/// who already carries the session cookie is sent straight to /home. The
/// check is presence-only and runs on every request.
pub async fn login_page(
    TokenPresent(present): TokenPresent,
    MaybeFlash(flash): MaybeFlash,
) -> AppResult<Response> {
    if present {
        return Ok(Redirect::to("/home").into_response());
    }

    let had_flash = flash.is_some();
    let mut response = Html(LoginTemplate { flash }).into_response();
    if had_flash {
        append_set_cookie(&mut response, &clear_flash_cookie())?;
    }
    Ok(response)
}

/// GET /signup — same guard as the login screen.
pub async fn signup_page(TokenPresent(present): TokenPresent) -> AppResult<Response> {
    if present {
        return Ok(Redirect::to("/home").into_response());
    }
    Ok(Html(SignupTemplate).into_response())
}

/// POST /auth/login — exchange credentials with the remote API and persist
/// the returned token in the session cookie.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return redirect_with_flash(
            "/",
            &Flash::Error("Email and password are required".to_string()),
        );
    }

    match state.api.signin(form.email.trim(), &form.password).await {
        Ok(token) => {
            tracing::info!("Login succeeded");
            let cookie = session_cookie(
                &state.config.auth.cookie_name,
                &token,
                state.config.auth.cookie_max_age_hours,
            );
            let mut response = Redirect::to("/home").into_response();
            append_set_cookie(&mut response, &cookie)?;
            Ok(response)
        }
        Err(e) => {
            tracing::warn!("Login rejected by remote API: {}", e);
            redirect_with_flash("/", &Flash::Error(e.to_string()))
        }
    }
}

/// POST /auth/logout — drop the session cookie.
pub async fn logout(State(state): State<AppState>) -> AppResult<Response> {
    let mut response = Redirect::to("/").into_response();
    append_set_cookie(
        &mut response,
        &clear_cookie(&state.config.auth.cookie_name),
    )?;
    Ok(response)
}

pub fn redirect_with_flash(to: &str, flash: &Flash) -> AppResult<Response> {
    let mut response = Redirect::to(to).into_response();
    append_set_cookie(&mut response, &flash.cookie())?;
    Ok(response)
}

pub fn append_set_cookie(response: &mut Response, cookie: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
