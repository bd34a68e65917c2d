use askama::Template;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::api::{ApiError, Post};
use crate::cache::posts_key;
use crate::error::{AppError, AppResult};
use crate::extractors::{clear_flash_cookie, Flash, MaybeFlash};
use crate::routes::auth::{append_set_cookie, redirect_with_flash};
use crate::routes::home::Html;
use crate::session::Session;
use crate::state::AppState;

const UPLOAD_FALLBACK_ERROR: &str = "Error uploading image";

/// Projection of the posts read used to pick the rendering branch.
#[derive(Debug)]
pub enum FetchState {
    /// Request not resolved yet; only the loading indicator renders.
    Pending,
    /// Read failed; fixed error message, no retry here.
    Failed,
    /// Read succeeded. An empty list renders the placeholder; the profile
    /// header is derived from the first post's embedded author, so it is
    /// never touched when the list is empty.
    Loaded(Vec<Post>),
}

#[derive(Template)]
#[template(path = "components/posts_state.html")]
pub struct PostsStateTemplate {
    pub state: FetchState,
}

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub flash: Option<Flash>,
    /// Pre-rendered pending branch shown until the fragment request lands.
    pub initial: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile_page))
        .route("/profile/posts", get(posts_fragment))
        .route("/profile/photo", post(upload_photo))
}

/// GET /profile — page shell. Data is deferred to the fragment request so
/// the loading state is what paints first.
pub async fn profile_page(
    State(_state): State<AppState>,
    _session: Session,
    MaybeFlash(flash): MaybeFlash,
) -> AppResult<Response> {
    let initial = PostsStateTemplate {
        state: FetchState::Pending,
    }
    .render()
    .map_err(|e| AppError::Internal(format!("template render failed: {e}")))?;

    let had_flash = flash.is_some();
    let mut response = Html(ProfileTemplate { flash, initial }).into_response();
    if had_flash {
        append_set_cookie(&mut response, &clear_flash_cookie())?;
    }
    Ok(response)
}

/// GET /profile/posts — resolve the read and return the matching branch.
pub async fn posts_fragment(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Response> {
    let fetch = match load_posts(&state, &session).await {
        Ok(posts) => FetchState::Loaded(posts),
        Err(e) => {
            tracing::error!("Failed to fetch posts for {}: {}", session.user_id(), e);
            FetchState::Failed
        }
    };
    Ok(Html(PostsStateTemplate { state: fetch }).into_response())
}

/// Read-through lookup: cached posts are reused until the cache key is
/// invalidated by a successful photo upload.
async fn load_posts(state: &AppState, session: &Session) -> Result<Vec<Post>, ApiError> {
    let key = posts_key(session.user_id());
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(cached.as_ref().clone());
    }

    let posts = state
        .api
        .get_user_posts(&session.token, session.user_id())
        .await?;
    state.cache.insert(key, posts.clone()).await;
    Ok(posts)
}

/// POST /profile/photo — replace the profile photo.
///
/// An empty selection fails locally, before any network call, and leaves
/// the cache alone. On success the cache key is invalidated strictly after
/// the remote API confirms, so the next read reflects the new photo.
pub async fn upload_photo(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let flash = match read_photo_field(&mut multipart).await? {
        None => Flash::Error("Cannot upload empty photo".to_string()),
        Some((file_name, bytes)) => {
            match state
                .api
                .upload_photo(&session.token, &file_name, bytes)
                .await
            {
                Ok(()) => {
                    state.cache.invalidate(&posts_key(session.user_id())).await;
                    Flash::Success("Image updated successfully".to_string())
                }
                Err(e) => {
                    tracing::error!("Photo upload failed for {}: {}", session.user_id(), e);
                    let msg = e.to_string();
                    if msg.is_empty() {
                        Flash::Error(UPLOAD_FALLBACK_ERROR.to_string())
                    } else {
                        Flash::Error(msg)
                    }
                }
            }
        }
    };

    // Redirecting resets the file input either way
    redirect_with_flash("/profile", &flash)
}

/// Pull the `photo` field out of the form. `None` means nothing usable was
/// selected; the caller treats that as the local "empty photo" failure.
async fn read_photo_field(multipart: &mut Multipart) -> AppResult<Option<(String, Vec<u8>)>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed upload: {e}")))?
    {
        if field.name() != Some("photo") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("malformed upload: {e}")))?;

        if file_name.is_empty() || bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some((file_name, bytes.to_vec())));
    }
    Ok(None)
}
