use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;

/// A post as returned by the remote API. Fields we never render are left
/// out; serde ignores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub user: Author,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}

/// Denormalized author summary embedded in every post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub photo: String,
}

#[derive(Debug, Deserialize)]
struct PostsResponse {
    posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct SigninResponse {
    token: String,
}

/// Error message envelope the remote API uses for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: StatusCode, message: String },
}

impl ApiError {
    async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body
                .error
                .or(body.message)
                .unwrap_or_else(|| status.to_string()),
            Err(_) => status.to_string(),
        };
        ApiError::Status { status, message }
    }
}

/// Client for the linked-posts REST API. Cheap to clone; the inner reqwest
/// client is reference-counted.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    posts_limit: u32,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            posts_limit: config.posts_limit,
        })
    }

    /// Fetch the given user's posts, newest first, capped at the configured
    /// limit. The raw session token authorizes the call.
    pub async fn get_user_posts(&self, token: &str, user_id: &str) -> Result<Vec<Post>, ApiError> {
        let url = format!("{}/users/{}/posts", self.base_url, user_id);
        let response = self
            .client
            .get(&url)
            .query(&[("limit", self.posts_limit.to_string())])
            .header("token", token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        let body: PostsResponse = response.json().await?;
        Ok(body.posts)
    }

    /// Replace the user's profile photo. The API derives the user from the
    /// token; the multipart field must be named `photo`.
    pub async fn upload_photo(
        &self,
        token: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime.as_ref())?;
        let form = Form::new().part("photo", part);

        let url = format!("{}/users/upload-photo", self.base_url);
        let response = self
            .client
            .put(&url)
            .header("token", token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }
        Ok(())
    }

    /// Exchange credentials for a session token.
    pub async fn signin(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let url = format!("{}/users/signin", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        let body: SigninResponse = response.json().await?;
        Ok(body.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            posts_limit: 20,
        })
        .unwrap()
    }

    fn post_json(id: &str, name: &str, photo: &str) -> serde_json::Value {
        serde_json::json!({
            "_id": id,
            "body": "hello",
            "image": null,
            "user": { "_id": "u1", "name": name, "photo": photo },
            "createdAt": "2024-05-01T12:00:00.000Z"
        })
    }

    #[tokio::test]
    async fn get_user_posts_targets_the_decoded_user_with_limit_20() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/u1/posts"))
            .and(query_param("limit", "20"))
            .and(header("token", "tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "posts": [post_json("p1", "Alice", "a.jpg")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let posts = test_client(&server.uri())
            .get_user_posts("tok-123", "u1")
            .await
            .unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "p1");
        assert_eq!(posts[0].user.name, "Alice");
        assert_eq!(posts[0].user.photo, "a.jpg");
    }

    #[tokio::test]
    async fn get_user_posts_surfaces_the_api_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/u1/posts"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "error": "invalid token" })),
            )
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .get_user_posts("bad", "u1")
            .await
            .unwrap_err();

        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "invalid token");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_user_posts_falls_back_to_status_text_without_a_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/u1/posts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .get_user_posts("tok", "u1")
            .await
            .unwrap_err();

        match err {
            ApiError::Status { status, .. } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_photo_puts_multipart_with_token_header() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/users/upload-photo"))
            .and(header("token", "tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "success"
            })))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server.uri())
            .upload_photo("tok-123", "avatar.png", vec![0x89, 0x50, 0x4e, 0x47])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn signin_returns_the_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "success",
                "token": "tok-abc"
            })))
            .mount(&server)
            .await;

        let token = test_client(&server.uri())
            .signin("a@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(token, "tok-abc");
    }
}
