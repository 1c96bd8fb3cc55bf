use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::server::SessionCookie;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::{StatusCode, header};
use warp::reply::Response;
use warp::{Reply, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

fn json_ok<T: Serialize>(status: StatusCode, data: T) -> Response {
    warp::reply::with_status(warp::reply::json(&ApiResponse::ok(data)), status).into_response()
}

fn with_cookie(mut response: Response, cookie: String) -> Result<Response, warp::Rejection> {
    let value = header::HeaderValue::from_str(&cookie)
        .map_err(ApiRejection::internal)
        .map_err(reject::custom)?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

fn session_cookie(cfg: &SessionCookie, token: &str, max_age_secs: u64) -> String {
    let secure = if cfg.secure { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        cfg.name, token, max_age_secs, secure
    )
}

// region auth

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

impl From<CredentialsRequest> for Credentials {
    fn from(body: CredentialsRequest) -> Self {
        Credentials::new(body.username, body.password)
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
}

pub async fn register(
    body: CredentialsRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<Response, warp::Rejection> {
    let user_id = auth_service
        .register(body.into())
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(json_ok(StatusCode::CREATED, RegisterResponse { user_id }))
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

pub async fn login(
    body: CredentialsRequest,
    current: Option<SessionToken>,
    auth_service: Arc<dyn AuthService>,
    cookie: Arc<SessionCookie>,
) -> Result<Response, warp::Rejection> {
    let session = auth_service
        .authenticate(body.into(), current.as_ref())
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    let response = json_ok(
        StatusCode::OK,
        LoginResponse {
            user_id: session.user_id,
            expires_at: session.expires_at,
        },
    );
    with_cookie(
        response,
        session_cookie(&cookie, session.token.as_str(), cookie.max_age_secs),
    )
}

pub async fn logout(
    current: Option<SessionToken>,
    auth_service: Arc<dyn AuthService>,
    cookie: Arc<SessionCookie>,
) -> Result<Response, warp::Rejection> {
    if let Some(token) = current {
        auth_service
            .logout(&token)
            .await
            .map_err(ApiRejection::from)
            .map_err(reject::custom)?;
    }

    with_cookie(json_ok(StatusCode::OK, ()), session_cookie(&cookie, "", 0))
}

#[derive(Debug, Serialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
}

pub async fn me(user: Option<User>) -> Result<Response, warp::Rejection> {
    let identity = user.map(|u| Identity {
        id: u.id,
        username: u.username,
    });
    Ok(json_ok(StatusCode::OK, identity))
}

// endregion

// region posts

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl From<PostRequest> for PostInput {
    fn from(body: PostRequest) -> Self {
        PostInput::new(body.title, body.body)
    }
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub post_id: PostId,
}

pub async fn list_posts(post_service: Arc<dyn PostService>) -> Result<Response, warp::Rejection> {
    let posts = post_service
        .list_public()
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;
    Ok(json_ok(StatusCode::OK, posts))
}

pub async fn get_post(
    post_id: PostId,
    post_service: Arc<dyn PostService>,
) -> Result<Response, warp::Rejection> {
    let post = post_service
        .read(post_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;
    Ok(json_ok(StatusCode::OK, post))
}

pub async fn create_post(
    body: PostRequest,
    user: Option<User>,
    post_service: Arc<dyn PostService>,
) -> Result<Response, warp::Rejection> {
    let post_id = post_service
        .create(user.as_ref(), body.into())
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;
    Ok(json_ok(StatusCode::CREATED, CreatePostResponse { post_id }))
}

pub async fn edit_post(
    post_id: PostId,
    user: Option<User>,
    post_service: Arc<dyn PostService>,
) -> Result<Response, warp::Rejection> {
    let post = post_service
        .read_for_edit(user.as_ref(), post_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;
    Ok(json_ok(StatusCode::OK, post))
}

pub async fn update_post(
    post_id: PostId,
    body: PostRequest,
    user: Option<User>,
    post_service: Arc<dyn PostService>,
) -> Result<Response, warp::Rejection> {
    post_service
        .update(user.as_ref(), post_id, body.into())
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;
    Ok(json_ok(StatusCode::OK, ()))
}

pub async fn delete_post(
    post_id: PostId,
    user: Option<User>,
    post_service: Arc<dyn PostService>,
) -> Result<Response, warp::Rejection> {
    post_service
        .delete(user.as_ref(), post_id)
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;
    Ok(json_ok(StatusCode::OK, ()))
}

// endregion
