use super::error::*;
use crate::application_port::{
    AuthService, AuthTokens, ChangePasswordInput, LoginInput, SignupInput, UpdateProfileInput,
    UserService,
};
use crate::domain_model::{ImageKind, UserId};
use bytes::Buf;
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::multipart::FormData;
use warp::{self, reject};

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

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: UserId,
}

pub async fn signup(
    body: SignupRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let signup_input = SignupInput {
        username: body.username,
        email: body.email,
        full_name: body.full_name,
        password: body.password,
    };
    let user_id = auth_service
        .signup(signup_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(SignupResponse {
        user_id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email address.
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub auth_tokens: AuthTokens,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_input = LoginInput {
        login: body.login,
        password: body.password,
    };
    let login_result = auth_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let login_response = LoginResponse {
        user_id: login_result.user_id,
        auth_tokens: login_result.tokens,
    };

    Ok(warp::reply::json(&ApiResponse::ok(login_response)))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tokens = auth_service
        .refresh_token(&body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse;

pub async fn logout(
    user_id: UserId,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .logout(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(LogoutResponse)))
}

pub async fn get_profile(
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile = user_service
        .get_profile(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(profile)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

pub async fn update_profile(
    body: UpdateProfileRequest,
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile = user_service
        .update_profile(
            user_id,
            UpdateProfileInput {
                full_name: body.full_name,
                email: body.email,
            },
        )
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(profile)))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse;

pub async fn change_password(
    body: ChangePasswordRequest,
    user_id: UserId,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .change_password(
            user_id,
            ChangePasswordInput {
                old_password: body.old_password,
                new_password: body.new_password,
            },
        )
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(ChangePasswordResponse)))
}

pub async fn update_avatar(
    form: FormData,
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    update_image(form, user_id, ImageKind::Avatar, user_service).await
}

pub async fn update_cover_image(
    form: FormData,
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    update_image(form, user_id, ImageKind::CoverImage, user_service).await
}

async fn update_image(
    form: FormData,
    user_id: UserId,
    kind: ImageKind,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let (bytes, content_type) = read_file_part(form).await.map_err(reject::custom)?;

    let profile = user_service
        .update_image(user_id, kind, bytes, &content_type)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(profile)))
}

/// Pull the bytes and content type of the `file` part out of a multipart
/// form, ignoring any other parts.
async fn read_file_part(form: FormData) -> Result<(Vec<u8>, String), ApiErrorCode> {
    let parts: Vec<warp::multipart::Part> = form
        .try_collect()
        .await
        .map_err(|_| ApiErrorCode::InvalidRequest)?;

    for part in parts {
        if part.name() != "file" {
            continue;
        }
        let content_type = part
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = part
            .stream()
            .try_fold(Vec::new(), |mut acc, mut buf| async move {
                while buf.has_remaining() {
                    let chunk = buf.chunk();
                    acc.extend_from_slice(chunk);
                    let advance = chunk.len();
                    buf.advance(advance);
                }
                Ok(acc)
            })
            .await
            .map_err(|_| ApiErrorCode::InvalidRequest)?;
        return Ok((bytes, content_type));
    }

    Err(ApiErrorCode::InvalidRequest)
}
