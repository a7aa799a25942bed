use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use warp::{
    filters::body::BodyDeserializeError,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    path, Filter, Rejection, Reply,
};

use crate::{
    auth::Auth,
    bearer::bearer_token,
    error::AuthError,
    types::{AccessToken, ClaimSet, SignUpRequest},
    validation::FieldError,
};

/// Mounts `POST /auth/signup`, `POST /auth/login` and the bearer-gated `PUT /auth/password`.
pub fn build_api_route_filter(
    auth: &Auth,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let signup = path!("auth" / "signup")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_auth_state(auth.clone()))
        .and_then(user_signup);

    let login = path!("auth" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_auth_state(auth.clone()))
        .and_then(user_login);

    let change_password = path!("auth" / "password")
        .and(warp::put())
        .and(with_auth(auth))
        .and(warp::body::json())
        .and(with_auth_state(auth.clone()))
        .and_then(user_change_password);

    signup
        .or(login)
        .or(change_password)
        .with(warp::trace::named("auth"))
}

/// Gate for protected routes: yields the verified claims of the bearer token.
/// A missing header, another scheme or a bad token all reject with [`AuthError`].
pub fn with_auth(auth: &Auth) -> impl Filter<Extract = (ClaimSet,), Error = Rejection> + Clone {
    warp::header::headers_cloned()
        .and(with_auth_state(auth.clone()))
        .and_then(user_auth_check)
}

/// The body of every sign-up, password change and error reply.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl<T> ApiResponse<T> {
    fn success(message: &str, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data,
            error: None,
            errors: Vec::new(),
        }
    }

    fn failure(message: &str, error: Option<String>) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            data: None,
            error,
            errors: Vec::new(),
        }
    }
}

/// Turns [`AuthError`] rejections and unreadable request bodies into JSON
/// replies. Every authentication failure gets the same 401 body; other
/// rejections pass through.
pub async fn handle_auth_errors(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(auth_error) = err.find::<AuthError>() {
        let (status, body) = match auth_error {
            AuthError::WeakPassword { .. } => (
                StatusCode::BAD_REQUEST,
                ApiResponse::<()>::failure("request rejected", Some(auth_error.to_string())),
            ),
            AuthError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ApiResponse {
                    errors: errors.clone(),
                    ..ApiResponse::failure("request rejected", Some(auth_error.to_string()))
                },
            ),
            AuthError::AlreadyExists => (
                StatusCode::CONFLICT,
                ApiResponse::failure("Failed to create admin", Some(auth_error.to_string())),
            ),
            other if other.is_unauthorized() => (
                StatusCode::UNAUTHORIZED,
                ApiResponse::failure("unauthorized", None),
            ),
            AuthError::StoreUnavailable { .. } => {
                error!(error = ?auth_error, "credential store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ApiResponse::failure("service temporarily unavailable", None),
                )
            }
            _ => {
                error!(error = ?auth_error, "unhandled auth error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::failure("an unknown error has occurred", None),
                )
            }
        };
        return Ok(warp::reply::with_status(warp::reply::json(&body), status));
    }

    if let Some(body_error) = err.find::<BodyDeserializeError>() {
        debug!(error = %body_error, "request body rejected");
        let body = ApiResponse::<()>::failure(
            "request rejected",
            Some("request body is not valid JSON for this endpoint".to_string()),
        );
        return Ok(warp::reply::with_status(
            warp::reply::json(&body),
            StatusCode::BAD_REQUEST,
        ));
    }

    Err(err)
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: AccessToken,
}

#[derive(Deserialize)]
pub struct ChangePasswordQuery {
    pub current_password: String,
    pub new_password: String,
}

async fn user_signup(input: SignUpRequest, auth: Auth) -> Result<impl Reply, Rejection> {
    let summary = auth.sign_up(input).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::success(
            "Admin created successfully",
            Some(summary),
        )),
        StatusCode::CREATED,
    ))
}

async fn user_login(input: LoginQuery, auth: Auth) -> Result<impl Reply, Rejection> {
    let access_token = auth.sign_in(&input.username, &input.password).await?;

    Ok(warp::reply::json(&LoginResponse { access_token }))
}

async fn user_change_password(
    claims: ClaimSet,
    input: ChangePasswordQuery,
    auth: Auth,
) -> Result<impl Reply, Rejection> {
    auth.change_password(
        &claims.username.0,
        &input.current_password,
        &input.new_password,
    )
    .await?;

    Ok(warp::reply::json(&ApiResponse::<()>::success(
        "Password changed successfully",
        None,
    )))
}

// Unwrap the bearer token and validate it
async fn user_auth_check(headers: HeaderMap, auth: Auth) -> Result<ClaimSet, Rejection> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AuthError::Malformed)?;

    let claims = auth.verify_token(token).map_err(|err| {
        debug!(error = %err, "bearer token rejected");
        err
    })?;

    Ok(claims)
}

// functor that adds a handle to the auth service into the filter chain
fn with_auth_state(auth: Auth) -> impl Filter<Extract = (Auth,), Error = Infallible> + Clone {
    warp::any().map(move || auth.clone())
}
