use warp::reject::Reject;

use crate::validation::FieldError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("password must be at least {min} characters long")]
    WeakPassword { min: usize },
    #[error("request failed validation")]
    Validation(Vec<FieldError>),
    #[error("an account with that username or email already exists")]
    AlreadyExists,
    #[error("username or password incorrect")]
    InvalidCredentials,
    #[error("malformed token")]
    Malformed,
    #[error("token signature does not verify")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("credential store unavailable")]
    StoreUnavailable {
        #[source]
        source: BoxError,
    },
    #[error("notification could not be delivered")]
    NotificationFailed {
        #[source]
        source: BoxError,
    },
    #[error("error while hashing password")]
    Hashing {
        #[from]
        source: argon2::Error,
    },
    #[error("error while signing token")]
    Signing {
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    #[error("background task failed")]
    Task {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl AuthError {
    /// Errors that must collapse into a single "unauthorized" answer at the boundary.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::Malformed
                | AuthError::InvalidSignature
                | AuthError::Expired
        )
    }
}

impl Reject for AuthError {}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("username already taken")]
    DuplicateUsername,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("no such principal")]
    NotFound,
    #[error("store unavailable")]
    Unavailable(#[source] BoxError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername | StoreError::DuplicateEmail => AuthError::AlreadyExists,
            // a principal vanishing mid-request looks the same as a bad login
            StoreError::NotFound => AuthError::InvalidCredentials,
            StoreError::Unavailable(source) => AuthError::StoreUnavailable { source },
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("token secret must not be empty")]
    EmptySecret,
    #[error("token issuer must not be empty")]
    EmptyIssuer,
    #[error("token lifetime must be greater than zero")]
    ZeroLifetime,
    #[error("password hasher rejected its parameters: {0}")]
    Hasher(String),
    #[error("environment variable {name} is not set")]
    MissingVar { name: &'static str },
    #[error("environment variable {name} is invalid: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}
