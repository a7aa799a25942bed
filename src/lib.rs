mod auth;
mod bearer;
mod error;
mod notify;
mod password;
mod routes;
mod store;
mod token;
mod types;
mod validation;

pub use auth::*;
pub use error::*;
pub use notify::*;
pub use password::{hash_password, verify_password};
pub use routes::*;
pub use store::*;
pub use token::{
    TokenConfig, DEFAULT_ISSUER, DEFAULT_LIFETIME, ISSUER_VAR, LIFETIME_VAR, SECRET_VAR,
};
pub use types::*;
pub use validation::{check_password, FieldError, MIN_PASSWORD_LENGTH};
