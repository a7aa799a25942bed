use serde::{Deserialize, Serialize};

/// Country recorded for principals that signed up without one.
pub const DEFAULT_COUNTRY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(transparent)]
pub struct PrincipalId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(transparent)]
pub struct Username(pub String);

/// An encoded Argon2 hash. Only ever produced by [`crate::hash_password`].
#[derive(Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct HashedPassword(pub String);

impl std::fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HashedPassword(..)")
    }
}

/// Optional directory fields collected at sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_media_link: Option<String>,
}

impl Profile {
    pub fn country(&self) -> &str {
        self.country.as_deref().unwrap_or(DEFAULT_COUNTRY)
    }
}

/// A stored admin record as handed back by a [`crate::CredentialStore`].
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: Username,
    pub email: String,
    pub name: String,
    pub password_hash: HashedPassword,
    pub profile: Profile,
    pub is_verified: bool,
    /// Unix seconds, maintained by the store.
    pub created_at: u64,
    pub updated_at: u64,
}

/// What the auth service asks the store to persist on sign-up.
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub id: PrincipalId,
    pub username: Username,
    pub email: String,
    pub name: String,
    pub password_hash: HashedPassword,
    pub profile: Profile,
}

/// Public view of a principal. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalSummary {
    pub id: PrincipalId,
    pub username: Username,
    pub email: String,
    pub name: String,
    pub country: String,
    pub is_verified: bool,
    pub created_at: u64,
}

impl From<&Principal> for PrincipalSummary {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id.clone(),
            username: principal.username.clone(),
            email: principal.email.clone(),
            name: principal.name.clone(),
            country: principal.profile.country().to_string(),
            is_verified: principal.is_verified,
            created_at: principal.created_at,
        }
    }
}

/// Missing required fields deserialize as empty and are reported by
/// [`SignUpRequest::validate`].
#[derive(Clone, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub profile: Profile,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

/// A signed bearer credential, returned from a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[repr(transparent)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The verified content of an [`AccessToken`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimSet {
    pub principal_id: PrincipalId,
    pub username: Username,
    pub issued_at: u64,
    pub expires_at: u64,
}
