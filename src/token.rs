use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, get_current_timestamp, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AuthError, ConfigError},
    types::{AccessToken, ClaimSet, PrincipalId, Username},
};

pub const SECRET_VAR: &str = "ADMIN_AUTH_TOKEN_SECRET";
pub const ISSUER_VAR: &str = "ADMIN_AUTH_TOKEN_ISSUER";
pub const LIFETIME_VAR: &str = "ADMIN_AUTH_TOKEN_LIFETIME_SECS";

pub const DEFAULT_ISSUER: &str = "admin-auth";
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
pub struct TokenConfig {
    /// The issuer for auth tokens. Tokens carrying any other issuer are rejected.
    pub issuer: String,
    /// The secret used to sign tokens.
    /// If the secret changes, every outstanding token stops verifying.
    pub secret: SecretString,
    /// How long a token stays valid after sign-in. Must be non-zero.
    pub lifetime: Duration,
}

impl TokenConfig {
    /// Read the token settings from the process environment.
    ///
    /// Only the secret is mandatory; issuer and lifetime fall back to
    /// [`DEFAULT_ISSUER`] and [`DEFAULT_LIFETIME`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret =
            std::env::var(SECRET_VAR).map_err(|_| ConfigError::MissingVar { name: SECRET_VAR })?;

        let issuer = std::env::var(ISSUER_VAR).unwrap_or_else(|_| DEFAULT_ISSUER.to_string());

        let lifetime = match std::env::var(LIFETIME_VAR) {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|err| ConfigError::InvalidVar {
                    name: LIFETIME_VAR,
                    reason: err.to_string(),
                })?,
            Err(_) => DEFAULT_LIFETIME,
        };

        Ok(Self {
            issuer,
            secret: secret.into(),
            lifetime,
        })
    }
}

// `username` and `iat` are optional here so that a token missing them still
// reaches the expiry check; `verify` insists on `username` afterwards.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    pub(crate) username: Option<String>,
    pub(crate) iss: String,
    #[serde(default)]
    pub(crate) iat: u64,
    pub(crate) exp: u64,
}

/// Signs and verifies HS256 access tokens. Keys are derived once and never change.
#[derive(Clone)]
pub(crate) struct TokenSigner {
    issuer: String,
    lifetime: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    pub(crate) fn new(config: &TokenConfig) -> Result<Self, ConfigError> {
        let secret = config.secret.expose_secret();
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if config.issuer.trim().is_empty() {
            return Err(ConfigError::EmptyIssuer);
        }
        if config.lifetime.as_secs() == 0 {
            return Err(ConfigError::ZeroLifetime);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Ok(Self {
            issuer: config.issuer.clone(),
            lifetime: config.lifetime,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub(crate) fn issue(
        &self,
        principal_id: &PrincipalId,
        username: &Username,
    ) -> Result<AccessToken, AuthError> {
        self.issue_at(principal_id, username, get_current_timestamp())
    }

    pub(crate) fn issue_at(
        &self,
        principal_id: &PrincipalId,
        username: &Username,
        issued_at: u64,
    ) -> Result<AccessToken, AuthError> {
        let claims = Claims {
            sub: principal_id.0.clone(),
            username: Some(username.0.clone()),
            iss: self.issuer.clone(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.lifetime.as_secs()),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|source| AuthError::Signing { source })?;

        Ok(AccessToken(token))
    }

    /// Signature is checked before expiry, so a forged expired token reports
    /// `InvalidSignature` rather than `Expired`. A token is valid while
    /// `now <= exp`.
    pub(crate) fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |err| match err.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidIssuer => {
                    AuthError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            },
        )?;

        let claims = data.claims;
        let username = claims.username.ok_or(AuthError::Malformed)?;

        Ok(ClaimSet {
            principal_id: PrincipalId(claims.sub),
            username: Username(username),
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> TokenConfig {
        TokenConfig {
            issuer: "directory".into(),
            secret: secret.to_string().into(),
            lifetime: Duration::from_secs(600),
        }
    }

    fn alice() -> (PrincipalId, Username) {
        (PrincipalId("p-1".into()), Username("alice".into()))
    }

    #[test]
    fn issued_token_verifies() {
        let signer = TokenSigner::new(&config("s3cret")).unwrap();
        let (id, username) = alice();

        let token = signer.issue(&id, &username).unwrap();
        let claims = signer.verify(token.as_str()).unwrap();

        assert_eq!(claims.principal_id, id);
        assert_eq!(claims.username, username);
        assert_eq!(claims.expires_at - claims.issued_at, 600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = TokenSigner::new(&config("s3cret")).unwrap();
        let (id, username) = alice();

        let token = signer
            .issue_at(&id, &username, get_current_timestamp() - 3600)
            .unwrap();

        assert!(matches!(
            signer.verify(token.as_str()),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn token_is_valid_through_its_expiry_second() {
        let signer = TokenSigner::new(&config("s3cret")).unwrap();
        let (id, username) = alice();

        // retry if the clock ticks between issuing and verifying
        loop {
            let now = get_current_timestamp();
            let token = signer.issue_at(&id, &username, now - 600).unwrap();
            let result = signer.verify(token.as_str());
            if get_current_timestamp() == now {
                assert_eq!(result.unwrap().expires_at, now);
                break;
            }
        }

        let token = signer
            .issue_at(&id, &username, get_current_timestamp() - 601)
            .unwrap();
        assert!(matches!(
            signer.verify(token.as_str()),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn expiry_is_reported_before_missing_username() {
        let signer = TokenSigner::new(&config("s3cret")).unwrap();
        let key = EncodingKey::from_secret(b"s3cret");
        let now = get_current_timestamp();

        let mint = |exp: u64| {
            encode(
                &Header::new(Algorithm::HS256),
                &serde_json::json!({"sub": "p-1", "iss": "directory", "exp": exp}),
                &key,
            )
            .unwrap()
        };

        assert!(matches!(
            signer.verify(&mint(now - 3600)),
            Err(AuthError::Expired)
        ));
        assert!(matches!(
            signer.verify(&mint(now + 3600)),
            Err(AuthError::Malformed)
        ));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let ours = TokenSigner::new(&config("s3cret")).unwrap();
        let theirs = TokenSigner::new(&config("another secret")).unwrap();
        let (id, username) = alice();

        let token = theirs.issue(&id, &username).unwrap();
        assert!(matches!(
            ours.verify(token.as_str()),
            Err(AuthError::InvalidSignature)
        ));

        let stale = theirs
            .issue_at(&id, &username, get_current_timestamp() - 3600)
            .unwrap();
        assert!(matches!(
            ours.verify(stale.as_str()),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let ours = TokenSigner::new(&config("s3cret")).unwrap();
        let mut other = config("s3cret");
        other.issuer = "someone else".into();
        let theirs = TokenSigner::new(&other).unwrap();
        let (id, username) = alice();

        let token = theirs.issue(&id, &username).unwrap();
        assert!(matches!(
            ours.verify(token.as_str()),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let signer = TokenSigner::new(&config("s3cret")).unwrap();
        let (id, username) = alice();
        let token = signer.issue(&id, &username).unwrap();

        let mut parts: Vec<String> = token.as_str().split('.').map(String::from).collect();
        let forged = TokenSigner::new(&config("s3cret"))
            .unwrap()
            .issue(&id, &Username("mallory".into()))
            .unwrap();
        parts[1] = forged.as_str().split('.').nth(1).unwrap().to_string();

        assert!(matches!(
            signer.verify(&parts.join(".")),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let signer = TokenSigner::new(&config("s3cret")).unwrap();
        for token in ["", "fake token", "a.b", "a.b.c"] {
            assert!(
                matches!(signer.verify(token), Err(AuthError::Malformed)),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn unusable_config_is_refused() {
        assert_eq!(
            TokenSigner::new(&config("")).err(),
            Some(ConfigError::EmptySecret)
        );

        let mut no_issuer = config("s3cret");
        no_issuer.issuer = " ".into();
        assert_eq!(
            TokenSigner::new(&no_issuer).err(),
            Some(ConfigError::EmptyIssuer)
        );

        let mut sub_second = config("s3cret");
        sub_second.lifetime = Duration::from_millis(500);
        assert_eq!(
            TokenSigner::new(&sub_second).err(),
            Some(ConfigError::ZeroLifetime)
        );
    }

    #[test]
    fn reads_config_from_env() {
        temp_env::with_vars(
            [
                (SECRET_VAR, Some("from-env")),
                (ISSUER_VAR, None),
                (LIFETIME_VAR, Some("120")),
            ],
            || {
                let config = TokenConfig::from_env().unwrap();
                assert_eq!(config.issuer, DEFAULT_ISSUER);
                assert_eq!(config.secret.expose_secret(), "from-env");
                assert_eq!(config.lifetime, Duration::from_secs(120));
            },
        );
    }

    #[test]
    fn env_config_requires_secret_and_numeric_lifetime() {
        temp_env::with_vars([(SECRET_VAR, None::<&str>), (LIFETIME_VAR, None)], || {
            assert_eq!(
                TokenConfig::from_env().err(),
                Some(ConfigError::MissingVar { name: SECRET_VAR })
            );
        });

        temp_env::with_vars(
            [(SECRET_VAR, Some("from-env")), (LIFETIME_VAR, Some("an hour"))],
            || {
                assert!(matches!(
                    TokenConfig::from_env(),
                    Err(ConfigError::InvalidVar { name: LIFETIME_VAR, .. })
                ));
            },
        );
    }
}
