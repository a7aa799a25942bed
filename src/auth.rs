use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::{AuthError, ConfigError},
    notify::{Notifier, WelcomeMessage},
    password::{decoy_hash, hash_password, verify_password},
    store::CredentialStore,
    token::{TokenConfig, TokenSigner},
    types::{
        AccessToken, ClaimSet, HashedPassword, NewPrincipal, Principal, PrincipalId,
        PrincipalSummary, SignUpRequest, Username, DEFAULT_COUNTRY,
    },
    validation::{check_password, MIN_PASSWORD_LENGTH},
};

pub struct AuthConfig {
    /// How access tokens are signed and how long they live.
    pub token: TokenConfig,
    /// Where principals and their password hashes are kept.
    pub credential_store: Arc<dyn CredentialStore>,
    /// Delivers the welcome message after sign-up. Failures are logged, never returned.
    pub notifier: Arc<dyn Notifier>,
}

pub(crate) struct AuthInternal {
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    signer: TokenSigner,
    decoy: HashedPassword,
}

/// The authentication service. Cloning is cheap and every clone shares the
/// same read-only signing keys.
#[derive(Clone)]
pub struct Auth {
    pub(crate) internal: Arc<AuthInternal>,
}

// argon2 is CPU bound, so keep it off the reactor threads
async fn blocking<F, T>(work: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await?)
}

fn weak_password(password: &str) -> Result<(), AuthError> {
    match check_password(password) {
        Some(_) => Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        }),
        None => Ok(()),
    }
}

impl Auth {
    pub fn new(config: AuthConfig) -> Result<Self, ConfigError> {
        let signer = TokenSigner::new(&config.token)?;
        let decoy = decoy_hash().map_err(|err| ConfigError::Hasher(err.to_string()))?;

        Ok(Self {
            internal: Arc::new(AuthInternal {
                store: config.credential_store,
                notifier: config.notifier,
                signer,
                decoy,
            }),
        })
    }

    /// Register a new principal. No token is issued; the caller signs in afterwards.
    #[instrument(skip_all, fields(username = %request.username))]
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<PrincipalSummary, AuthError> {
        weak_password(&request.password)?;

        let errors = request.validate();
        if !errors.is_empty() {
            debug!(count = errors.len(), "sign-up rejected by validation");
            return Err(AuthError::Validation(errors));
        }

        let SignUpRequest {
            username,
            email,
            password,
            name,
            mut profile,
        } = request;
        profile
            .country
            .get_or_insert_with(|| DEFAULT_COUNTRY.to_string());

        let password_hash = blocking(move || hash_password(&password)).await??;

        let new_principal = NewPrincipal {
            id: PrincipalId(Uuid::new_v4().to_string()),
            username: Username(username),
            email,
            name,
            password_hash,
            profile,
        };

        let principal = self.internal.store.create(new_principal).await?;
        let summary = PrincipalSummary::from(&principal);
        info!(principal_id = %summary.id.0, "principal created");

        self.send_welcome(&summary);

        Ok(summary)
    }

    /// Exchange a username and password for a signed access token.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<AccessToken, AuthError> {
        let principal = self.authenticate(username, password).await?;

        let token = self
            .internal
            .signer
            .issue(&principal.id, &principal.username)?;
        info!(principal_id = %principal.id.0, "access token issued");

        Ok(token)
    }

    /// Check a bearer token's signature and expiry. Purely local: no store access.
    pub fn verify_token(&self, token: &str) -> Result<ClaimSet, AuthError> {
        self.internal.signer.verify(token)
    }

    /// Replace a principal's password after re-checking the current one.
    /// Tokens issued before the change stay valid until they expire.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        weak_password(new_password)?;

        let principal = self.authenticate(username, current_password).await?;

        let new_password = new_password.to_owned();
        let password_hash = blocking(move || hash_password(&new_password)).await??;

        self.internal
            .store
            .update_password_hash(&principal.id, &password_hash)
            .await?;
        info!(principal_id = %principal.id.0, "password changed");

        Ok(())
    }

    // An unknown username still pays for a full verification against the
    // decoy hash, and both failures come back as the same error.
    async fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        let found = self
            .internal
            .store
            .find_by_username(&Username(username.to_owned()))
            .await?;

        let hash = match &found {
            Some(principal) => principal.password_hash.clone(),
            None => self.internal.decoy.clone(),
        };
        let password = password.to_owned();
        let matched = blocking(move || verify_password(&password, &hash)).await?;

        match found {
            Some(principal) if matched => Ok(principal),
            _ => {
                debug!("credentials rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    // Fire and forget: a failed delivery is only logged.
    fn send_welcome(&self, summary: &PrincipalSummary) {
        let message = WelcomeMessage::from(summary);
        let principal_id = summary.id.0.clone();
        let notifier = self.internal.notifier.clone();

        tokio::spawn(async move {
            if let Err(source) = notifier.send_welcome(&message).await {
                let err = AuthError::NotificationFailed { source };
                warn!(principal_id = %principal_id, error = ?err, "welcome message not delivered");
            }
        });
    }
}
