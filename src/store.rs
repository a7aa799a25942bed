use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    types::{HashedPassword, NewPrincipal, Principal, PrincipalId, Username},
};

/// Persistence for admin principals. Implementations own their own locking,
/// timeouts and uniqueness constraints.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Exact, case-sensitive lookup. `Ok(None)` when no principal has that username.
    async fn find_by_username(&self, username: &Username)
        -> Result<Option<Principal>, StoreError>;

    /// Persist a new principal. Fails with [`StoreError::DuplicateUsername`] or
    /// [`StoreError::DuplicateEmail`] when either is already taken.
    async fn create(&self, principal: NewPrincipal) -> Result<Principal, StoreError>;

    /// Replace the stored hash of an existing principal.
    async fn update_password_hash(
        &self,
        id: &PrincipalId,
        password_hash: &HashedPassword,
    ) -> Result<(), StoreError>;
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// A process-local store keyed by username. Handy for demos and tests.
#[derive(Default)]
pub struct MemoryStore {
    principals: RwLock<HashMap<Username, Principal>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.principals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.principals.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Principal>, StoreError> {
        Ok(self.principals.read().await.get(username).cloned())
    }

    async fn create(&self, principal: NewPrincipal) -> Result<Principal, StoreError> {
        let mut principals = self.principals.write().await;

        if principals.contains_key(&principal.username) {
            return Err(StoreError::DuplicateUsername);
        }
        if principals.values().any(|p| p.email == principal.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = unix_now();
        let stored = Principal {
            id: principal.id,
            username: principal.username,
            email: principal.email,
            name: principal.name,
            password_hash: principal.password_hash,
            profile: principal.profile,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        principals.insert(stored.username.clone(), stored.clone());

        Ok(stored)
    }

    async fn update_password_hash(
        &self,
        id: &PrincipalId,
        password_hash: &HashedPassword,
    ) -> Result<(), StoreError> {
        let mut principals = self.principals.write().await;

        let principal = principals
            .values_mut()
            .find(|p| &p.id == id)
            .ok_or(StoreError::NotFound)?;
        principal.password_hash = password_hash.clone();
        principal.updated_at = unix_now();

        Ok(())
    }
}
