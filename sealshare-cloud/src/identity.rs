//! Identity providers.
//!
//! Identity is passed explicitly into key custody and path construction;
//! providers only exist to answer "who is signed in right now" at the edge.

use async_trait::async_trait;
use sealshare_storage::Identity;
use std::sync::Arc;
use tokio::sync::RwLock;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity(&self) -> Option<Identity>;
}

/// Always the same identity (service accounts, tests).
#[derive(Clone, Debug)]
pub struct StaticIdentity(Identity);

impl StaticIdentity {
    pub fn new(identity: Identity) -> Self {
        Self(identity)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_identity(&self) -> Option<Identity> {
        Some(self.0.clone())
    }
}

/// Signed-in user for an interactive session.
#[derive(Clone, Default)]
pub struct SessionIdentity {
    current: Arc<RwLock<Option<Identity>>>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sign_in(&self, identity: Identity) {
        *self.current.write().await = Some(identity);
    }

    pub async fn sign_out(&self) {
        *self.current.write().await = None;
    }

    pub async fn is_signed_in(&self) -> bool {
        self.current.read().await.is_some()
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentity {
    async fn current_identity(&self) -> Option<Identity> {
        self.current.read().await.clone()
    }
}
