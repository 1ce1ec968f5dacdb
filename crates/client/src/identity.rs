//! Identity provider seam.

use std::sync::RwLock;

use domain::models::AuthenticatedUser;

/// Source of the currently signed-in user.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` when signed out.
    fn current_user(&self) -> Option<AuthenticatedUser>;
}

/// Identity held in memory, switchable at runtime.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    user: RwLock<Option<AuthenticatedUser>>,
}

impl StaticIdentity {
    pub fn signed_in(user: AuthenticatedUser) -> Self {
        Self {
            user: RwLock::new(Some(user)),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, user: AuthenticatedUser) {
        if let Ok(mut current) = self.user.write() {
            *current = Some(user);
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut current) = self.user.write() {
            *current = None;
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<AuthenticatedUser> {
        self.user.read().ok().and_then(|u| u.clone())
    }
}
