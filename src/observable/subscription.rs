//! Unsubscribe handles.

use super::Shared;
use super::registry::Registration;
use std::fmt;
use std::sync::Weak;

/// Handle returned by `observe`, removes exactly one registration.
///
/// Dropping the handle does not unsubscribe, and the handle never keeps the
/// observable alive.
pub struct Subscription {
    shared: Weak<Shared>,
    key: Option<String>,
    registration: Registration,
}

impl Subscription {
    pub(crate) fn new(shared: Weak<Shared>, key: Option<String>, registration: Registration) -> Self {
        Self {
            shared,
            key,
            registration,
        }
    }

    /// Remove the registration. Calling this again is a no-op.
    pub fn unsubscribe(&self) {
        if !self.registration.deactivate() {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            shared
                .state
                .lock()
                .registry
                .remove(self.key.as_deref(), self.registration.id());
        }
    }

    pub fn is_active(&self) -> bool {
        self.registration.is_active()
    }

    /// The observed key, or `None` for a global subscription.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.registration.id())
            .field("key", &self.key)
            .field("active", &self.is_active())
            .finish()
    }
}
