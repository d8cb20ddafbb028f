//! Listener registry: global listeners plus listeners keyed by entry.

use super::event::Listener;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) type RegistrationId = u64;

/// One `observe` call. Cloned into every notification snapshot it matches.
#[derive(Clone)]
pub(crate) struct Registration {
    id: RegistrationId,
    listener: Listener,
    active: Arc<AtomicBool>,
}

impl Registration {
    pub(crate) fn id(&self) -> RegistrationId {
        self.id
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Mark the registration as removed. Returns `false` if it already was.
    pub(crate) fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::SeqCst)
    }

    pub(crate) fn call(&self, key: &str, new_value: Option<&Value>, old_value: Option<&Value>) {
        (self.listener)(key, new_value, old_value);
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    next_id: RegistrationId,
    global: Vec<Registration>,
    keyed: HashMap<String, Vec<Registration>>,
}

impl Registry {
    pub(crate) fn register(&mut self, key: Option<String>, listener: Listener) -> Registration {
        self.next_id += 1;
        let registration = Registration {
            id: self.next_id,
            listener,
            active: Arc::new(AtomicBool::new(true)),
        };

        match key {
            Some(key) => self.keyed.entry(key).or_default().push(registration.clone()),
            None => self.global.push(registration.clone()),
        }

        registration
    }

    /// Drop a registration. Returns whether anything was removed.
    pub(crate) fn remove(&mut self, key: Option<&str>, id: RegistrationId) -> bool {
        match key {
            None => {
                let before = self.global.len();
                self.global.retain(|r| r.id != id);
                before != self.global.len()
            }
            Some(key) => {
                let Some(registrations) = self.keyed.get_mut(key) else {
                    return false;
                };
                let before = registrations.len();
                registrations.retain(|r| r.id != id);
                let removed = before != registrations.len();
                if registrations.is_empty() {
                    self.keyed.remove(key);
                }
                removed
            }
        }
    }

    /// Listeners interested in `key`: global ones first, then keyed ones.
    pub(crate) fn matching(&self, key: &str) -> Vec<Registration> {
        let mut matched = self.global.clone();
        if let Some(keyed) = self.keyed.get(key) {
            matched.extend(keyed.iter().cloned());
        }
        matched
    }

    pub(crate) fn len(&self) -> usize {
        self.global.len() + self.keyed.values().map(Vec::len).sum::<usize>()
    }
}
