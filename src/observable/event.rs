//! Change events and the listener callback type.

use serde_json::Value;
use std::sync::Arc;
use strum::Display;

/// Callback invoked with `(key, new value, old value)`.
///
/// `None` stands for an absent entry: the new value is `None` for removals,
/// the old value is `None` for creations.
pub type Listener = Arc<dyn Fn(&str, Option<&Value>, Option<&Value>) + Send + Sync>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&str, Option<&Value>, Option<&Value>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What kind of change an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Removed,
}

impl ChangeKind {
    pub fn classify(new_value: Option<&Value>, old_value: Option<&Value>) -> Self {
        match (new_value, old_value) {
            (Some(_), None) => ChangeKind::Created,
            (None, _) => ChangeKind::Removed,
            (Some(_), Some(_)) => ChangeKind::Updated,
        }
    }
}

/// A single change, alive only between scheduling and delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub key: String,
    pub new_value: Option<Value>,
    pub old_value: Option<Value>,
}

impl ChangeEvent {
    pub fn new(key: impl Into<String>, new_value: Option<Value>, old_value: Option<Value>) -> Self {
        Self {
            key: key.into(),
            new_value,
            old_value,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        ChangeKind::classify(self.new_value.as_ref(), self.old_value.as_ref())
    }
}
