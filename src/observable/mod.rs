//! Observable containers.
//!
//! An [`Observable`] owns a JSON record or sequence and routes every read and
//! write through its own accessors. Writes that actually change a value are
//! reported to listeners on a background tokio task, never inline with the
//! write.
//!
//! Listeners come in two flavours:
//! - global listeners see every change of the instance
//! - keyed listeners see only changes of one key
//!
//! Subscribing goes through the [`Subscribe`] trait or the type-erased
//! [`observe`] function, so the subscribe capability stays out of the
//! container's own key space.
//!
//! # Example
//! ```ignore
//! let observable = Observable::new(json!({}))?;
//! let subscription = observe(&observable, Some("some".into()), |key, new, old| {
//!     println!("{key}: {old:?} -> {new:?}");
//! })?;
//! observable.set("some", 1)?;
//! observable.flush().await;
//! subscription.unsubscribe();
//! ```

mod container;
mod dispatcher;
pub mod event;
pub mod key;
mod registry;
pub mod subscription;

pub use event::{ChangeEvent, ChangeKind, Listener, listener};
pub use key::Key;
pub use subscription::Subscription;

use crate::config::ObservableConfig;
use crate::error::{ObservableError, Result};
use container::Container;
use dispatcher::Dispatcher;
use log::debug;
use parking_lot::Mutex;
use registry::Registry;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Side channel for registering listeners on an observable.
pub trait Subscribe {
    /// Register `listener` for `key`, or for every key when `key` is `None`.
    fn subscribe(&self, key: Option<Key>, listener: Listener) -> Subscription;
}

struct State {
    container: Container,
    registry: Registry,
}

pub(crate) struct Shared {
    state: Mutex<State>,
    dispatcher: Dispatcher,
    config: ObservableConfig,
}

/// A record or sequence whose changes are delivered to listeners.
///
/// Cloning is cheap and yields another handle to the same container.
#[derive(Clone)]
pub struct Observable {
    shared: Arc<Shared>,
}

impl Observable {
    /// Wrap a JSON object or array. Must be called within a tokio runtime.
    pub fn new(value: Value) -> Result<Self> {
        Self::with_config(value, ObservableConfig::default())
    }

    pub fn with_config(value: Value, config: ObservableConfig) -> Result<Self> {
        let container = Container::from_value(value)?;
        let dispatcher = Dispatcher::spawn(&config)?;
        debug!(
            "Created observable {} with {} entries (snapshot policy: {})",
            if container.is_sequence() { "sequence" } else { "record" },
            container.len(),
            config.snapshot_policy
        );

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    container,
                    registry: Registry::default(),
                }),
                dispatcher,
                config,
            }),
        })
    }

    /// Wrap anything that serializes to a JSON object or array.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Self::new(serde_json::to_value(value)?)
    }

    pub fn config(&self) -> &ObservableConfig {
        &self.shared.config
    }

    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        self.shared.state.lock().container.get(&key.into()).cloned()
    }

    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.shared.state.lock().container.get(&key.into()).is_some()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        self.shared.state.lock().container.keys()
    }

    pub fn values(&self) -> Vec<Value> {
        self.shared.state.lock().container.values()
    }

    pub fn is_sequence(&self) -> bool {
        self.shared.state.lock().container.is_sequence()
    }

    pub fn is_record(&self) -> bool {
        !self.is_sequence()
    }

    /// Snapshot of the current container.
    pub fn to_value(&self) -> Value {
        self.shared.state.lock().container.to_value()
    }

    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_value())?)
    }

    /// Write `value` at `key`, notifying listeners if the value changed.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        self.mutate(|container| Ok(((), container.set(&key, value)?)))
    }

    /// Remove `key` and return its value. Absent keys are a no-op.
    pub fn delete(&self, key: impl Into<Key>) -> Result<Option<Value>> {
        let key = key.into();
        self.mutate(|container| container.delete(&key))
    }

    /// Append to a sequence and return the new length.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        let value = value.into();
        self.mutate(|container| {
            container.mutate_sequence("push", |items| {
                items.push(value);
                items.len()
            })
        })
    }

    pub fn pop(&self) -> Result<Option<Value>> {
        self.mutate(|container| container.mutate_sequence("pop", Vec::pop))
    }

    /// Remove the first element, shifting the rest down by one.
    pub fn shift(&self) -> Result<Option<Value>> {
        self.mutate(|container| {
            container.mutate_sequence("shift", |items| {
                (!items.is_empty()).then(|| items.remove(0))
            })
        })
    }

    /// Prepend to a sequence and return the new length.
    pub fn unshift(&self, value: impl Into<Value>) -> Result<usize> {
        let value = value.into();
        self.mutate(|container| {
            container.mutate_sequence("unshift", |items| {
                items.insert(0, value);
                items.len()
            })
        })
    }

    /// Insert at `index`, clamped to the sequence length.
    pub fn insert(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.mutate(|container| {
            container.mutate_sequence("insert", |items| {
                let index = index.min(items.len());
                items.insert(index, value);
            })
        })
    }

    pub fn remove(&self, index: usize) -> Result<Option<Value>> {
        self.mutate(|container| {
            container.mutate_sequence("remove", |items| {
                (index < items.len()).then(|| items.remove(index))
            })
        })
    }

    /// Replace `delete_count` elements starting at `start` with `items`.
    ///
    /// Out of range arguments are clamped. Returns the removed elements.
    pub fn splice(
        &self,
        start: usize,
        delete_count: usize,
        items: impl IntoIterator<Item = Value>,
    ) -> Result<Vec<Value>> {
        self.mutate(|container| {
            container.mutate_sequence("splice", |current| {
                let start = start.min(current.len());
                let end = start.saturating_add(delete_count).min(current.len());
                current.splice(start..end, items).collect()
            })
        })
    }

    /// Wait until every change scheduled before this call has been delivered.
    pub async fn flush(&self) {
        self.shared.dispatcher.flush().await;
    }

    pub fn listener_count(&self) -> usize {
        self.shared.state.lock().registry.len()
    }

    /// Apply a container mutation and schedule its change events.
    ///
    /// Listener snapshots are taken and queued under the state lock, so the
    /// delivery order matches the mutation order.
    fn mutate<R>(
        &self,
        op: impl FnOnce(&mut Container) -> Result<(R, Vec<ChangeEvent>)>,
    ) -> Result<R> {
        let mut state = self.shared.state.lock();
        let (result, events) = op(&mut state.container)?;
        for event in events {
            let listeners = state.registry.matching(&event.key);
            self.shared.dispatcher.schedule(event, listeners);
        }
        Ok(result)
    }
}

impl Subscribe for Observable {
    fn subscribe(&self, key: Option<Key>, listener: Listener) -> Subscription {
        let key = key.map(|k| k.to_string());
        let registration = self
            .shared
            .state
            .lock()
            .registry
            .register(key.clone(), listener);
        debug!(
            "Registered listener {} for {}",
            registration.id(),
            key.as_deref().unwrap_or("all keys")
        );
        Subscription::new(Arc::downgrade(&self.shared), key, registration)
    }
}

impl Serialize for Observable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match &self.shared.state.lock().container {
            Container::Record(map) => map.serialize(serializer),
            Container::Sequence(items) => items.serialize(serializer),
        }
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.to_value())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Register `callback` on `target`, for `key` or for every key.
///
/// Fails with [`ObservableError::NotObservable`] when `target` is not an
/// [`Observable`].
pub fn observe<F>(target: &dyn Any, key: Option<Key>, callback: F) -> Result<Subscription>
where
    F: Fn(&str, Option<&Value>, Option<&Value>) + Send + Sync + 'static,
{
    let observable = target
        .downcast_ref::<Observable>()
        .ok_or(ObservableError::NotObservable)?;
    Ok(observable.subscribe(key, listener(callback)))
}

/// Whether `value` is an [`Observable`].
pub fn is_observable(value: &dyn Any) -> bool {
    value.is::<Observable>()
}
