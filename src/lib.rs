//! Observable key-value containers.
//!
//! Wraps a JSON record or sequence so that every change of a value is
//! delivered asynchronously to global or per-key listeners.

pub mod config;
pub mod error;
pub mod observable;

pub use config::{ObservableConfig, SnapshotPolicy};
pub use error::{ObservableError, Result};
pub use observable::{
    ChangeEvent, ChangeKind, Key, Listener, Observable, Subscribe, Subscription, is_observable,
    listener, observe,
};
