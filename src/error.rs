use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ObservableError {
    #[error("Observable::observe can be called only on Observable instances")]
    NotObservable,

    #[error("Cannot wrap a {0} value, expected an object or an array")]
    NotAContainer(&'static str),

    #[error("Operation '{0}' requires a sequence container")]
    NotASequence(&'static str),

    #[error("Key '{0}' is not a valid sequence index")]
    InvalidIndex(String),

    #[error("No tokio runtime available to deliver notifications")]
    NoRuntime,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ObservableError>;
