pub type Result<T> = std::result::Result<T, Error>;

/// Error type handlers return from `init`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown handler `{name}` (available: {available})")]
    UnknownHandler { name: String, available: String },

    #[error("no handler selected")]
    NoHandlerSelected,

    #[error("handler `{name}` failed to initialize: {source}")]
    HandlerInit {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("`concurrency` must be a positive integer")]
    InvalidConcurrency,

    #[error("requester not started")]
    NotStarted,

    #[error("requester is already running")]
    AlreadyStarted,

    #[error("requester already finished a run; create a new one to run again")]
    AlreadyFinished,

    #[error("worker reports lost: expected {expected}, received {received}")]
    MissingReports { expected: usize, received: usize },

    #[error("invalid handler configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("endpoint list is empty")]
    NoEndpoints,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
