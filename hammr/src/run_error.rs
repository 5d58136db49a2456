use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e) | Self::RuntimeError(e) => e,
        }
    }

    /// Sorts a harness error into input vs runtime failures.
    pub fn from_core(err: hammr_core::Error) -> Self {
        use hammr_core::Error as CoreError;

        let kind = match &err {
            CoreError::UnknownHandler { .. }
            | CoreError::NoHandlerSelected
            | CoreError::InvalidConcurrency
            | CoreError::Config(_)
            | CoreError::NoEndpoints => Self::InvalidInput,

            CoreError::HandlerInit { .. }
            | CoreError::NotStarted
            | CoreError::AlreadyStarted
            | CoreError::AlreadyFinished
            | CoreError::MissingReports { .. }
            | CoreError::Io(_) => Self::RuntimeError,
        };
        kind(anyhow::Error::new(err))
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(e) | Self::RuntimeError(e) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}
