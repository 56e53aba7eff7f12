use std::fmt;

/// Unified error type for the capcore crate.
///
/// Platform failures are forwarded verbatim and tagged with the label of the
/// component they surfaced through. Caller errors are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// Invalid or empty parameters supplied by the caller.
    InvalidParameters {
        parameters: Vec<String>,
        origin: String,
    },
    /// A platform adapter failed; the message is carried unchanged.
    Platform { origin: String, message: String },
    /// The platform refused authorization outright.
    Denied { origin: String },
    /// A field failed validation.
    Validation(ValidationError),
    /// Internal error.
    Internal(String),
}

impl WorkerError {
    pub fn invalid_parameters(parameters: &[&str], origin: &str) -> Self {
        WorkerError::InvalidParameters {
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            origin: origin.to_string(),
        }
    }

    pub fn platform(origin: &str, message: impl Into<String>) -> Self {
        WorkerError::Platform {
            origin: origin.to_string(),
            message: message.into(),
        }
    }

    pub fn denied(origin: &str) -> Self {
        WorkerError::Denied {
            origin: origin.to_string(),
        }
    }
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::InvalidParameters { parameters, origin } => {
                write!(f, "invalid parameters [{}] in {origin}", parameters.join(", "))
            }
            WorkerError::Platform { origin, message } => {
                write!(f, "platform error in {origin}: {message}")
            }
            WorkerError::Denied { origin } => write!(f, "authorization denied in {origin}"),
            WorkerError::Validation(error) => write!(f, "{error}"),
            WorkerError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for WorkerError {}

impl From<ValidationError> for WorkerError {
    fn from(error: ValidationError) -> Self {
        WorkerError::Validation(error)
    }
}

/// Validation failure for a single field. Every variant names the field as
/// declared in its [`crate::validation::fields::FieldSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NoValue { field: String },
    Required { field: String },
    TooShort { field: String },
    TooLong { field: String },
    TooLow { field: String },
    TooHigh { field: String },
    Invalid { field: String },
    TooWeak { field: String },
}

impl ValidationError {
    /// The declared name of the failing field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::NoValue { field }
            | ValidationError::Required { field }
            | ValidationError::TooShort { field }
            | ValidationError::TooLong { field }
            | ValidationError::TooLow { field }
            | ValidationError::TooHigh { field }
            | ValidationError::Invalid { field }
            | ValidationError::TooWeak { field } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoValue { field } => write!(f, "{field}: missing value"),
            ValidationError::Required { field } => write!(f, "{field}: required"),
            ValidationError::TooShort { field } => write!(f, "{field}: too short"),
            ValidationError::TooLong { field } => write!(f, "{field}: too long"),
            ValidationError::TooLow { field } => write!(f, "{field}: too low"),
            ValidationError::TooHigh { field } => write!(f, "{field}: too high"),
            ValidationError::Invalid { field } => write!(f, "{field}: invalid"),
            ValidationError::TooWeak { field } => write!(f, "{field}: too weak"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result type alias using [`WorkerError`].
pub type WorkerResult<T> = Result<T, WorkerError>;
