use conflow_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure surfaced by the mutation engine maps to one of these kinds.
/// Each kind carries a stable code that is safe to put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    // Precondition
    /// The request itself is malformed (e.g. an empty or unusable entity id)
    InvalidRequest,
    /// The persisted document is invalid or not a mapping
    ConfigInvalid,
    /// The document text could not be parsed
    Parse,

    // Conflict
    /// The requested entity id already exists
    DuplicateId,
    /// The persisted document moved between read and write
    ConcurrentModification,
    /// Raised by a CAS writer when the expected base hash no longer matches
    BaseHashMismatch,

    // Unavailable state
    /// The document exists but no fingerprint could be derived for it
    HashUnavailable,

    // Infrastructure
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

/// Coarse classification used to decide how a caller should react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Detected before any mutation; fix the input or the document first
    Precondition,
    /// Another writer acted first; re-fetch and resubmit
    Conflict,
    /// CAS cannot be attempted safely against the current state
    UnavailableState,
    /// Collaborator failure (filesystem, serializer)
    Infrastructure,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidRequest => "INVALID_REQUEST",
            ExErrorKind::ConfigInvalid => "CONFIG_INVALID",
            ExErrorKind::Parse => "PARSE",
            ExErrorKind::DuplicateId => "DUPLICATE_ID",
            ExErrorKind::ConcurrentModification => "CONCURRENT_MODIFICATION",
            ExErrorKind::BaseHashMismatch => "BASE_HASH_MISMATCH",
            ExErrorKind::HashUnavailable => "HASH_UNAVAILABLE",
            ExErrorKind::Io => "IO",
            ExErrorKind::Serialization => "SERIALIZATION",
            ExErrorKind::Persistence => "PERSISTENCE",
            ExErrorKind::Internal => "INTERNAL",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ExErrorKind::InvalidRequest | ExErrorKind::ConfigInvalid | ExErrorKind::Parse => {
                ErrorCategory::Precondition
            }
            ExErrorKind::DuplicateId
            | ExErrorKind::ConcurrentModification
            | ExErrorKind::BaseHashMismatch => ErrorCategory::Conflict,
            ExErrorKind::HashUnavailable => ErrorCategory::UnavailableState,
            ExErrorKind::Io
            | ExErrorKind::Serialization
            | ExErrorKind::Persistence
            | ExErrorKind::Internal => ErrorCategory::Infrastructure,
        }
    }
}

/// Canonical structured error type
///
/// Carries a stable kind plus context (operation, entity id, correlation
/// ids) for programmatic handling and debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Conflicts are resolved by re-fetching and resubmitting; nothing else is.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Conflict
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the trace ID context, if any
    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Errors raised by the document layer (parsing and serializing JSON text)
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Text is not a valid JSON document
    #[error("Invalid document text at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// Document could not be rendered to text
    #[error("Failed to serialize document: {0}")]
    Serialize(String),
}

impl DocumentError {
    pub fn from_parse(err: serde_json::Error) -> Self {
        DocumentError::Parse {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

impl From<DocumentError> for ExError {
    fn from(err: DocumentError) -> Self {
        let kind = match &err {
            DocumentError::Parse { .. } => ExErrorKind::Parse,
            DocumentError::Serialize(_) => ExErrorKind::Serialization,
        };
        ExError::new(kind).with_message(err.to_string())
    }
}

impl From<std::io::Error> for ExError {
    fn from(err: std::io::Error) -> Self {
        ExError::new(ExErrorKind::Io).with_message(err.to_string())
    }
}
