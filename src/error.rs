use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `turnwise`.
///
/// Each stage of a turn (parse, resolve, dispatch, load/save, plan generation)
/// reports through its own variant so the driver can decide whether to
/// apologise, persist, or surface the failure for a retry.
#[derive(Debug, Error)]
pub enum TurnError {
    // ── Planner output parsing ──────────────────────────────────────────
    #[error("plan: {0}")]
    Plan(#[from] PlanError),

    // ── Handler registration / lookup ───────────────────────────────────
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),

    // ── Plan dispatch ───────────────────────────────────────────────────
    #[error("execution: {0}")]
    Execution(#[from] ExecutionError),

    // ── Turn state ──────────────────────────────────────────────────────
    #[error("state: {0}")]
    State(#[from] StateError),

    // ── Storage backend ─────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Planner collaborator ────────────────────────────────────────────
    #[error("planner: {0}")]
    Planner(#[from] PlannerError),

    // ── Config ──────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TurnError {
    /// Storage failures must not trigger a second save attempt.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Errors the surrounding application may retry with its own backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Planner(_))
    }

    /// Bad planner output, detected before any command ran.
    pub fn is_malformed_command(&self) -> bool {
        matches!(self, Self::Plan(_))
    }

    /// Index of the command that failed, when the failure is tied to one.
    pub fn command_index(&self) -> Option<usize> {
        match self {
            Self::Plan(PlanError::MalformedCommand { index, .. }) => Some(*index),
            Self::Execution(error) => Some(error.index()),
            _ => None,
        }
    }
}

// ─── Command / plan parsing errors ──────────────────────────────────────────

/// A single raw command record could not be turned into a `PredictedCommand`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command record must be an object")]
    NotAnObject,

    #[error("command record is missing the `type` discriminant")]
    MissingType,

    #[error("unrecognized command type: {tag}")]
    UnknownType { tag: String },

    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

impl CommandError {
    /// Name of the offending field, if the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingType | Self::UnknownType { .. } => Some("type"),
            Self::MissingField { field } | Self::InvalidField { field, .. } => Some(field),
            Self::NotAnObject => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("malformed command at index {index}: {source}")]
    MalformedCommand {
        index: usize,
        #[source]
        source: CommandError,
    },

    #[error("plan must be a command array or an object with a `commands` array")]
    InvalidShape,

    #[error("invalid plan JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ─── Registry errors ────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("handler already registered: {name}")]
    DuplicateHandler { name: String },

    #[error("no handler registered for action: {name}")]
    UnknownAction { name: String },

    #[error("no function registered: {name}")]
    UnknownFunction { name: String },

    #[error("handler name cannot be empty")]
    EmptyName,
}

// ─── Execution errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("unknown action `{action}` at command {index}")]
    UnknownAction { index: usize, action: String },

    #[error("handler `{action}` failed at command {index}: {source}")]
    Handler {
        index: usize,
        action: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ExecutionError {
    pub fn index(&self) -> usize {
        match self {
            Self::UnknownAction { index, .. } | Self::Handler { index, .. } => *index,
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::UnknownAction { action, .. } | Self::Handler { action, .. } => action,
        }
    }
}

// ─── State errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("unknown state layer: {0}")]
    UnknownLayer(String),

    #[error("invalid scope name: {0}")]
    InvalidScope(String),

    #[error("key {0} is reserved")]
    ReservedKey(String),

    #[error("layer {layer} is not persisted and cannot be deleted")]
    NotPersistent { layer: String },

    #[error("two state layers resolve to the same record {key}")]
    KeyCollision { key: String },

    #[error("stored record for {key} is not an object")]
    CorruptRecord { key: String },

    #[error("history record is invalid: {0}")]
    History(String),
}

// ─── Storage errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{backend} backend failed: {message}")]
    Backend { backend: String, message: String },

    #[error("serialization failed for {key}: {message}")]
    Serialization { key: String, message: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn backend(backend: &str, message: impl std::fmt::Display) -> Self {
        Self::Backend {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        Self::backend("sqlite", error)
    }
}

// ─── Planner errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planner unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

// ─── Config errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
