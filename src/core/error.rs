use thiserror::Error;

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Errors originating from the object store gateway.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {path}")]
    NotFound { path: String },

    #[error("PUT failed for path {path}: {reason}")]
    PutFailed { path: String, reason: String },

    #[error("GET failed for path {path}: {reason}")]
    GetFailed { path: String, reason: String },

    #[error("DELETE failed for path {path}: {reason}")]
    DeleteFailed { path: String, reason: String },

    #[error("LIST failed for prefix {prefix}: {reason}")]
    ListFailed { prefix: String, reason: String },

    #[error("presign failed for path {path}: {reason}")]
    PresignFailed { path: String, reason: String },

    #[error("retries exhausted for path {path}")]
    RetriesExhausted { path: String },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True for the one storage outcome that is a normal absence rather than
    /// a backend failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

// ---------------------------------------------------------------------------
// Metadata errors
// ---------------------------------------------------------------------------

/// Errors originating from the metadata sidecar store.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to serialize metadata for {key}: {reason}")]
    Serialize { key: String, reason: String },

    #[error("failed to parse metadata for {key}: {reason}")]
    Deserialize { key: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ---------------------------------------------------------------------------
// Catalog errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the video aggregator.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("object store unavailable: {reason}")]
    UpstreamUnavailable { reason: String },
}

// ---------------------------------------------------------------------------
// API errors
// ---------------------------------------------------------------------------

/// Request-level errors mapped to HTTP responses at the API boundary.
///
/// 5xx variants carry an internal `reason` for logging only; the response
/// body always uses `safe_message` so raw backend errors never leak to
/// clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("invalid request body: {reason}")]
    InvalidBody { reason: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("upstream unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation { .. } => 400,
            ApiError::InvalidBody { .. } => 400,
            ApiError::Unauthorized => 401,
            ApiError::NotFound { .. } => 404,
            ApiError::UpstreamUnavailable { .. } => 502,
            ApiError::Internal { .. } => 500,
        }
    }

    /// Stable error code string for JSON responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "invalid_query",
            ApiError::InvalidBody { .. } => "invalid_body",
            ApiError::Unauthorized => "unauthorized",
            ApiError::NotFound { .. } => "not_found",
            ApiError::UpstreamUnavailable { .. } => "upstream_unavailable",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// Client-facing message. Internal reasons for 5xx errors are replaced
    /// with a fixed safe string.
    pub fn safe_message(&self) -> String {
        match self {
            ApiError::Validation { .. } | ApiError::InvalidBody { .. } => self.to_string(),
            ApiError::Unauthorized => "Unauthorized.".to_string(),
            ApiError::NotFound { what } => format!("{} not found.", what),
            ApiError::UpstreamUnavailable { .. } => {
                "Object storage is currently unavailable.".to_string()
            }
            ApiError::Internal { .. } => "Internal server error.".to_string(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation { field, reason } => ApiError::Validation {
                field: field.to_string(),
                reason,
            },
            CatalogError::UpstreamUnavailable { reason } => {
                ApiError::UpstreamUnavailable { reason }
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { path } => ApiError::NotFound { what: path },
            other => ApiError::UpstreamUnavailable {
                reason: other.to_string(),
            },
        }
    }
}

impl From<MetadataError> for ApiError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::Storage(e) => e.into(),
            other => ApiError::Internal {
                reason: other.to_string(),
            },
        }
    }
}
