//! Error taxonomy for trail reconciliation.
//!
//! Every variant is absorbed by the navigation controller; none of them is
//! allowed to reach the host page. The worst visible effect is a stale or
//! shorter trail.

/// Failure while reconciling the trail with one of its surfaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrailError {
    /// A leaf token or the current dashboard has no directory match.
    #[error("dashboard {id:?} not found in directory")]
    NotFound { id: String },

    /// The `breadcrumb` query parameter could not be parsed.
    #[error("malformed breadcrumb encoding {raw:?}: {reason}")]
    MalformedEncoding { raw: String, reason: String },

    /// The session storage slot is missing or inaccessible.
    #[error("session storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// The directory or org lookup failed.
    #[error("upstream lookup failed: {message}")]
    UpstreamFailure { message: String },
}

/// Coarse category of a `TrailError`, used in event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrailErrorKind {
    NotFound,
    MalformedEncoding,
    StorageUnavailable,
    UpstreamFailure,
}

impl TrailErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::MalformedEncoding => "malformed_encoding",
            Self::StorageUnavailable => "storage_unavailable",
            Self::UpstreamFailure => "upstream_failure",
        }
    }
}

impl std::fmt::Display for TrailErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TrailError {
    pub fn kind(&self) -> TrailErrorKind {
        match self {
            Self::NotFound { .. } => TrailErrorKind::NotFound,
            Self::MalformedEncoding { .. } => TrailErrorKind::MalformedEncoding,
            Self::StorageUnavailable { .. } => TrailErrorKind::StorageUnavailable,
            Self::UpstreamFailure { .. } => TrailErrorKind::UpstreamFailure,
        }
    }

    pub fn malformed(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedEncoding {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            message: message.into(),
        }
    }
}
