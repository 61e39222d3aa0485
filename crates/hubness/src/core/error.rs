//! The errors that can arise while computing or persisting neighbor sets.

/// Errors from neighbor-set computation, statistics and persistence.
///
/// Configuration problems are reported before any work is done, I/O problems
/// are reported after the failed operation has been rolled back, and
/// consistency problems are only ever produced by the `validate` methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubnessError {
    /// Invalid parameters or preconditions, e.g. `k` out of range, a missing
    /// distance matrix or too few classes.
    Configuration(String),
    /// A file could not be read or written, or its contents were malformed.
    Io(String),
    /// A derived structure violates one of its invariants.
    Consistency(String),
}

impl HubnessError {
    /// Shorthand for a `Configuration` error.
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Shorthand for an `Io` error.
    pub(crate) fn io<S: Into<String>>(msg: S) -> Self {
        Self::Io(msg.into())
    }

    /// Shorthand for a `Consistency` error.
    pub(crate) fn consistency<S: Into<String>>(msg: S) -> Self {
        Self::Consistency(msg.into())
    }

    /// Whether this is a `Configuration` error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Whether this is an `Io` error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Whether this is a `Consistency` error.
    #[must_use]
    pub const fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }
}

impl std::fmt::Display for HubnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Consistency(msg) => write!(f, "data consistency error: {msg}"),
        }
    }
}

impl std::error::Error for HubnessError {}

impl From<std::io::Error> for HubnessError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<HubnessError> for String {
    fn from(e: HubnessError) -> Self {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::HubnessError;

    #[test]
    fn display() {
        let e = HubnessError::config("k must be positive");
        assert!(e.is_configuration());
        assert_eq!(e.to_string(), "configuration error: k must be positive");

        let e = HubnessError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(e.is_io());

        let s: String = HubnessError::consistency("self in own list").into();
        assert_eq!(s, "data consistency error: self in own list");
    }
}
