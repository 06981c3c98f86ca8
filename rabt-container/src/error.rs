//! Error types for Rabt container operations.
//!
//! Three families, mirroring how failures are meant to be handled:
//! - [`RabtError::NotFound`] is propagated to the caller unchanged, always.
//! - The container family ([`RabtError::Container`], [`RabtError::Binding`],
//!   [`RabtError::ConstructionFailed`]) covers everything that went wrong
//!   while a known entry was being produced.
//! - [`RabtError::Configuration`] and [`RabtError::AlreadyRegistered`] are
//!   raised at the call that broke a precondition.

use std::fmt;

use rabt_support::rendering::render_list;

/// Main error type for all Rabt operations.
#[derive(Debug, thiserror::Error)]
pub enum RabtError {
    /// No binding, no instance and no instantiable type for the identifier.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// A binding referenced a type that does not exist.
    #[error("{}", .0)]
    Binding(BindingError),

    /// Resolution failed for a known entry.
    #[error(transparent)]
    Container(ContainerError),

    /// Type metadata or factory arguments did not line up.
    ///
    /// Raised by descriptors and [`Arguments`](crate::descriptor::Arguments);
    /// the autowiring engine wraps it into [`RabtError::Container`] before it
    /// reaches callers.
    #[error("{0}")]
    Introspection(String),

    /// A user factory returned its own error.
    #[error("Failed to construct [{id}]: {source}")]
    ConstructionFailed {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Dependency was already registered (when override is disabled).
    #[error("{}", .0)]
    AlreadyRegistered(AlreadyRegisteredError),

    /// Invalid use of the container API.
    #[error("{}", .0)]
    Configuration(ConfigurationError),
}

impl RabtError {
    /// Builds a [`RabtError::NotFound`] with only a message.
    pub fn not_found(message: impl Into<String>) -> Self {
        RabtError::NotFound(NotFoundError {
            message: message.into(),
            suggestions: Vec::new(),
        })
    }

    /// Builds a [`RabtError::Container`] without a cause.
    pub fn container(message: impl Into<String>) -> Self {
        RabtError::Container(ContainerError {
            message: message.into(),
            source: None,
        })
    }

    /// Builds a [`RabtError::Container`] chaining `cause`.
    pub fn container_caused_by(message: impl Into<String>, cause: RabtError) -> Self {
        RabtError::Container(ContainerError {
            message: message.into(),
            source: Some(Box::new(cause)),
        })
    }

    /// Wraps an arbitrary error raised inside a user factory.
    pub fn construction(
        id: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        RabtError::ConstructionFailed {
            id: id.into(),
            source: source.into(),
        }
    }

    /// Returns `true` for [`RabtError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, RabtError::NotFound(_))
    }

    /// Returns `true` for the container family of errors.
    pub fn is_container_error(&self) -> bool {
        matches!(
            self,
            RabtError::Container(_) | RabtError::Binding(_) | RabtError::ConstructionFailed { .. }
        )
    }
}

/// Error when nothing can produce the requested identifier.
#[derive(Debug)]
pub struct NotFoundError {
    pub message: String,
    /// Registered identifiers that look like the requested one.
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of: {}", render_list(&self.suggestions, ", "))?;
        }
        Ok(())
    }
}

/// Error when a binding names a type the container cannot instantiate.
#[derive(Debug)]
pub struct BindingError {
    pub abstract_id: String,
    pub concrete: String,
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Class '{}' does not exist for binding [{}].",
            self.concrete, self.abstract_id
        )?;
        write!(
            f,
            "\n  Hint: register a descriptor for '{}' with register_type() or inventory::submit!",
            self.concrete
        )
    }
}

/// Generic resolution failure, optionally chaining the underlying cause.
#[derive(Debug)]
pub struct ContainerError {
    pub message: String,
    pub source: Option<Box<RabtError>>,
}

impl ContainerError {
    /// The chained cause, if any.
    pub fn cause(&self) -> Option<&RabtError> {
        self.source.as_deref()
    }
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ContainerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Error when trying to register a dependency that already exists.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub abstract_id: String,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency already registered: {}", self.abstract_id)?;
        write!(
            f,
            "\n  Hint: enable allow_override in the container settings to replace bindings"
        )
    }
}

/// Misuse of the container API, reported at the offending call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Identifiers must be non-empty.
    InvalidKey,
    /// The ambient container was already created or set.
    GlobalAlreadySet,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::InvalidKey => write!(f, "Key must be a non-empty identifier."),
            ConfigurationError::GlobalAlreadySet => {
                write!(f, "The global container instance is already set.")
            }
        }
    }
}

/// Convenient Result type for Rabt operations.
pub type Result<T> = std::result::Result<T, RabtError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn not_found_display_with_suggestions() {
        let err = RabtError::NotFound(NotFoundError {
            message: "No entry found for [Loger].".into(),
            suggestions: vec!["Logger".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("No entry found for [Loger]."));
        assert!(msg.contains("Did you mean one of: Logger"));
    }

    #[test]
    fn binding_error_display() {
        let err = RabtError::Binding(BindingError {
            abstract_id: "Logger".into(),
            concrete: "MissingLogger".into(),
        });

        let msg = format!("{err}");
        assert!(msg.contains("Class 'MissingLogger' does not exist for binding [Logger]."));
        assert!(err.is_container_error());
        assert!(!err.is_not_found());
    }

    #[test]
    fn container_error_chains_cause() {
        let err = RabtError::container_caused_by(
            "Error while retrieving the entry 'x': boom",
            RabtError::container("boom"),
        );

        assert_eq!(err.to_string(), "Error while retrieving the entry 'x': boom");
        let source = err.source().expect("cause is chained");
        assert_eq!(source.to_string(), "boom");
    }

    #[test]
    fn construction_failed_wraps_foreign_error() {
        let io = std::io::Error::other("disk on fire");
        let err = RabtError::construction("db", io);

        assert!(err.to_string().contains("Failed to construct [db]: disk on fire"));
        assert!(err.is_container_error());
    }

    #[test]
    fn configuration_error_display() {
        let err = RabtError::Configuration(ConfigurationError::GlobalAlreadySet);
        assert!(err.to_string().contains("already set"));
    }
}
