//! Error types for the container.

use std::fmt;

/// Container errors
///
/// Represents the failure conditions that can occur while registering,
/// resolving, extending, or autowiring entries. All failures are local and
/// synchronous: nothing is retried or suppressed internally, every error
/// propagates directly to the caller of the triggering operation.
///
/// # Examples
///
/// ```rust
/// use canister::{Container, DiError};
///
/// let container = Container::new();
/// match container.get("database") {
///     Err(DiError::NotFound(id)) => assert_eq!(id, "database"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// Id is not registered and cannot be autowired
    NotFound(String),
    /// An id's own resolution was reached while it was already resolving
    /// (includes the resolution path, repeated id last)
    CyclicDependency(Vec<String>),
    /// Mutation attempted on a resolved entry, or `extend` attempted on a
    /// resolving or protected entry
    Immutable(String),
    /// A definition was expected where a plain value or resolved entry sits
    ExpectedInvokable(String),
    /// Autowiring target cannot be constructed
    NotInstantiable(String),
    /// Autowiring found a required constructor parameter with no type hint
    /// and no default value
    UnresolvableParameter {
        /// Name of the offending parameter
        parameter: String,
        /// Class declaring it
        class: String,
    },
    /// Typed access requested a type the stored value does not have
    TypeMismatch(&'static str),
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotFound(id) => write!(f, "Entry not found: {}", id),
            DiError::CyclicDependency(path) => {
                write!(f, "Cyclic dependency: {}", path.join(" -> "))
            }
            DiError::Immutable(id) => write!(f, "Entry is immutable: {}", id),
            DiError::ExpectedInvokable(what) => {
                write!(f, "Expected an invokable definition: {}", what)
            }
            DiError::NotInstantiable(class) => {
                write!(f, "Class is not instantiable: {}", class)
            }
            DiError::UnresolvableParameter { parameter, class } => {
                write!(f, "Unresolvable parameter `{}` of class {}", parameter, class)
            }
            DiError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for container operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
///
/// # Examples
///
/// ```rust
/// use canister::{DiResult, DiError};
///
/// fn lookup() -> DiResult<String> {
///     Err(DiError::NotFound("missing".to_string()))
/// }
///
/// assert!(lookup().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
