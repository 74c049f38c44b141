//! Entry model: parameter values, service definitions, and their identities.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::error::{DiError, DiResult};

/// Type-erased shared value stored in and returned from the container.
///
/// Parameters, resolved services, and protected definitions all travel as
/// `AnyValue`. Use [`cast`] (or [`Container::get_as`](crate::Container::get_as))
/// to recover the concrete type.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

type DefinitionFn = dyn for<'a> Fn(&'a Container) -> DiResult<AnyValue> + Send + Sync;

/// Identity of a definition, keyed by its closure allocation address.
///
/// Tag membership (factory/protected) is identity-based because definitions
/// are closures and cannot be compared by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DefId(usize);

/// A service definition: the invokable recipe that produces a value when
/// given the container.
///
/// Definitions are cheap to clone (shared handle) and identity-comparable
/// via [`Definition::ptr_eq`]. A definition receives `&Container` when
/// invoked, so it can resolve further entries mid-construction; re-entrant
/// resolution of the id being constructed is caught as a
/// [`CyclicDependency`](crate::DiError::CyclicDependency).
///
/// # Examples
///
/// ```rust
/// use canister::{Container, Definition, Entry};
///
/// let container = Container::new();
/// container.add("greeting", Entry::value("hello".to_string())).unwrap();
/// container.add(
///     "shout",
///     Definition::new(|c: &Container| {
///         let greeting = c.get_as::<String>("greeting")?;
///         Ok(greeting.to_uppercase())
///     }),
/// ).unwrap();
///
/// assert_eq!(*container.get_as::<String>("shout").unwrap(), "HELLO");
/// ```
#[derive(Clone)]
pub struct Definition {
    f: Arc<DefinitionFn>,
}

impl Definition {
    /// Wraps a closure as a definition.
    ///
    /// The closure's return value is type-erased into an [`AnyValue`];
    /// resolution errors from nested `get` calls propagate with `?`.
    pub fn new<T, F>(f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&'a Container) -> DiResult<T> + Send + Sync + 'static,
    {
        Definition {
            f: Arc::new(move |c: &Container| Ok(Arc::new(f(c)?) as AnyValue)),
        }
    }

    /// Wraps a closure that already produces a type-erased [`AnyValue`],
    /// stored without re-wrapping. This is the constructor for forwarding
    /// definitions (`|c| c.get("other")`) and for composition over erased
    /// products, as `extend` does internally.
    pub fn erased<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a Container) -> DiResult<AnyValue> + Send + Sync + 'static,
    {
        Definition { f: Arc::new(f) }
    }

    /// Invokes the definition with the container.
    pub fn call(&self, container: &Container) -> DiResult<AnyValue> {
        (self.f)(container)
    }

    /// Identity comparison: do both handles point at the same definition?
    pub fn ptr_eq(a: &Definition, b: &Definition) -> bool {
        a.id() == b.id()
    }

    pub(crate) fn id(&self) -> DefId {
        DefId(Arc::as_ptr(&self.f) as *const () as usize)
    }

    /// Boxes the definition handle itself as a container value. This is what
    /// `get` returns for protected definitions.
    pub(crate) fn as_value(&self) -> AnyValue {
        Arc::new(self.clone())
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Definition({:#x})", self.id().0)
    }
}

/// What `add` accepts: a plain parameter value or a service definition.
///
/// The variant is fixed at registration time, so retrieval never has to
/// guess whether a stored value "looks invokable".
///
/// # Examples
///
/// ```rust
/// use canister::{Container, Definition, Entry};
///
/// let container = Container::new();
/// container.add("port", Entry::value(8080u16)).unwrap();
/// container.add("url", Definition::new(|c: &Container| {
///     let port = c.get_as::<u16>("port")?;
///     Ok(format!("localhost:{}", port))
/// })).unwrap();
///
/// assert_eq!(*container.get_as::<u16>("port").unwrap(), 8080);
/// assert_eq!(*container.get_as::<String>("url").unwrap(), "localhost:8080");
/// ```
#[derive(Clone)]
pub enum Entry {
    /// A parameter: returned verbatim, never invoked.
    Value(AnyValue),
    /// A service definition: invoked lazily on first `get` (every `get`
    /// when factory-tagged).
    Definition(Definition),
}

impl Entry {
    /// Wraps a plain value as a parameter entry.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Entry::Value(Arc::new(value))
    }
}

impl From<Definition> for Entry {
    fn from(definition: Definition) -> Self {
        Entry::Definition(definition)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Value(_) => f.write_str("Entry::Value"),
            Entry::Definition(d) => write!(f, "Entry::{:?}", d),
        }
    }
}

/// Downcasts a container value to a concrete type.
///
/// # Examples
///
/// ```rust
/// use canister::{cast, Container, Entry};
///
/// let container = Container::new();
/// container.add("answer", Entry::value(42i64)).unwrap();
///
/// let value = container.get("answer").unwrap();
/// assert_eq!(*cast::<i64>(value).unwrap(), 42);
/// assert!(cast::<String>(container.get("answer").unwrap()).is_err());
/// ```
pub fn cast<T: Send + Sync + 'static>(value: AnyValue) -> DiResult<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}
