//! Autowiring: constructing unregistered classes from declared constructor specs.
//!
//! Rust has no runtime constructor reflection, so the signature-inspection
//! step is a pluggable seam: a [`Reflector`] maps a class id to a
//! [`ClassSpec`] describing the constructor's parameter list, and the
//! autowirer resolves each typed parameter recursively through the
//! container's `get`, which is how transitive dependencies and cycles feed
//! into the engine's cycle detection. [`TypeCatalog`] is the stock
//! reflector, backed by an explicit id -> spec registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::container::Container;
use crate::definition::{cast, AnyValue};
use crate::error::{DiError, DiResult};

/// The constructor-inspection seam consulted for ids absent from the store.
pub trait Reflector: Send + Sync {
    /// Describes the constructor of `id`, or `None` when the id names no
    /// known class (the engine then fails with `NotFound`).
    fn describe(&self, id: &str) -> Option<ClassSpec>;
}

type BuildFn = Arc<dyn Fn(Vec<AnyValue>) -> DiResult<AnyValue> + Send + Sync>;

/// One constructor parameter, in declaration order.
#[derive(Clone)]
pub enum Param {
    /// Type-hinted: resolved recursively via the container under `hint`.
    Typed {
        /// Parameter name, for diagnostics.
        name: &'static str,
        /// Id the hint resolves through (a class id or any registered id).
        hint: String,
    },
    /// No hint, but a declared default value used as-is.
    Defaulted {
        /// Parameter name, for diagnostics.
        name: &'static str,
        /// The default.
        value: AnyValue,
    },
    /// No hint and no default: construction fails with
    /// [`DiError::UnresolvableParameter`].
    Untyped {
        /// Parameter name, reported in the error.
        name: &'static str,
    },
}

impl Param {
    /// A type-hinted parameter resolving through `hint`.
    pub fn typed(name: &'static str, hint: &str) -> Self {
        Param::Typed {
            name,
            hint: hint.to_string(),
        }
    }

    /// An untyped parameter with a default value.
    pub fn defaulted<T: Send + Sync + 'static>(name: &'static str, value: T) -> Self {
        Param::Defaulted {
            name,
            value: Arc::new(value),
        }
    }

    /// A required parameter the autowirer cannot supply.
    pub fn untyped(name: &'static str) -> Self {
        Param::Untyped { name }
    }
}

/// Constructor description for one class: parameter list plus the build
/// closure assembling the instance from the resolved arguments.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use canister::{arg, ClassSpec, Container, Param, TypeCatalog};
///
/// struct Engine;
/// struct Car {
///     engine: Arc<Engine>,
/// }
///
/// let mut catalog = TypeCatalog::new();
/// catalog.insert(ClassSpec::new("Engine", |_| Ok(Engine)));
/// catalog.insert(
///     ClassSpec::new("Car", |args| {
///         Ok(Car {
///             engine: arg::<Engine>(&args, 0)?,
///         })
///     })
///     .with_param(Param::typed("engine", "Engine")),
/// );
///
/// let container = Container::new().with_reflector(Arc::new(catalog));
/// let car = container.get_as::<Car>("Car").unwrap();
/// let engine = container.get_as::<Engine>("Engine").unwrap();
/// assert!(Arc::ptr_eq(&car.engine, &engine)); // cached under its class id
/// ```
#[derive(Clone)]
pub struct ClassSpec {
    class: String,
    instantiable: bool,
    params: Vec<Param>,
    build: BuildFn,
}

impl ClassSpec {
    /// A constructible class. With no parameters added this is the
    /// "no constructor" case: built with zero arguments.
    pub fn new<T, F>(class: &str, build: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Vec<AnyValue>) -> DiResult<T> + Send + Sync + 'static,
    {
        ClassSpec {
            class: class.to_string(),
            instantiable: true,
            params: Vec::new(),
            build: Arc::new(move |args| Ok(Arc::new(build(args)?) as AnyValue)),
        }
    }

    /// A class that cannot be constructed (the abstract/interface case);
    /// autowiring it fails with [`DiError::NotInstantiable`].
    pub fn not_instantiable(class: &str) -> Self {
        let name = class.to_string();
        ClassSpec {
            class: class.to_string(),
            instantiable: false,
            params: Vec::new(),
            build: Arc::new(move |_| Err(DiError::NotInstantiable(name.clone()))),
        }
    }

    /// Appends a constructor parameter; call in declaration order.
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// The class id this spec describes.
    pub fn class(&self) -> &str {
        &self.class
    }
}

/// Registry-backed [`Reflector`]: an explicit map from class id to spec.
#[derive(Default)]
pub struct TypeCatalog {
    specs: HashMap<String, ClassSpec>,
}

impl TypeCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a spec under its class id, replacing any previous spec.
    pub fn insert(&mut self, spec: ClassSpec) -> &mut Self {
        self.specs.insert(spec.class.clone(), spec);
        self
    }
}

impl Reflector for TypeCatalog {
    fn describe(&self, id: &str) -> Option<ClassSpec> {
        self.specs.get(id).cloned()
    }
}

/// Downcast helper for build closures: the argument at `index`, as `T`.
pub fn arg<T: Send + Sync + 'static>(args: &[AnyValue], index: usize) -> DiResult<Arc<T>> {
    let value = args
        .get(index)
        .cloned()
        .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))?;
    cast(value)
}

/// Constructs an instance of class `id` from its spec, resolving each typed
/// parameter through the engine in declaration order. Runs with the caller's
/// resolving mark already set, so cycles through parameter hints surface as
/// `CyclicDependency`.
pub(crate) fn construct(
    container: &Container,
    reflector: &dyn Reflector,
    id: &str,
) -> DiResult<AnyValue> {
    let spec = reflector
        .describe(id)
        .ok_or_else(|| DiError::NotFound(id.to_string()))?;
    if !spec.instantiable {
        return Err(DiError::NotInstantiable(spec.class));
    }
    trace!(class = %spec.class, params = spec.params.len(), "autowiring class");

    let mut args = Vec::with_capacity(spec.params.len());
    for param in &spec.params {
        match param {
            Param::Typed { hint, .. } => args.push(container.get(hint)?),
            Param::Defaulted { value, .. } => args.push(value.clone()),
            Param::Untyped { name } => {
                return Err(DiError::UnresolvableParameter {
                    parameter: name.to_string(),
                    class: spec.class.clone(),
                })
            }
        }
    }
    (spec.build)(args)
}
