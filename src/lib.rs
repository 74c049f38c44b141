//! # canister
//!
//! A string-keyed, lazily resolving dependency container: register
//! *parameters* (plain values) and *services* (definitions invoked with the
//! container), retrieve them by id, and let the container wire dependencies
//! on demand.
//!
//! ## Features
//!
//! - **Sharing by default**: a definition runs once; its product is cached
//!   and returned on every later `get`
//! - **Factories**: tag a definition with [`Container::factory`] and every
//!   `get` produces a fresh instance
//! - **Protection**: tag a definition with [`Container::protect`] and `get`
//!   returns the invokable itself as a literal
//! - **Decoration**: [`Container::extend`] wraps an existing definition,
//!   running a decorator over its product
//! - **Cycle detection**: a dependency chain that reaches its own id fails
//!   fast with the full resolution path, never hangs
//! - **Autowiring**: unregistered class ids can be constructed through a
//!   pluggable [`Reflector`] backed by explicit constructor specs
//! - **Observers**: global callbacks fire on every successful resolution
//!
//! ## Quick Start
//!
//! ```rust
//! use canister::{Container, Definition, Entry};
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserRepo {
//!     db: std::sync::Arc<Database>,
//! }
//!
//! let container = Container::new();
//! container.add("db.url", Entry::value("postgres://localhost".to_string())).unwrap();
//! container.add("db", Definition::new(|c: &Container| {
//!     Ok(Database {
//!         url: c.get_as::<String>("db.url")?.as_ref().clone(),
//!     })
//! })).unwrap();
//! container.add("users", Definition::new(|c: &Container| {
//!     Ok(UserRepo {
//!         db: c.get_as::<Database>("db")?,
//!     })
//! })).unwrap();
//!
//! let users = container.get_as::<UserRepo>("users").unwrap();
//! assert_eq!(users.db.url, "postgres://localhost");
//!
//! // Shared: the same Database instance backs every retrieval.
//! let db = container.get_as::<Database>("db").unwrap();
//! assert!(std::sync::Arc::ptr_eq(&users.db, &db));
//! ```
//!
//! ## Factories and protection
//!
//! ```rust
//! use canister::{Container, Definition};
//!
//! struct Job;
//!
//! let container = Container::new();
//!
//! // A fresh Job per retrieval.
//! let def = container.factory(Definition::new(|_: &Container| Ok(Job)));
//! container.add("job", def).unwrap();
//! let a = container.get_as::<Job>("job").unwrap();
//! let b = container.get_as::<Job>("job").unwrap();
//! assert!(!std::sync::Arc::ptr_eq(&a, &b));
//!
//! // A protected definition is a value, not a recipe.
//! let def = container.protect(Definition::new(|_: &Container| Ok(Job)));
//! container.add("make_job", def).unwrap();
//! let literal = container.get_as::<Definition>("make_job").unwrap();
//! assert!(literal.call(&container).is_ok());
//! ```
//!
//! ## Immutability after resolution
//!
//! Once an id has resolved, re-registering it fails with
//! [`DiError::Immutable`] until it is removed:
//!
//! ```rust
//! use canister::{Container, DiError, Entry};
//!
//! let container = Container::new();
//! container.add("flag", Entry::value(true)).unwrap();
//! container.get("flag").unwrap();
//!
//! assert!(matches!(
//!     container.add("flag", Entry::value(false)),
//!     Err(DiError::Immutable(_))
//! ));
//! container.remove("flag");
//! container.add("flag", Entry::value(false)).unwrap();
//! ```

// Module declarations
pub mod autowire;
pub mod container;
pub mod definition;
pub mod error;
pub mod observer;
pub mod provider;

// Internal modules
mod store;

// Re-export core types
pub use autowire::{arg, ClassSpec, Param, Reflector, TypeCatalog};
pub use container::Container;
pub use definition::{cast, AnyValue, Definition, Entry};
pub use error::{DiError, DiResult};
pub use observer::Observer;
pub use provider::Provider;
