//! The container: entry registration, the resolution engine, and decoration.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, trace};

use crate::autowire::{construct, Reflector};
use crate::definition::{cast, AnyValue, Definition, Entry};
use crate::error::{DiError, DiResult};
use crate::observer::{notify_all, Observers};
use crate::provider::Provider;
use crate::store::{AliasTable, EntryStore, TagSets};

/// Everything mutable lives in one struct behind one lock, because any
/// definition, decorator, observer, or reflector can call back into the
/// container mid-operation.
struct State {
    store: EntryStore,
    tags: TagSets,
    aliases: AliasTable,
    /// Ids currently mid-resolution, outermost first. Membership is the
    /// cycle check; order gives the error path.
    resolving: Vec<String>,
    observers: Observers,
}

/// A string-keyed registry of *parameters* (plain values) and *services*
/// (lazily constructed values), with dependency resolution on demand.
///
/// Entries are registered under string ids via [`add`](Container::add) as
/// either an [`Entry::Value`] or an [`Entry::Definition`]. The first `get`
/// of a definition invokes it with the container and caches the product;
/// subsequent gets return the cached value. A definition passed through
/// [`factory`](Container::factory) is re-invoked on every `get`; one passed
/// through [`protect`](Container::protect) is returned as a literal instead
/// of being invoked.
///
/// All state sits behind a single re-entrant lock per container: definitions
/// receive `&Container` and may resolve further entries mid-construction,
/// while cross-thread access serializes on the whole container. A dependency
/// that reaches its own id again fails fast with
/// [`CyclicDependency`](DiError::CyclicDependency) instead of recursing
/// forever.
///
/// # Examples
///
/// ```rust
/// use canister::{Container, Definition, Entry};
///
/// struct Database {
///     url: String,
/// }
///
/// let container = Container::new();
/// container.add("db.url", Entry::value("postgres://localhost".to_string())).unwrap();
/// container.add("db", Definition::new(|c: &Container| {
///     Ok(Database {
///         url: c.get_as::<String>("db.url")?.as_ref().clone(),
///     })
/// })).unwrap();
///
/// let a = container.get_as::<Database>("db").unwrap();
/// let b = container.get_as::<Database>("db").unwrap();
/// assert_eq!(a.url, "postgres://localhost");
/// assert!(std::sync::Arc::ptr_eq(&a, &b)); // shared by default
/// ```
pub struct Container {
    state: ReentrantMutex<RefCell<State>>,
    reflector: Option<Arc<dyn Reflector>>,
}

/// What `get` decided to do for an id, computed under a short borrow so no
/// borrow is held while user code runs.
enum Plan {
    /// Skip invocation: the stored value (or the protected definition
    /// itself) is the result.
    Ready(AnyValue),
    /// Invoke the definition; the flag is its factory tag.
    Invoke(Definition, bool),
    /// Id unknown to the store: delegate to the reflector.
    Autowire,
}

impl Container {
    /// Creates an empty container without autowiring.
    pub fn new() -> Self {
        Container {
            state: ReentrantMutex::new(RefCell::new(State {
                store: EntryStore::default(),
                tags: TagSets::default(),
                aliases: AliasTable::default(),
                resolving: Vec::new(),
                observers: Observers::default(),
            })),
            reflector: None,
        }
    }

    /// Creates a container seeded with an initial id -> entry mapping,
    /// applied in iteration order through the same path as [`add`](Container::add).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canister::{Container, Entry};
    ///
    /// let container = Container::with_entries([
    ///     ("name", Entry::value("canister".to_string())),
    ///     ("retries", Entry::value(3u32)),
    /// ]);
    ///
    /// assert_eq!(container.keys(), vec!["name", "retries"]);
    /// ```
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Entry)>,
        K: Into<String>,
    {
        let container = Self::new();
        {
            let guard = container.state.lock();
            let mut st = guard.borrow_mut();
            for (id, entry) in entries {
                st.store.insert(&id.into(), entry);
            }
        }
        container
    }

    /// Enables autowiring: ids absent from the store are constructed through
    /// the given [`Reflector`] instead of failing with `NotFound`.
    pub fn with_reflector(mut self, reflector: Arc<dyn Reflector>) -> Self {
        self.reflector = Some(reflector);
        self
    }

    /// Resolves an entry.
    ///
    /// Returns the parameter value, the (possibly cached) service product,
    /// the protected definition as a literal, or, for ids unknown to the
    /// store when autowiring is enabled, a freshly constructed and cached
    /// instance. Every successful call notifies the global observers exactly
    /// once, cache hits included.
    ///
    /// # Errors
    ///
    /// * [`DiError::NotFound`]: unknown id, autowiring disabled or the
    ///   reflector does not know the id either.
    /// * [`DiError::CyclicDependency`]: the id is already resolving higher
    ///   up the current call stack.
    /// * [`DiError::NotInstantiable`] / [`DiError::UnresolvableParameter`]:
    ///   autowiring failures.
    /// * Any error a definition returns propagates unchanged.
    pub fn get(&self, id: &str) -> DiResult<AnyValue> {
        let guard = self.state.lock();
        let canonical = guard.borrow().aliases.resolve(id).to_string();

        // NotFound and cycle checks run before the resolving mark is set, so
        // a failed call cannot poison later resolutions of the same id.
        {
            let st = guard.borrow();
            if !st.store.contains(&canonical) && self.reflector.is_none() {
                return Err(DiError::NotFound(canonical));
            }
            if st.resolving.iter().any(|r| r == &canonical) {
                let mut path = st.resolving.clone();
                path.push(canonical.clone());
                return Err(DiError::CyclicDependency(path));
            }
        }

        guard.borrow_mut().resolving.push(canonical.clone());
        let mark = ResolveMark {
            container: self,
            id: canonical.clone(),
        };

        let plan = {
            let st = guard.borrow();
            match st.store.slot(&canonical) {
                Some(slot) => match &slot.entry {
                    Entry::Value(v) => Plan::Ready(v.clone()),
                    Entry::Definition(d) if slot.resolved => Plan::Ready(d.as_value()),
                    Entry::Definition(d) if st.tags.is_protected(d.id()) => {
                        Plan::Ready(d.as_value())
                    }
                    Entry::Definition(d) => Plan::Invoke(d.clone(), st.tags.is_factory(d.id())),
                },
                None => Plan::Autowire,
            }
        };

        let value = match plan {
            Plan::Ready(value) => {
                if let Some(slot) = guard.borrow_mut().store.slot_mut(&canonical) {
                    slot.resolved = true;
                }
                value
            }
            Plan::Invoke(definition, true) => {
                trace!(id = %canonical, "invoking factory definition");
                definition.call(self)?
            }
            Plan::Invoke(definition, false) => {
                trace!(id = %canonical, "invoking definition");
                let product = definition.call(self)?;
                let mut st = guard.borrow_mut();
                if let Some(slot) = st.store.slot_mut(&canonical) {
                    slot.entry = Entry::Value(product.clone());
                    slot.resolved = true;
                }
                debug!(id = %canonical, "resolved and cached service");
                product
            }
            Plan::Autowire => match self.reflector.as_deref() {
                Some(reflector) => {
                    let product = construct(self, reflector, &canonical)?;
                    let mut st = guard.borrow_mut();
                    st.store.insert(&canonical, Entry::Value(product.clone()));
                    if let Some(slot) = st.store.slot_mut(&canonical) {
                        slot.resolved = true;
                    }
                    debug!(id = %canonical, "autowired and cached instance");
                    product
                }
                None => return Err(DiError::NotFound(canonical)),
            },
        };

        drop(mark);
        let observers = guard.borrow().observers.snapshot();
        notify_all(&observers, &canonical, &value, self);
        Ok(value)
    }

    /// Resolves an entry and downcasts it to `T`.
    ///
    /// # Errors
    ///
    /// Everything [`get`](Container::get) can return, plus
    /// [`DiError::TypeMismatch`] when the resolved value is not a `T`.
    pub fn get_as<T: Send + Sync + 'static>(&self, id: &str) -> DiResult<Arc<T>> {
        cast(self.get(id)?)
    }

    /// Registers or overwrites an entry under `id`.
    ///
    /// Ids are taken verbatim; aliases are a retrieval-side indirection.
    /// A new id is appended to the key order; overwriting keeps the
    /// position.
    ///
    /// # Errors
    ///
    /// [`DiError::Immutable`] if `id` has already been resolved. `remove`
    /// first to re-register it.
    pub fn add(&self, id: &str, entry: impl Into<Entry>) -> DiResult<()> {
        let guard = self.state.lock();
        let mut st = guard.borrow_mut();
        if let Some(slot) = st.store.slot(id) {
            if slot.resolved {
                return Err(DiError::Immutable(id.to_string()));
            }
        }
        trace!(id, "registering entry");
        st.store.insert(id, entry.into());
        Ok(())
    }

    /// Removes an entry (alias-resolved), clearing its definition, resolved
    /// flag, resolving mark, key membership, and tag identities. Idempotent.
    pub fn remove(&self, id: &str) {
        let guard = self.state.lock();
        let mut st = guard.borrow_mut();
        let canonical = st.aliases.resolve(id).to_string();
        if let Some(slot) = st.store.remove(&canonical) {
            if let Entry::Definition(d) = &slot.entry {
                st.tags.detach(d.id());
            }
            debug!(id = %canonical, "removed entry");
        }
        if let Some(pos) = st.resolving.iter().rposition(|r| r == &canonical) {
            st.resolving.remove(pos);
        }
    }

    /// Tags a definition so every `get` re-invokes it instead of caching the
    /// first product. Returns the definition for inline use at the `add`
    /// call site.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canister::{Container, Definition};
    ///
    /// struct Connection;
    ///
    /// let container = Container::new();
    /// let def = container.factory(Definition::new(|_: &Container| Ok(Connection)));
    /// container.add("conn", def).unwrap();
    ///
    /// let a = container.get_as::<Connection>("conn").unwrap();
    /// let b = container.get_as::<Connection>("conn").unwrap();
    /// assert!(!std::sync::Arc::ptr_eq(&a, &b)); // fresh instance per get
    /// ```
    pub fn factory(&self, definition: Definition) -> Definition {
        let guard = self.state.lock();
        guard.borrow_mut().tags.tag_factory(definition.id());
        definition
    }

    /// Tags a definition so `get` returns it as a literal invokable rather
    /// than invoking it. Returns the definition for inline use.
    pub fn protect(&self, definition: Definition) -> Definition {
        let guard = self.state.lock();
        guard.borrow_mut().tags.tag_protected(definition.id());
        definition
    }

    /// True when `id` (alias-resolved) is a known key. Does not consult the
    /// reflector: an autowirable class is not present until a `get`
    /// materializes it.
    pub fn has(&self, id: &str) -> bool {
        let guard = self.state.lock();
        let st = guard.borrow();
        let canonical = st.aliases.resolve(id);
        st.store.contains(canonical)
    }

    /// All known ids, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        let guard = self.state.lock();
        let keys = guard.borrow().store.keys();
        keys
    }

    /// Installs a single-hop alias: retrieval of `from` resolves the entry
    /// registered under `to`. Aliases do not chain.
    pub fn alias(&self, from: &str, to: &str) {
        let guard = self.state.lock();
        guard.borrow_mut().aliases.insert(from, to);
        trace!(from, to, "installed alias");
    }

    /// Wraps the definition stored at `id` so that `decorator(product,
    /// container)` runs after the original and its return value becomes the
    /// effective result. Decorators compose in registration order, first
    /// registered innermost. The factory tag, if present, transfers to the
    /// composed definition.
    ///
    /// # Errors
    ///
    /// * [`DiError::NotFound`]: `id` unregistered.
    /// * [`DiError::Immutable`]: `id` is mid-resolution, or its definition
    ///   is protected.
    /// * [`DiError::ExpectedInvokable`]: the entry is a plain parameter or
    ///   an already-resolved value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canister::{cast, Container, Definition};
    ///
    /// let container = Container::new();
    /// container.add("greeting", Definition::new(|_: &Container| {
    ///     Ok("hello".to_string())
    /// })).unwrap();
    /// container.extend("greeting", |value, _| {
    ///     let base = cast::<String>(value)?;
    ///     Ok(std::sync::Arc::new(format!("{}, world", base))
    ///         as canister::AnyValue)
    /// }).unwrap();
    ///
    /// assert_eq!(*container.get_as::<String>("greeting").unwrap(), "hello, world");
    /// ```
    pub fn extend<F>(&self, id: &str, decorator: F) -> DiResult<()>
    where
        F: Fn(AnyValue, &Container) -> DiResult<AnyValue> + Send + Sync + 'static,
    {
        let guard = self.state.lock();
        let canonical;
        let base = {
            let st = guard.borrow();
            canonical = st.aliases.resolve(id).to_string();
            let slot = st
                .store
                .slot(&canonical)
                .ok_or_else(|| DiError::NotFound(canonical.clone()))?;
            if st.resolving.iter().any(|r| r == &canonical) {
                return Err(DiError::Immutable(canonical.clone()));
            }
            let base = match &slot.entry {
                Entry::Definition(d) if !slot.resolved => d.clone(),
                _ => return Err(DiError::ExpectedInvokable(canonical.clone())),
            };
            if st.tags.is_protected(base.id()) {
                return Err(DiError::Immutable(canonical.clone()));
            }
            base
        };

        let inner = base.clone();
        let composed = Definition::erased(move |c: &Container| {
            let product = inner.call(c)?;
            decorator(product, c)
        });

        let mut st = guard.borrow_mut();
        if st.tags.untag_factory(base.id()) {
            st.tags.tag_factory(composed.id());
        }
        st.store.insert(&canonical, Entry::Definition(composed));
        debug!(id = %canonical, "extended definition");
        Ok(())
    }

    /// Registers a global observer, invoked with `(value, container)` after
    /// every successful `get` (cache hits and parameter reads included),
    /// in insertion order. This is the one-callback form of `extend`.
    pub fn observe<F>(&self, callback: F)
    where
        F: Fn(&AnyValue, &Container) + Send + Sync + 'static,
    {
        let guard = self.state.lock();
        guard.borrow_mut().observers.push(Arc::new(callback));
    }

    /// Applies a [`Provider`]'s batch of registrations. Chainable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canister::{Container, Entry};
    ///
    /// let container = Container::new();
    /// container
    ///     .register(|c: &Container| {
    ///         c.add("a", Entry::value(1u8)).unwrap();
    ///     })
    ///     .register(|c: &Container| {
    ///         c.add("b", Entry::value(2u8)).unwrap();
    ///     });
    ///
    /// assert_eq!(container.keys(), vec!["a", "b"]);
    /// ```
    pub fn register<P: Provider>(&self, provider: P) -> &Self {
        provider.register(self);
        self
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII resolving mark: popped when the `get` frame exits, success or error.
struct ResolveMark<'a> {
    container: &'a Container,
    id: String,
}

impl Drop for ResolveMark<'_> {
    fn drop(&mut self) {
        let guard = self.container.state.lock();
        let mut st = guard.borrow_mut();
        // rposition: `remove` may have already cleared the mark.
        if let Some(pos) = st.resolving.iter().rposition(|r| r == &self.id) {
            st.resolving.remove(pos);
        }
    }
}
