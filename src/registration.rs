//! Handle registration types.

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::DiResult;
use crate::key::HandleId;
use crate::mode::Mode;
use crate::provider::Scope;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Factory<T> = Box<dyn Fn(&Scope<'_>) -> DiResult<T> + Send + Sync>;

// Every `Handle<T>` type that has been instantiated through registration.
static HANDLE_TYPES: Lazy<RwLock<HashSet<TypeId>>> = Lazy::new(|| RwLock::new(HashSet::new()));

/// Registered factory with its caching mode and override wiring
pub(crate) struct Provider<T> {
    pub(crate) id: HandleId,
    pub(crate) label: &'static str,
    pub(crate) mode: Mode,
    pub(crate) factory: Factory<T>,
    pub(crate) local_overrides: Vec<AnyHandle>,
    pub(crate) override_target: Option<HandleId>,
}

/// Marker capability shared by every handle, typed or erased.
///
/// Lets code that only holds a handle behind a trait object ask for its identity and override
/// wiring without knowing the result type.
pub trait ProviderRef: Send + Sync + 'static {
    /// Identity of the handle.
    fn handle_id(&self) -> HandleId;

    /// Handle this one replaces when installed as a local override.
    fn override_target(&self) -> Option<HandleId>;

    /// Diagnostic label: the registered name, or the result type name.
    fn label(&self) -> &'static str;
}

/// Opaque token for a registered factory.
///
/// A `Handle<T>` is created once, usually at process start, and then passed to
/// [`Scope::resolve`] to obtain an `Arc<T>`. Cloning a handle is cheap and keeps its identity.
///
/// # Examples
///
/// ```rust
/// use ioc_ref::{Handle, Registry};
///
/// struct Config { url: String }
/// struct Client { endpoint: String }
///
/// let config = Handle::new(|_| Ok(Config { url: "https://api.example.com".to_string() }));
/// let client = {
///     let config = config.clone();
///     Handle::new(move |scope| {
///         let config = scope.resolve(&config)?;
///         Ok(Client { endpoint: format!("{}/users", config.url) })
///     })
/// };
///
/// let registry = Registry::new();
/// let endpoint = registry.with_root_scope(|scope| scope.resolve(&client).map(|c| c.endpoint.clone()));
/// assert_eq!(endpoint.unwrap(), "https://api.example.com/users");
/// ```
pub struct Handle<T> {
    inner: Arc<Provider<T>>,
}

impl<T: Send + Sync + 'static> Handle<T> {
    /// Registers `factory` with default options: [`Mode::Global`], no overrides.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&Scope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::with_options(factory, RegisterOptions::default())
    }

    /// Registers `factory` with the given options.
    ///
    /// Nothing is validated and the factory is not invoked. A malformed or cyclic graph is only
    /// reported when it is first resolved.
    pub fn with_options<F>(factory: F, options: RegisterOptions<T>) -> Self
    where
        F: Fn(&Scope<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        record_handle_type::<T>();

        let RegisterOptions {
            mode,
            local_overrides,
            override_target,
            name,
            _marker,
        } = options;

        Self {
            inner: Arc::new(Provider {
                id: HandleId::next(),
                label: name.unwrap_or_else(std::any::type_name::<T>),
                mode,
                factory: Box::new(factory),
                local_overrides,
                override_target,
            }),
        }
    }

    /// Identity of this handle.
    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    /// Caching mode chosen at registration.
    pub fn mode(&self) -> Mode {
        self.inner.mode
    }

    /// Handles installed as local overrides while this handle's factory runs.
    pub fn local_overrides(&self) -> &[AnyHandle] {
        &self.inner.local_overrides
    }

    /// Type-erased copy of this handle, sharing its identity.
    pub fn erase(&self) -> AnyHandle {
        AnyHandle {
            id: self.inner.id,
            label: self.inner.label,
            override_target: self.inner.override_target,
            provider: self.inner.clone(),
        }
    }

    pub(crate) fn provider(&self) -> &Provider<T> {
        &self.inner
    }
}

impl<T: Send + Sync + 'static> ProviderRef for Handle<T> {
    fn handle_id(&self) -> HandleId {
        self.inner.id
    }

    fn override_target(&self) -> Option<HandleId> {
        self.inner.override_target
    }

    fn label(&self) -> &'static str {
        self.inner.label
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("mode", &self.inner.mode)
            .field("local_overrides", &self.inner.local_overrides.len())
            .field("override_target", &self.inner.override_target)
            .finish()
    }
}

impl<T: Send + Sync + 'static> From<&Handle<T>> for AnyHandle {
    fn from(handle: &Handle<T>) -> Self {
        handle.erase()
    }
}

/// Type-erased handle.
///
/// Used where handles of different result types sit side by side, such as the local override
/// list of [`RegisterOptions`]. The typed handle is recovered with a checked downcast.
#[derive(Clone)]
pub struct AnyHandle {
    id: HandleId,
    label: &'static str,
    override_target: Option<HandleId>,
    provider: AnyArc,
}

impl AnyHandle {
    /// Identity of the underlying handle.
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Recovers the typed handle, or `None` when `T` is not its result type.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Handle<T>> {
        self.provider
            .clone()
            .downcast::<Provider<T>>()
            .ok()
            .map(|inner| Handle { inner })
    }

    /// Key under which this handle is installed in a child scope's override map.
    ///
    /// A handle without an override target maps onto itself.
    pub(crate) fn install_key(&self) -> HandleId {
        self.override_target.unwrap_or(self.id)
    }
}

impl ProviderRef for AnyHandle {
    fn handle_id(&self) -> HandleId {
        self.id
    }

    fn override_target(&self) -> Option<HandleId> {
        self.override_target
    }

    fn label(&self) -> &'static str {
        self.label
    }
}

impl PartialEq for AnyHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AnyHandle {}

impl fmt::Debug for AnyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyHandle")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("override_target", &self.override_target)
            .finish()
    }
}

/// Options for registering a handle.
///
/// # Examples
///
/// ```rust
/// use ioc_ref::{Handle, Mode, RegisterOptions, Registry};
///
/// let config = Handle::new(|_| Ok("global config".to_string()));
/// let local_config = Handle::with_options(
///     |_| Ok("local config".to_string()),
///     RegisterOptions::new().overrides(&config),
/// );
///
/// let service = {
///     let config = config.clone();
///     Handle::with_options(
///         move |scope| Ok(format!("service using {}", scope.resolve(&config)?)),
///         RegisterOptions::new().with_override(&local_config).mode(Mode::Standalone),
///     )
/// };
///
/// let registry = Registry::new();
/// registry.with_root_scope(|scope| {
///     assert_eq!(*scope.resolve(&config).unwrap(), "global config");
///     assert_eq!(*scope.resolve(&service).unwrap(), "service using local config");
/// });
/// ```
pub struct RegisterOptions<T> {
    mode: Mode,
    local_overrides: Vec<AnyHandle>,
    override_target: Option<HandleId>,
    name: Option<&'static str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for RegisterOptions<T> {
    fn default() -> Self {
        Self {
            mode: Mode::Global,
            local_overrides: Vec::new(),
            override_target: None,
            name: None,
            _marker: PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> RegisterOptions<T> {
    /// Default options: [`Mode::Global`], no overrides, no name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the caching mode (default [`Mode::Global`]).
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `mode(Mode::Standalone)`.
    pub fn standalone(self) -> Self {
        self.mode(Mode::Standalone)
    }

    /// Adds a handle to install as a local override while this handle's factory runs.
    pub fn with_override<U: Send + Sync + 'static>(mut self, handle: &Handle<U>) -> Self {
        self.local_overrides.push(handle.erase());
        self
    }

    /// Adds several already-erased local overrides, keeping their order.
    pub fn with_overrides<I>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = AnyHandle>,
    {
        self.local_overrides.extend(handles);
        self
    }

    /// Declares the handle this one replaces when installed as a local override.
    ///
    /// The target must produce the same type, so a substitute can always stand in for it.
    pub fn overrides(mut self, target: &Handle<T>) -> Self {
        self.override_target = Some(target.id());
        self
    }

    /// Diagnostic name used in errors and logs instead of the type name.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }
}

fn record_handle_type<T: 'static>() {
    let type_id = TypeId::of::<Handle<T>>();
    if HANDLE_TYPES.read().contains(&type_id) {
        return;
    }
    HANDLE_TYPES.write().insert(type_id);
}

/// Reports whether `value` is a handle.
///
/// True for any [`Handle<T>`] and for [`AnyHandle`], false for everything else. Typed handle types
/// are recorded when the first handle of that type is registered, and a `Handle<T>` value can only
/// come from registration, so the check never needs to inspect the value itself.
///
/// # Examples
///
/// ```rust
/// use ioc_ref::{is_handle, Handle};
///
/// let handle = Handle::new(|_| Ok(7i64));
///
/// assert!(is_handle(&handle));
/// assert!(is_handle(&handle.erase()));
/// assert!(!is_handle(&7i64));
/// assert!(!is_handle(&"handle"));
/// ```
pub fn is_handle(value: &dyn Any) -> bool {
    if value.is::<AnyHandle>() {
        return true;
    }
    let type_id = Any::type_id(value);
    HANDLE_TYPES.read().contains(&type_id)
}
