//! # The Container — heart of Rabt
//!
//! A runtime registry mapping abstract identifiers to producers, resolving
//! object graphs on demand from [`TypeDescriptor`]s.
//!
//! # Architecture
//! ```text
//! make(id) ──> alias ──> resolving? ──yes──> deferred instance
//!                            │ no
//!                      before hooks
//!                            │
//!          instance slot / binding producer / autowiring (build)
//!                            │
//!                      after hooks ──> resolution cache ──> value
//! ```
//!
//! # Examples
//! ```rust
//! use rabt_container::prelude::*;
//!
//! struct ConsoleLogger;
//! struct Service {
//!     logger: Instance,
//! }
//!
//! let container = Container::builder()
//!     .register_type(TypeDescriptor::capability("Logger").finish())
//!     .register_type(
//!         TypeDescriptor::concrete("ConsoleLogger")
//!             .implements("Logger")
//!             .instantiate(|_| Ok(ConsoleLogger)),
//!     )
//!     .register_type(
//!         TypeDescriptor::concrete("Service")
//!             .constructor([Param::new("logger", "Logger")])
//!             .instantiate(|args| Ok(Service { logger: args.instance(0)? })),
//!     )
//!     .build()
//!     .expect("Failed to build container");
//!
//! container.bind("Logger", "ConsoleLogger").unwrap();
//!
//! let service = container.make_as::<Service>("Service").unwrap();
//! assert_eq!(service.logger.class_name(), "ConsoleLogger");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, ReentrantMutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rabt_support::rendering::suggest_similar;
use tracing::{debug, info, trace};

use crate::cache::{ContainerCache, ResolutionCache, Snapshot};
use crate::catalog::TypeCatalog;
use crate::circular::ResolvingSet;
use crate::contextual::{ContextualBindingBuilder, ContextualStore};
use crate::descriptor::TypeDescriptor;
use crate::error::{BindingError, ConfigurationError, NotFoundError, RabtError, Result};
use crate::hooks::HookPipeline;
use crate::lifetime::Lifetime;
use crate::registry::{Binding, BindingRegistry, Producer};
use crate::settings::ContainerSettings;
use crate::tags::TagRegistry;
use crate::value::{Parameters, Value};

static GLOBAL: OnceCell<Container> = OnceCell::new();

// ═══════════════════════════════════════════
// ContainerBuilder
// ═══════════════════════════════════════════

/// Builds a [`Container`] with settings, types and an external cache.
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .allow_override(false)
///     .cache_ttl(Duration::from_secs(60))
///     .external_cache(Arc::new(InMemoryCache::new()))
///     .register_type(describe_mailer())
///     .build()?;
/// ```
pub struct ContainerBuilder {
    settings: ContainerSettings,
    external_cache: Option<Arc<dyn ContainerCache>>,
    types: Vec<TypeDescriptor>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            settings: ContainerSettings::default(),
            external_cache: None,
            types: Vec::new(),
        }
    }

    /// Allow rebinding an abstract (the default).
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.settings.allow_override = allow;
        self
    }

    /// TTL hint used when flushing resolved services.
    pub fn cache_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.settings.cache_ttl_secs = ttl.as_secs();
        self
    }

    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn external_cache(mut self, cache: Arc<dyn ContainerCache>) -> Self {
        self.external_cache = Some(cache);
        self
    }

    pub fn register_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    /// Build the container, validating every registered descriptor.
    pub fn build(self) -> Result<Container> {
        info!(types = self.types.len(), "Building container");

        let catalog = TypeCatalog::default();
        for descriptor in self.types {
            descriptor.validate()?;
            catalog.register(descriptor);
        }

        let container = Container::from_parts(self.settings, Arc::new(catalog), None);
        if let Some(cache) = self.external_cache {
            container.inner.cache.set_external(cache);
        }
        Ok(container)
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("settings", &self.settings)
            .field("types", &self.types.len())
            .field("external_cache", &self.external_cache.is_some())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// What a binding produces.
#[derive(Clone)]
pub enum Concrete {
    /// Autowire the named type.
    Type(String),
    /// Call the producer.
    Factory(Producer),
}

impl From<&str> for Concrete {
    fn from(class: &str) -> Self {
        Concrete::Type(class.to_string())
    }
}

impl From<String> for Concrete {
    fn from(class: String) -> Self {
        Concrete::Type(class)
    }
}

impl fmt::Debug for Concrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concrete::Type(class) => f.debug_tuple("Type").field(class).finish(),
            Concrete::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

pub(crate) struct ContainerInner {
    pub settings: ContainerSettings,
    pub registry: RwLock<BindingRegistry>,
    pub catalog: Arc<TypeCatalog>,
    pub contextual: ContextualStore,
    pub tags: TagRegistry,
    pub hooks: HookPipeline,
    pub cache: ResolutionCache,
    pub resolving: ResolvingSet,
    /// Held for the whole of `resolve`.
    pub resolution: ReentrantMutex<()>,
    pub union_priorities: RwLock<HashMap<String, Vec<String>>>,
    pub scopes: Mutex<HashMap<String, Container>>,
    /// Set on scope containers only.
    pub parent: Option<Weak<ContainerInner>>,
}

/// Thread-safe dependency injection container.
///
/// Cloning is cheap and yields a handle to the same container. Resolutions
/// on one container are serialised by a reentrant lock: a producer or hook
/// may resolve again on its own thread, but must not wait for another
/// thread that resolves from the same container.
#[derive(Clone)]
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// An empty container with default settings.
    pub fn new() -> Self {
        Self::from_parts(ContainerSettings::default(), Arc::default(), None)
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub(crate) fn from_parts(
        settings: ContainerSettings,
        catalog: Arc<TypeCatalog>,
        parent: Option<Weak<ContainerInner>>,
    ) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                settings,
                registry: RwLock::default(),
                catalog,
                contextual: ContextualStore::default(),
                tags: TagRegistry::default(),
                hooks: HookPipeline::default(),
                cache: ResolutionCache::default(),
                resolving: ResolvingSet::default(),
                resolution: ReentrantMutex::new(()),
                union_priorities: RwLock::default(),
                scopes: Mutex::default(),
                parent,
            }),
        }
    }

    /// The process-wide container, created on first access.
    ///
    /// Deferred instances resolve through it.
    pub fn global() -> &'static Container {
        GLOBAL.get_or_init(|| {
            debug!("Creating global container");
            Container::new()
        })
    }

    /// Installs `container` as the process-wide container.
    ///
    /// # Errors
    /// [`ConfigurationError::GlobalAlreadySet`] once the global exists.
    pub fn set_global(container: Container) -> Result<()> {
        GLOBAL
            .set(container)
            .map_err(|_| RabtError::Configuration(ConfigurationError::GlobalAlreadySet))
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.inner.settings
    }

    /// Makes `descriptor` known to this container.
    ///
    /// Registered types survive [`reset_container`](Container::reset_container).
    pub fn register_type(&self, descriptor: TypeDescriptor) -> Result<()> {
        descriptor.validate()?;
        self.inner.catalog.register(descriptor);
        Ok(())
    }

    /// The descriptor for `type_name`, if known.
    pub fn descriptor(&self, type_name: &str) -> Option<Arc<TypeDescriptor>> {
        self.inner.catalog.lookup(type_name)
    }

    pub fn is_instantiable(&self, type_name: &str) -> bool {
        self.inner.catalog.is_instantiable(type_name)
    }

    /// Whether `value` satisfies `type_name` (by declared supertypes).
    pub fn is_a(&self, value: &Value, type_name: &str) -> bool {
        match value {
            Value::Instance(instance) => self.inner.catalog.is_a(instance.class_name(), type_name),
            other => other.type_name() == type_name,
        }
    }

    // ── Registration ──

    /// Binds `abstract_id` to the type `class`, autowired on every `make`.
    pub fn bind(&self, abstract_id: &str, class: &str) -> Result<()> {
        self.register(abstract_id, Some(Concrete::from(class)), Lifetime::Transient)
    }

    /// Binds `abstract_id` to itself as a type.
    pub fn bind_self(&self, abstract_id: &str) -> Result<()> {
        self.register(abstract_id, None, Lifetime::Transient)
    }

    pub fn bind_factory<F>(&self, abstract_id: &str, factory: F) -> Result<()>
    where
        F: Fn(&Container, &Parameters) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(
            abstract_id,
            Some(Concrete::Factory(Arc::new(factory))),
            Lifetime::Transient,
        )
    }

    /// Like [`bind`](Container::bind), but the first value is kept.
    pub fn singleton(&self, abstract_id: &str, class: &str) -> Result<()> {
        self.register(abstract_id, Some(Concrete::from(class)), Lifetime::Shared)
    }

    pub fn singleton_self(&self, abstract_id: &str) -> Result<()> {
        self.register(abstract_id, None, Lifetime::Shared)
    }

    pub fn singleton_factory<F>(&self, abstract_id: &str, factory: F) -> Result<()>
    where
        F: Fn(&Container, &Parameters) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(
            abstract_id,
            Some(Concrete::Factory(Arc::new(factory))),
            Lifetime::Shared,
        )
    }

    /// Registers a binding.
    ///
    /// Without a concrete the abstract names its own type. A type name must
    /// be instantiable right now; otherwise this fails with
    /// [`RabtError::Binding`].
    pub fn register(
        &self,
        abstract_id: &str,
        concrete: Option<Concrete>,
        lifetime: Lifetime,
    ) -> Result<()> {
        validate_key(abstract_id)?;

        match concrete.unwrap_or_else(|| Concrete::from(abstract_id)) {
            Concrete::Factory(producer) => {
                self.register_producer(abstract_id, producer, lifetime, None)
            }
            Concrete::Type(class) => {
                if !self.inner.catalog.is_instantiable(&class) {
                    return Err(RabtError::Binding(BindingError {
                        abstract_id: abstract_id.to_string(),
                        concrete: class,
                    }));
                }
                let target = class.clone();
                let producer: Producer =
                    Arc::new(move |container, parameters| container.build_with(&target, parameters));
                self.register_producer(abstract_id, producer, lifetime, Some(class))
            }
        }
    }

    pub(crate) fn register_producer(
        &self,
        abstract_id: &str,
        producer: Producer,
        lifetime: Lifetime,
        concrete: Option<String>,
    ) -> Result<()> {
        validate_key(abstract_id)?;
        let binding = Binding {
            producer,
            lifetime,
            concrete,
        };
        self.registry_mut()
            .register(abstract_id, binding, self.inner.settings.allow_override)
    }

    /// Stores `value` in the instance slot, bypassing producers.
    pub fn instance(&self, abstract_id: &str, value: impl Into<Value>) -> Result<()> {
        validate_key(abstract_id)?;
        debug!(abstract_id, "Registered instance");
        self.registry_mut().set_instance(abstract_id, value.into());
        Ok(())
    }

    /// Makes `alias` resolve as `abstract_id`. The target is not validated.
    pub fn alias(&self, abstract_id: &str, alias: &str) -> Result<()> {
        validate_key(abstract_id)?;
        validate_key(alias)?;
        self.registry_mut().alias(abstract_id, alias);
        Ok(())
    }

    // ── Resolution ──

    pub fn make(&self, abstract_id: &str) -> Result<Value> {
        self.make_with(abstract_id, &Parameters::new())
    }

    /// Resolves `abstract_id`; entries in `parameters` win over autowiring.
    pub fn make_with(&self, abstract_id: &str, parameters: &Parameters) -> Result<Value> {
        if self.is_scope() {
            return self.make_scoped(abstract_id, parameters);
        }
        self.resolve(abstract_id, parameters)
    }

    /// Typed [`make`](Container::make).
    pub fn make_as<T: Any + Send + Sync>(&self, abstract_id: &str) -> Result<Arc<T>> {
        self.make(abstract_id)?.downcast::<T>()
    }

    /// Like [`make`](Container::make), but every failure other than
    /// [`RabtError::NotFound`] is wrapped in a [`RabtError::Container`].
    pub fn get(&self, id: &str) -> Result<Value> {
        if self.is_scope() {
            return self.get_scoped(id);
        }
        self.get_unscoped(id)
    }

    pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
        self.get(id)?.downcast::<T>()
    }

    /// True if `id` is bound, has an instance, or names an instantiable type.
    pub fn has(&self, id: &str) -> bool {
        if self.is_scope() {
            return self.has_scoped(id);
        }
        self.has_unscoped(id)
    }

    pub(crate) fn has_unscoped(&self, id: &str) -> bool {
        let abstract_id = self.registry().canonical(id);
        let known = {
            let registry = self.registry();
            registry.is_bound(&abstract_id) || registry.has_instance(&abstract_id)
        };
        known || self.inner.catalog.is_instantiable(&abstract_id)
    }

    pub(crate) fn get_unscoped(&self, id: &str) -> Result<Value> {
        self.resolve(id, &Parameters::new()).map_err(|err| {
            if err.is_not_found() {
                err
            } else {
                RabtError::container_caused_by(
                    format!("Error while retrieving the entry '{id}': {err}"),
                    err,
                )
            }
        })
    }

    /// The full resolution path, without scope dispatch.
    pub(crate) fn resolve(&self, id: &str, parameters: &Parameters) -> Result<Value> {
        let _serial = self.inner.resolution.lock();
        let abstract_id = self.registry().canonical(id);

        if self.inner.resolving.contains(&abstract_id) {
            return Ok(self.inner.resolving.defer(&abstract_id, parameters));
        }

        self.inner.hooks.run_before(&abstract_id, parameters);

        let _guard = self.inner.resolving.enter(&abstract_id);
        trace!(abstract_id = %abstract_id, "Resolving");

        let produced = self.produce(&abstract_id, parameters)?;
        let value = self.inner.hooks.run_after(produced, &abstract_id, parameters);
        self.inner.cache.store(&abstract_id, value.clone());
        Ok(value)
    }

    fn produce(&self, abstract_id: &str, parameters: &Parameters) -> Result<Value> {
        let (instance, binding) = {
            let registry = self.registry();
            (registry.instance(abstract_id), registry.binding(abstract_id))
        };

        if let Some(value) = instance {
            trace!(abstract_id, "Serving instance slot");
            return Ok(value);
        }

        if let Some(binding) = binding {
            trace!(abstract_id, lifetime = %binding.lifetime, "Calling producer");
            let value = (binding.producer)(self, parameters)?;
            if binding.lifetime.is_shared() {
                self.registry_mut().set_instance(abstract_id, value.clone());
            }
            return Ok(value);
        }

        if self.inner.catalog.lookup(abstract_id).is_none() {
            return Err(self.not_found(format!("No entry found for [{abstract_id}]."), abstract_id));
        }
        self.build_with(abstract_id, parameters)
    }

    // ── Contextual bindings ──

    /// Starts `when(consumer).needs(dependency).give(implementation)`.
    pub fn when(&self, consumer: &str) -> ContextualBindingBuilder<'_> {
        ContextualBindingBuilder::new(self, consumer)
    }

    pub fn add_contextual_binding(&self, consumer: &str, dependency: &str, implementation: &str) {
        self.inner.contextual.add(consumer, dependency, implementation);
    }

    /// The replacement registered for `dependency` when building `consumer`.
    pub fn contextual_binding(&self, consumer: &str, dependency: &str) -> Option<String> {
        self.inner.contextual.lookup(consumer, dependency)
    }

    /// Orders the candidates tried for a union-typed parameter.
    ///
    /// Types missing from `priority` are tried last, in declaration order.
    pub fn set_union_type_priority<S: AsRef<str>>(
        &self,
        consumer: &str,
        parameter: &str,
        priority: &[S],
    ) {
        let key = union_priority_key(consumer, parameter);
        debug!(key = %key, "Registered union type priority");
        self.inner.union_priorities.write().insert(
            key,
            priority.iter().map(|s| s.as_ref().to_string()).collect(),
        );
    }

    pub(crate) fn union_priority(&self, consumer: &str, parameter: &str) -> Option<Vec<String>> {
        self.inner
            .union_priorities
            .read()
            .get(&union_priority_key(consumer, parameter))
            .cloned()
    }

    // ── Tags ──

    /// Appends `ids` to `tag` (duplicates kept).
    pub fn tag<S: AsRef<str>>(&self, tag: &str, ids: &[S]) {
        self.inner.tags.tag(tag, ids);
    }

    /// Resolves every member of `tag` with [`get`](Container::get).
    ///
    /// Members that are not found are skipped; other failures propagate.
    pub fn get_by_tag(&self, tag: &str) -> Result<IndexMap<String, Value>> {
        let mut resolved = IndexMap::new();
        for id in self.inner.tags.members(tag) {
            match self.get(&id) {
                Ok(value) => {
                    resolved.insert(id, value);
                }
                Err(err) if err.is_not_found() => {
                    trace!(tag, id = %id, "Skipping unresolvable tagged entry");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(resolved)
    }

    // ── Hooks ──

    pub fn add_before_resolve<F>(&self, hook: F)
    where
        F: Fn(&str, &Parameters) + Send + Sync + 'static,
    {
        debug!("Registered before-resolve hook");
        self.inner.hooks.add_before(Arc::new(hook));
    }

    /// Returning `Some` replaces the resolved value.
    pub fn add_after_resolve<F>(&self, hook: F)
    where
        F: Fn(&Value, &str, &Parameters) -> Option<Value> + Send + Sync + 'static,
    {
        debug!("Registered after-resolve hook");
        self.inner.hooks.add_after(Arc::new(hook));
    }

    pub(crate) fn run_before_hooks(&self, abstract_id: &str, parameters: &Parameters) {
        self.inner.hooks.run_before(abstract_id, parameters);
    }

    pub(crate) fn run_after_hooks(
        &self,
        value: Value,
        abstract_id: &str,
        parameters: &Parameters,
    ) -> Value {
        self.inner.hooks.run_after(value, abstract_id, parameters)
    }

    // ── Resolution cache ──

    pub fn set_external_cache(&self, cache: Arc<dyn ContainerCache>) {
        self.inner.cache.set_external(cache);
    }

    pub fn cache_resolved_service(&self, abstract_id: &str, value: Value) {
        self.inner.cache.store(abstract_id, value);
    }

    /// Last value resolved for every abstract.
    pub fn cached_resolved_services(&self) -> Snapshot {
        self.inner.cache.snapshot()
    }

    /// Flushes the resolution cache to the external cache and empties it.
    ///
    /// Returns the key the snapshot was written under, derived from
    /// `key_source` with [`derive_cache_key`].
    pub fn clear_resolved_services_cache<K: Hash + ?Sized>(&self, key_source: &K) -> String {
        let key = derive_cache_key(key_source);
        self.inner.cache.clear(&key, self.inner.settings.cache_ttl());
        key
    }

    /// Replaces the resolution cache with the external entry under `key`.
    ///
    /// Returns `false` when there is no external cache or no such entry.
    pub fn load_resolved_services_from_external_cache(&self, key: &str) -> bool {
        self.inner.cache.load(key)
    }

    // ── Lifecycle ──

    /// Forgets bindings, instances, aliases, contextual bindings, scopes and
    /// cached type metadata.
    pub fn reset_container(&self) {
        info!("Resetting container");
        self.registry_mut().clear();
        self.inner.contextual.clear();
        self.inner.scopes.lock().clear();
        self.inner.catalog.clear_cache();
    }

    // ── Internal ──

    pub(crate) fn registry(&self) -> RwLockReadGuard<'_, BindingRegistry> {
        self.inner.registry.read()
    }

    pub(crate) fn registry_mut(&self) -> RwLockWriteGuard<'_, BindingRegistry> {
        self.inner.registry.write()
    }

    pub(crate) fn catalog(&self) -> &TypeCatalog {
        &self.inner.catalog
    }

    pub(crate) fn contextual_for(&self, consumer: &str, dependency: &str) -> Option<String> {
        self.inner.contextual.lookup(consumer, dependency)
    }

    /// Builds a [`RabtError::NotFound`] with suggestions for `requested`.
    pub(crate) fn not_found(&self, message: String, requested: &str) -> RabtError {
        let mut known = self.registry().known_ids();
        known.extend(self.inner.catalog.known_names());
        let available: Vec<&str> = known.iter().map(String::as_str).collect();

        RabtError::NotFound(NotFoundError {
            message,
            suggestions: suggest_similar(requested, &available, 3),
        })
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry();
        f.debug_struct("Container")
            .field("bindings", &registry.len())
            .field("instances", &registry.instances_len())
            .field("scopes", &self.inner.scopes.lock().len())
            .field("scope", &self.is_scope())
            .field("cached_types", &self.inner.catalog.cached_len())
            .field("hooks", &self.inner.hooks)
            .finish()
    }
}

/// Opaque key used by
/// [`clear_resolved_services_cache`](Container::clear_resolved_services_cache).
pub fn derive_cache_key<K: Hash + ?Sized>(key_source: &K) -> String {
    ResolutionCache::derive_key(key_source)
}

fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(RabtError::Configuration(ConfigurationError::InvalidKey));
    }
    Ok(())
}

fn union_priority_key(consumer: &str, parameter: &str) -> String {
    format!("{consumer}::${parameter}")
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Concrete, Container, ContainerBuilder};
    pub use crate::cache::{ContainerCache, InMemoryCache, Snapshot};
    pub use crate::callable::{Callable, Function};
    pub use crate::descriptor::{Arguments, Injected, Param, TypeDescriptor, TypeExpr, TypeKind};
    pub use crate::entry::Entry;
    pub use crate::error::{RabtError, Result};
    pub use crate::graph::DependencyGraph;
    pub use crate::lifetime::Lifetime;
    pub use crate::settings::ContainerSettings;
    pub use crate::value::{Instance, Parameters, Value, params};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
