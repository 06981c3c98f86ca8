//! Type descriptors — the container's view of a type.
//!
//! Rust has no runtime reflection, so every type the container should be
//! able to autowire describes itself once: its kind, the capabilities it
//! satisfies, its constructor signature, fields marked for injection and
//! the methods [`Container::call`](crate::container::Container::call) may
//! invoke.
//!
//! # Examples
//! ```rust
//! use rabt_container::descriptor::{Param, TypeDescriptor};
//! use rabt_container::value::Instance;
//!
//! struct Mailer {
//!     transport: Instance,
//!     retries: i64,
//! }
//!
//! let descriptor = TypeDescriptor::concrete("Mailer")
//!     .constructor([
//!         Param::new("transport", "Transport"),
//!         Param::new("retries", "int").with_default(3),
//!     ])
//!     .instantiate(|args| {
//!         Ok(Mailer {
//!             transport: args.instance(0)?,
//!             retries: args.int(1)?,
//!         })
//!     });
//!
//! assert!(descriptor.is_instantiable());
//! assert_eq!(descriptor.constructor().unwrap().params.len(), 2);
//! ```

use std::any::{Any, type_name};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rabt_support::rendering::render_list;

use crate::error::{RabtError, Result};
use crate::value::{Instance, Object, Value};

/// Type names treated as primitives; they are never autowired.
pub const BUILTIN_TYPES: &[&str] = &[
    "bool", "int", "float", "string", "array", "iterable", "callable", "object", "mixed",
    "null", "void", "never", "false", "true", "i8", "i16", "i32", "i64", "u8", "u16", "u32",
    "u64", "usize", "isize", "f32", "f64", "str", "char", "String",
];

/// Name of the method that makes an instance invokable.
pub const INVOKE_METHOD: &str = "invoke";

/// Builds a type from its resolved, variadic-flattened arguments.
pub type Factory = Arc<dyn Fn(Arguments) -> Result<Value> + Send + Sync>;

/// Finds an injectable slot inside a built object.
pub type SlotAccessor =
    Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Option<&Injected> + Send + Sync>;

/// Invokes a method on a built object.
pub type MethodFn = Arc<dyn Fn(&Object, Arguments) -> Result<Value> + Send + Sync>;

/// A single named type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
    pub builtin: bool,
}

impl TypeRef {
    /// A reference whose builtin flag is taken from [`BUILTIN_TYPES`].
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let builtin = BUILTIN_TYPES.contains(&name.as_str());
        Self { name, builtin }
    }

    /// A reference that is never treated as builtin.
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            builtin: false,
        }
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            builtin: true,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Declared type of a parameter or field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(TypeRef),
    /// The value may satisfy any one of the listed types.
    Union(Vec<TypeRef>),
    /// The value must satisfy every listed type.
    Intersection(Vec<TypeRef>),
}

impl TypeExpr {
    /// Parses `"A"`, `"?A"`, `"A|B"` or `"A&B"`.
    ///
    /// ```
    /// use rabt_container::descriptor::{TypeExpr, TypeRef};
    ///
    /// assert_eq!(TypeExpr::parse("Logger"), TypeExpr::Named(TypeRef::class("Logger")));
    /// assert!(matches!(TypeExpr::parse("A | B"), TypeExpr::Union(ref t) if t.len() == 2));
    /// assert!(matches!(TypeExpr::parse("A&B"), TypeExpr::Intersection(_)));
    /// assert!(matches!(TypeExpr::parse("int"), TypeExpr::Named(ref t) if t.builtin));
    /// ```
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        let split = |separator: char| -> Vec<TypeRef> {
            source
                .split(separator)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(TypeRef::named)
                .collect()
        };

        if source.contains('|') {
            TypeExpr::Union(split('|'))
        } else if source.contains('&') {
            TypeExpr::Intersection(split('&'))
        } else {
            TypeExpr::Named(TypeRef::named(source.trim_start_matches('?')))
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(TypeRef::named(name))
    }

    pub fn union<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        TypeExpr::Union(names.into_iter().map(TypeRef::named).collect())
    }

    pub fn intersection<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        TypeExpr::Intersection(names.into_iter().map(TypeRef::named).collect())
    }

    /// The single non-builtin type, if this is one.
    pub fn as_class(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(ty) if !ty.builtin => Some(&ty.name),
            _ => None,
        }
    }
}

impl From<&str> for TypeExpr {
    fn from(source: &str) -> Self {
        TypeExpr::parse(source)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(ty) => write!(f, "{ty}"),
            TypeExpr::Union(types) => write!(f, "{}", render_list(&names(types), "|")),
            TypeExpr::Intersection(types) => write!(f, "{}", render_list(&names(types), "&")),
        }
    }
}

fn names(types: &[TypeRef]) -> Vec<&str> {
    types.iter().map(|t| t.name.as_str()).collect()
}

/// A constructor, method or closure parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub default: Option<Value>,
    pub variadic: bool,
}

impl Param {
    /// A typed parameter; `ty` is parsed with [`TypeExpr::parse`].
    pub fn new(name: impl Into<String>, ty: &str) -> Self {
        Self::typed(name, TypeExpr::parse(ty))
    }

    pub fn typed(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            default: None,
            variadic: false,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            default: None,
            variadic: false,
        }
    }

    /// A trailing parameter collecting any number of values.
    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            variadic: true,
            ..Self::untyped(name)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Optional parameters carry a default value.
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// Constructor signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    /// Type that declares the constructor (may be a supertype).
    pub owner: String,
    pub method: String,
    pub params: Vec<Param>,
}

impl Constructor {
    /// `Owner::method`, as shown in build errors.
    pub fn label(&self) -> String {
        format!("{}::{}", self.owner, self.method)
    }
}

/// Positional arguments handed to a factory, method or closure.
///
/// Accessors fail with [`RabtError::Introspection`] when the argument list
/// does not match what the callee expects.
#[derive(Debug, Clone)]
pub struct Arguments {
    callee: String,
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(callee: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            callee: callee.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The argument at `index`, cloned.
    pub fn value(&self, index: usize) -> Result<Value> {
        self.values.get(index).cloned().ok_or_else(|| {
            RabtError::Introspection(format!(
                "Missing argument #{index} for [{}] ({} given)",
                self.callee,
                self.values.len()
            ))
        })
    }

    pub fn instance(&self, index: usize) -> Result<Instance> {
        match self.value(index)? {
            Value::Instance(instance) => Ok(instance),
            other => Err(self.mismatch(index, "object", &other)),
        }
    }

    /// Typed access to an object argument (resolves deferred instances).
    pub fn object<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        self.instance(index)?.get::<T>()
    }

    pub fn string(&self, index: usize) -> Result<String> {
        match self.value(index)? {
            Value::Str(s) => Ok(s),
            other => Err(self.mismatch(index, "string", &other)),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        match self.value(index)? {
            Value::Int(i) => Ok(i),
            other => Err(self.mismatch(index, "int", &other)),
        }
    }

    pub fn bool(&self, index: usize) -> Result<bool> {
        match self.value(index)? {
            Value::Bool(b) => Ok(b),
            other => Err(self.mismatch(index, "bool", &other)),
        }
    }

    /// Every argument from `index` on (the flattened variadic tail).
    pub fn rest(&self, index: usize) -> Vec<Value> {
        self.values.iter().skip(index).cloned().collect()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    fn mismatch(&self, index: usize, expected: &str, got: &Value) -> RabtError {
        RabtError::Introspection(format!(
            "Argument #{index} for [{}] must be {expected}, got {}",
            self.callee,
            got.type_name()
        ))
    }
}

/// A field filled by the container after construction.
///
/// The slot is write-once and only the container can write it; user code
/// reads it through [`Injected::get`] and friends.
#[derive(Default)]
pub struct Injected {
    cell: OnceCell<Value>,
}

impl Injected {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Value> {
        self.cell.get()
    }

    pub fn instance(&self) -> Option<&Instance> {
        self.cell.get().and_then(Value::as_instance)
    }

    /// Typed access to the injected object.
    pub fn object<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        match self.cell.get() {
            Some(value) => value.downcast::<T>(),
            None => Err(RabtError::container(format!(
                "Injectable field of type {} has not been injected.",
                type_name::<T>()
            ))),
        }
    }

    pub fn is_filled(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns `false` when the slot was already filled.
    pub(crate) fn fill(&self, value: Value) -> bool {
        self.cell.set(value).is_ok()
    }
}

impl fmt::Debug for Injected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => write!(f, "Injected({value:?})"),
            None => write!(f, "Injected(<empty>)"),
        }
    }
}

/// A field marked for injection.
#[derive(Clone)]
pub struct InjectableField {
    pub name: String,
    pub ty: TypeExpr,
    pub(crate) slot: SlotAccessor,
}

impl fmt::Debug for InjectableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectableField")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish()
    }
}

/// A method the container can call with autowired arguments.
#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<Param>,
    pub(crate) invoke: MethodFn,
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// What kind of type a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Can be instantiated.
    Concrete,
    /// Participates in is-a checks but cannot be instantiated.
    Abstract,
    /// A named capability (interface) other types declare.
    Capability,
}

/// Everything the container knows about one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    supertypes: Vec<String>,
    constructor: Option<Constructor>,
    fields: Vec<InjectableField>,
    methods: Vec<MethodDescriptor>,
    factory: Option<Factory>,
}

impl TypeDescriptor {
    pub fn concrete(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(name, TypeKind::Concrete)
    }

    pub fn abstract_class(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(name, TypeKind::Abstract)
    }

    pub fn capability(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(name, TypeKind::Capability)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Directly declared supertypes (parents and capabilities).
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    pub fn fields(&self) -> &[InjectableField] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn is_instantiable(&self) -> bool {
        self.kind == TypeKind::Concrete && self.factory.is_some()
    }

    /// Runs the factory.
    pub fn instantiate(&self, arguments: Arguments) -> Result<Value> {
        match &self.factory {
            Some(factory) => factory(arguments),
            None => Err(RabtError::container(format!(
                "Cannot instantiate [{}].",
                self.name
            ))),
        }
    }

    /// Checks the metadata for anomalies the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let Some(constructor) = &self.constructor else {
            return Ok(());
        };

        let mut seen = HashSet::new();
        for (position, param) in constructor.params.iter().enumerate() {
            if !seen.insert(param.name.as_str()) {
                return Err(RabtError::Introspection(format!(
                    "Duplicate parameter [${}] in {}",
                    param.name,
                    constructor.label()
                )));
            }
            if param.variadic && position + 1 != constructor.params.len() {
                return Err(RabtError::Introspection(format!(
                    "Variadic parameter [${}] must be last in {}",
                    param.name,
                    constructor.label()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("supertypes", &self.supertypes)
            .field("constructor", &self.constructor)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("instantiable", &self.is_instantiable())
            .finish()
    }
}

/// Fluent builder for [`TypeDescriptor`].
pub struct TypeBuilder {
    descriptor: TypeDescriptor,
}

impl TypeBuilder {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            descriptor: TypeDescriptor {
                name: name.into(),
                kind,
                supertypes: Vec::new(),
                constructor: None,
                fields: Vec::new(),
                methods: Vec::new(),
                factory: None,
            },
        }
    }

    /// Declares a parent type.
    pub fn extends(self, parent: impl Into<String>) -> Self {
        self.implements(parent)
    }

    /// Declares a satisfied capability.
    pub fn implements(mut self, capability: impl Into<String>) -> Self {
        self.descriptor.supertypes.push(capability.into());
        self
    }

    /// Declares a constructor owned by the type itself.
    pub fn constructor(self, params: impl IntoIterator<Item = Param>) -> Self {
        let owner = self.descriptor.name.clone();
        self.constructor_declared_by(owner, params)
    }

    /// Declares a constructor inherited from `owner`.
    pub fn constructor_declared_by(
        mut self,
        owner: impl Into<String>,
        params: impl IntoIterator<Item = Param>,
    ) -> Self {
        self.descriptor.constructor = Some(Constructor {
            owner: owner.into(),
            method: "new".to_string(),
            params: params.into_iter().collect(),
        });
        self
    }

    /// Marks a field for injection.
    ///
    /// `slot` locates the field's [`Injected`] cell on a built object.
    pub fn inject<F>(mut self, field: impl Into<String>, ty: &str, slot: F) -> Self
    where
        F: Fn(&(dyn Any + Send + Sync)) -> Option<&Injected> + Send + Sync + 'static,
    {
        self.descriptor.fields.push(InjectableField {
            name: field.into(),
            ty: TypeExpr::parse(ty),
            slot: Arc::new(slot),
        });
        self
    }

    /// Declares a method callable through the container.
    pub fn method<T, F>(
        mut self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = Param>,
        body: F,
    ) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, Arguments) -> Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let owner = self.descriptor.name.clone();
        let label = format!("{owner}::{name}");
        let invoke: MethodFn = Arc::new(move |object: &Object, arguments: Arguments| {
            let this = object.downcast_ref::<T>().ok_or_else(|| {
                RabtError::Introspection(format!(
                    "Receiver of [{label}] is not a {}",
                    type_name::<T>()
                ))
            })?;
            body(this, arguments)
        });
        self.descriptor.methods.push(MethodDescriptor {
            name,
            params: params.into_iter().collect(),
            invoke,
        });
        self
    }

    /// Finishes the descriptor with a typed factory.
    pub fn instantiate<T, F>(self, factory: F) -> TypeDescriptor
    where
        T: Any + Send + Sync,
        F: Fn(Arguments) -> Result<T> + Send + Sync + 'static,
    {
        let class = self.descriptor.name.clone();
        self.instantiate_with(move |arguments| {
            factory(arguments).map(|object| Value::object(class.clone(), object))
        })
    }

    /// Finishes the descriptor with a factory returning any [`Value`].
    pub fn instantiate_with<F>(mut self, factory: F) -> TypeDescriptor
    where
        F: Fn(Arguments) -> Result<Value> + Send + Sync + 'static,
    {
        self.descriptor.factory = Some(Arc::new(factory));
        self.descriptor
    }

    /// Finishes a descriptor without a factory (capabilities, abstract types).
    pub fn finish(self) -> TypeDescriptor {
        self.descriptor
    }
}
