//! Values that flow through the container.
//!
//! Producers, hooks and explicit parameters all exchange [`Value`]s. Objects
//! are carried as [`Instance`] handles: either a ready `Arc` or a deferred
//! stand-in created while breaking a circular dependency.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::circular::DeferredProxy;
use crate::error::{RabtError, Result};

/// Type-erased shared object.
pub type Object = Arc<dyn Any + Send + Sync>;

/// Explicit parameters passed to `make`, producers and hooks.
pub type Parameters = HashMap<String, Value>;

/// Builds a [`Parameters`] map from pairs.
///
/// ```
/// use rabt_container::value::{params, Value};
///
/// let p = params([("dsn", "sqlite::memory:")]);
/// assert_eq!(p.get("dsn"), Some(&Value::from("sqlite::memory:")));
/// ```
pub fn params<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Parameters
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A dynamically typed value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Instance(Instance),
}

impl Value {
    /// Wraps `object` as an instance of `class`.
    pub fn object<T: Any + Send + Sync>(class: impl Into<String>, object: T) -> Self {
        Value::Instance(Instance::new(class, object))
    }

    /// Runtime type name, used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Instance(instance) => instance.class_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn into_instance(self) -> Option<Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Typed access to the object behind this value.
    ///
    /// Deferred instances are resolved first.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        match self {
            Value::Instance(instance) => instance.get::<T>(),
            other => Err(RabtError::container(format!(
                "Type mismatch: expected {}, got {}",
                type_name::<T>(),
                other.type_name()
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Instance> for Value {
    fn from(value: Instance) -> Self {
        Value::Instance(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Handle to an object produced by the container.
///
/// Cloning an `Instance` clones the handle, not the object; use
/// [`Instance::ptr_eq`] for identity.
#[derive(Clone)]
pub struct Instance {
    repr: Repr,
}

#[derive(Clone)]
enum Repr {
    Ready { class: Arc<str>, object: Object },
    Deferred(Arc<DeferredProxy>),
}

impl Instance {
    /// Wraps `object`, recording `class` as its type name.
    pub fn new<T: Any + Send + Sync>(class: impl Into<String>, object: T) -> Self {
        Self::from_arc(class, Arc::new(object))
    }

    /// Wraps an already shared object.
    pub fn from_arc<T: Any + Send + Sync>(class: impl Into<String>, object: Arc<T>) -> Self {
        let class: String = class.into();
        Self {
            repr: Repr::Ready {
                class: class.into(),
                object,
            },
        }
    }

    pub(crate) fn deferred(proxy: DeferredProxy) -> Self {
        Self {
            repr: Repr::Deferred(Arc::new(proxy)),
        }
    }

    /// The class this instance was produced as.
    ///
    /// For a deferred instance this is the abstract it stands in for.
    pub fn class_name(&self) -> &str {
        match &self.repr {
            Repr::Ready { class, .. } => &**class,
            Repr::Deferred(proxy) => proxy.target(),
        }
    }

    /// `true` when this handle is a circular-dependency stand-in.
    pub fn is_deferred(&self) -> bool {
        matches!(self.repr, Repr::Deferred(_))
    }

    /// `true` once the real object is available without further resolution.
    pub fn is_resolved(&self) -> bool {
        match &self.repr {
            Repr::Ready { .. } => true,
            Repr::Deferred(proxy) => proxy.is_resolved(),
        }
    }

    /// The real object, resolving a deferred instance on first access.
    pub fn object(&self) -> Result<Object> {
        match &self.repr {
            Repr::Ready { object, .. } => Ok(object.clone()),
            Repr::Deferred(proxy) => proxy.resolve()?.object(),
        }
    }

    /// Typed access to the real object.
    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        let class = self.class_name().to_string();
        self.object()?.downcast::<T>().map_err(|_| {
            RabtError::container(format!(
                "Type mismatch: [{class}] is not a {}",
                type_name::<T>()
            ))
        })
    }

    /// Identity comparison of two handles.
    pub fn ptr_eq(a: &Instance, b: &Instance) -> bool {
        match (&a.repr, &b.repr) {
            (Repr::Ready { object: x, .. }, Repr::Ready { object: y, .. }) => Arc::ptr_eq(x, y),
            (Repr::Deferred(x), Repr::Deferred(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    /// The object without triggering resolution.
    pub(crate) fn ready_object(&self) -> Option<&Object> {
        match &self.repr {
            Repr::Ready { object, .. } => Some(object),
            Repr::Deferred(_) => None,
        }
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Instance::ptr_eq(self, other)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Ready { class, .. } => write!(f, "Instance({class})"),
            Repr::Deferred(proxy) => write!(
                f,
                "Deferred({}, resolved={})",
                proxy.target(),
                proxy.is_resolved()
            ),
        }
    }
}
