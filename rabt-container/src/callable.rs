//! Calling functions and methods with autowired arguments.
//!
//! ```
//! use rabt_container::prelude::*;
//!
//! let c = Container::new();
//! c.instance("greeting", Value::from("hello")).unwrap();
//!
//! let shout = Function::new([Param::untyped("word")], |args| {
//!     Ok(Value::from(args.string(0)?.to_uppercase()))
//! });
//! let out = c
//!     .call(&Callable::Function(shout), &params([("word", "hi")]))
//!     .unwrap();
//! assert_eq!(out, Value::from("HI"));
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::container::Container;
use crate::descriptor::{Arguments, INVOKE_METHOD, Param};
use crate::error::{RabtError, Result};
use crate::value::{Instance, Parameters, Value};

/// Consumer name used for contextual lookups while calling a [`Function`].
pub const FUNCTION_CONSUMER: &str = "ClosureOrFunction";

type FunctionBody = Arc<dyn Fn(Arguments) -> Result<Value> + Send + Sync>;

/// A closure together with its declared parameters.
#[derive(Clone)]
pub struct Function {
    params: Vec<Param>,
    body: FunctionBody,
}

impl Function {
    pub fn new<F>(params: impl IntoIterator<Item = Param>, body: F) -> Self
    where
        F: Fn(Arguments) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            params: params.into_iter().collect(),
            body: Arc::new(body),
        }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .finish()
    }
}

/// Something [`Container::call`] can invoke.
#[derive(Debug, Clone)]
pub enum Callable {
    /// A free function or closure.
    Function(Function),
    /// An instance whose type declares an `invoke` method.
    Invokable(Value),
    /// A method on an instance, or on whatever a string abstract resolves to.
    Method(Value, String),
}

impl Callable {
    pub fn method(target: impl Into<Value>, method: impl Into<String>) -> Self {
        Callable::Method(target.into(), method.into())
    }
}

impl Container {
    /// Invokes `callable`, resolving its parameters like constructor
    /// parameters. Explicit `parameters` win over autowiring.
    pub fn call(&self, callable: &Callable, parameters: &Parameters) -> Result<Value> {
        match callable {
            Callable::Function(function) => {
                let arguments =
                    self.resolve_arguments(&function.params, parameters, FUNCTION_CONSUMER)?;
                trace!(arguments = arguments.len(), "Calling function");
                with_call_context(
                    FUNCTION_CONSUMER,
                    (function.body)(Arguments::new(FUNCTION_CONSUMER, arguments)),
                )
            }
            Callable::Invokable(Value::Instance(instance)) => {
                self.call_method(instance, INVOKE_METHOD, parameters)
            }
            Callable::Method(Value::Instance(instance), method) => {
                self.call_method(instance, method, parameters)
            }
            Callable::Method(Value::Str(abstract_id), method) => {
                let target = self.make(abstract_id)?;
                let Value::Instance(instance) = target else {
                    return Err(RabtError::container(
                        "Callable resolution error: Expected instance to be an object.",
                    ));
                };
                self.call_method(&instance, method, parameters)
            }
            Callable::Invokable(other) | Callable::Method(other, _) => Err(RabtError::container(
                format!("Unsupported callable type: {}", other.type_name()),
            )),
        }
    }

    fn call_method(
        &self,
        instance: &Instance,
        method: &str,
        parameters: &Parameters,
    ) -> Result<Value> {
        let class = instance.class_name().to_string();
        let Some((owner, descriptor)) = self.catalog().find_method(&class, method) else {
            return Err(if method == INVOKE_METHOD {
                RabtError::container(format!("Unsupported callable type: {class}"))
            } else {
                RabtError::container(format!("Method {class}::{method}() does not exist."))
            });
        };

        let label = format!("{owner}::{method}");
        let arguments = self.resolve_arguments(&descriptor.params, parameters, &owner)?;
        let object = instance.object()?;
        trace!(method = %label, arguments = arguments.len(), "Calling method");
        with_call_context(
            &label,
            (descriptor.invoke)(&object, Arguments::new(label.clone(), arguments)),
        )
    }
}

fn with_call_context(label: &str, result: Result<Value>) -> Result<Value> {
    result.map_err(|err| match err {
        RabtError::Introspection(message) => RabtError::container_caused_by(
            format!("Failed to call [{label}]: {message}"),
            RabtError::Introspection(message),
        ),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeDescriptor;
    use crate::testing::{Plain, fixtures};
    use crate::value::params;

    struct Greeter {
        greeting: &'static str,
    }

    fn greeter_container() -> Container {
        let c = fixtures();
        c.register_type(
            TypeDescriptor::concrete("Greeter")
                .method::<Greeter, _>(
                    "invoke",
                    [Param::new("name", "string")],
                    |this, args| Ok(Value::from(format!("{} {}", this.greeting, args.string(0)?))),
                )
                .method::<Greeter, _>("describe", [Param::new("plain", "Plain")], |_, args| {
                    Ok(Value::from(args.instance(0)?.class_name()))
                })
                .instantiate(|_| Ok(Greeter { greeting: "hello" })),
        )
        .unwrap();
        c
    }

    #[test]
    fn function_parameters_are_autowired() {
        let c = fixtures();
        let f = Function::new([Param::new("plain", "Plain")], |args| {
            args.object::<Plain>(0)?;
            Ok(Value::from("got plain"))
        });
        let out = c.call(&Callable::Function(f), &Parameters::new()).unwrap();
        assert_eq!(out, Value::from("got plain"));
    }

    #[test]
    fn function_contextual_consumer_name() {
        let c = fixtures();
        c.register_type(TypeDescriptor::capability("Shape").finish()).unwrap();
        c.when(FUNCTION_CONSUMER).needs("Shape").give("Plain");

        let f = Function::new([Param::new("shape", "Shape")], |args| {
            Ok(Value::from(args.instance(0)?.class_name()))
        });
        let out = c.call(&Callable::Function(f), &Parameters::new()).unwrap();
        assert_eq!(out, Value::from("Plain"));
    }

    #[test]
    fn variadic_function_arguments_are_flattened() {
        let c = Container::new();
        let f = Function::new([Param::variadic("numbers")], |args| {
            let sum: i64 = args.rest(0).iter().filter_map(Value::as_int).sum();
            Ok(Value::Int(sum))
        });
        let out = c
            .call(&Callable::Function(f), &params([("numbers", vec![1, 2, 3])]))
            .unwrap();
        assert_eq!(out, Value::Int(6));
    }

    #[test]
    fn invokable_instances() {
        let c = greeter_container();
        let greeter = c.make("Greeter").unwrap();
        let out = c
            .call(&Callable::Invokable(greeter), &params([("name", "ada")]))
            .unwrap();
        assert_eq!(out, Value::from("hello ada"));
    }

    #[test]
    fn method_on_string_target_is_made_first() {
        let c = greeter_container();
        let out = c
            .call(&Callable::method("Greeter", "describe"), &Parameters::new())
            .unwrap();
        assert_eq!(out, Value::from("Plain"));
    }

    #[test]
    fn unsupported_shapes() {
        let c = greeter_container();

        let err = c.call(&Callable::Invokable(Value::Int(3)), &Parameters::new()).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported callable type: int");

        let plain = c.make("Plain").unwrap();
        let err = c.call(&Callable::Invokable(plain), &Parameters::new()).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported callable type: Plain");

        let err = c
            .call(&Callable::Method(Value::Bool(true), "x".into()), &Parameters::new())
            .unwrap_err();
        assert!(err.is_container_error());
    }

    #[test]
    fn unknown_method() {
        let c = greeter_container();
        let err = c
            .call(&Callable::method("Greeter", "shout"), &Parameters::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Method Greeter::shout() does not exist.");
    }

    #[test]
    fn non_object_method_target() {
        let c = Container::new();
        c.instance("number", Value::Int(1)).unwrap();
        let err = c
            .call(&Callable::method("number", "anything"), &Parameters::new())
            .unwrap_err();
        assert!(err.to_string().contains("Expected instance to be an object."));
    }

    #[test]
    fn argument_errors_name_the_callee() {
        let c = greeter_container();
        let greeter = c.make("Greeter").unwrap();
        let err = c
            .call(&Callable::Invokable(greeter), &params([("name", 42)]))
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to call [Greeter::invoke]: "));
    }
}
