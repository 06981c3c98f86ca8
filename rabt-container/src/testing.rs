//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::container::Container;
use crate::descriptor::{Param, TypeDescriptor};
use crate::error::Result;
use crate::value::{Instance, Parameters, Value};

/// A type without constructor.
pub(crate) struct Plain;

/// A type whose constructor takes a `Plain`.
pub(crate) struct Holder {
    pub plain: Instance,
}

/// A container knowing `Plain` and `Holder`.
pub(crate) fn fixtures() -> Container {
    let c = Container::new();
    c.register_type(TypeDescriptor::concrete("Plain").instantiate(|_| Ok(Plain)))
        .unwrap();
    c.register_type(
        TypeDescriptor::concrete("Holder")
            .constructor([Param::new("plain", "Plain")])
            .instantiate(|args| {
                Ok(Holder {
                    plain: args.instance(0)?,
                })
            }),
    )
    .unwrap();
    c
}

/// A producer returning a fresh object and counting its calls.
pub(crate) fn counting_factory() -> (
    Arc<AtomicUsize>,
    impl Fn(&Container, &Parameters) -> Result<Value> + Send + Sync + 'static,
) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let factory = move |_: &Container, _: &Parameters| -> Result<Value> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::object("Counted", ()))
    };
    (calls, factory)
}
