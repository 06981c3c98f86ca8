//! # Rabt — runtime autowiring container for Rust
//!
//! Describe your types once, bind abstractions to implementations, and let
//! the container build object graphs: union and intersection parameters,
//! contextual overrides, scopes, tags, hooks and circular dependencies
//! included.
//!
//! ```
//! use rabt::prelude::*;
//!
//! struct Clock;
//! struct Scheduler {
//!     clock: Instance,
//! }
//!
//! let container = Container::builder()
//!     .register_type(TypeDescriptor::concrete("Clock").instantiate(|_| Ok(Clock)))
//!     .register_type(
//!         TypeDescriptor::concrete("Scheduler")
//!             .constructor([Param::new("clock", "Clock")])
//!             .instantiate(|args| Ok(Scheduler { clock: args.instance(0)? })),
//!     )
//!     .build()
//!     .unwrap();
//!
//! container.singleton_self("Clock").unwrap();
//! let scheduler = container.make_as::<Scheduler>("Scheduler").unwrap();
//! assert_eq!(scheduler.clock, container.make("Clock").unwrap().into_instance().unwrap());
//! ```

pub use rabt_container::*;
pub use rabt_support::logging::init_logging;
pub use rabt_support::rendering;
