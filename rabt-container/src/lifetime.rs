//! Binding lifetimes.
//!
//! - [`Lifetime::Shared`]: produced once, then served from the instance slot
//!   until the container is reset.
//! - [`Lifetime::Transient`]: the producer runs on every `make`.
use std::fmt;

/// How long a bound value lives inside the container.
///
/// ```
/// use rabt_container::lifetime::Lifetime;
///
/// assert!(Lifetime::Shared.is_shared());
/// assert_eq!(Lifetime::from_shared(false), Lifetime::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// One value per container, stored in the instance slot on first `make`.
    ///
    /// Registered with `singleton*` or `Entry::Shared`.
    Shared,

    /// A fresh value on every `make`.
    #[default]
    Transient,
}

impl Lifetime {
    #[inline]
    pub fn from_shared(shared: bool) -> Self {
        if shared {
            Lifetime::Shared
        } else {
            Lifetime::Transient
        }
    }

    /// Returns `true` if produced values are kept in the instance slot.
    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self, Lifetime::Shared)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Shared => write!(f, "Shared"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}
