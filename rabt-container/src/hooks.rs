//! Before/after resolution hooks.
//!
//! Hooks run in registration order. The hook lists are snapshotted before
//! running, so a hook may itself register hooks or resolve entries.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::value::{Parameters, Value};

/// Observes a resolution about to happen.
pub type BeforeHook = Arc<dyn Fn(&str, &Parameters) + Send + Sync>;

/// Observes a produced value; `Some` replaces it.
pub type AfterHook = Arc<dyn Fn(&Value, &str, &Parameters) -> Option<Value> + Send + Sync>;

#[derive(Default)]
pub(crate) struct HookPipeline {
    before: RwLock<Vec<BeforeHook>>,
    after: RwLock<Vec<AfterHook>>,
}

impl HookPipeline {
    pub fn add_before(&self, hook: BeforeHook) {
        self.before.write().push(hook);
    }

    pub fn add_after(&self, hook: AfterHook) {
        self.after.write().push(hook);
    }

    pub fn run_before(&self, abstract_id: &str, parameters: &Parameters) {
        let hooks = self.before.read().clone();
        for hook in hooks {
            hook(abstract_id, parameters);
        }
    }

    /// Substitutions are cumulative: each hook sees the current value.
    pub fn run_after(&self, value: Value, abstract_id: &str, parameters: &Parameters) -> Value {
        let hooks = self.after.read().clone();
        hooks.iter().fold(value, |current, hook| {
            hook(&current, abstract_id, parameters).unwrap_or(current)
        })
    }

    pub fn counts(&self) -> (usize, usize) {
        (self.before.read().len(), self.after.read().len())
    }
}

impl std::fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (before, after) = self.counts();
        f.debug_struct("HookPipeline")
            .field("before", &before)
            .field("after", &after)
            .finish()
    }
}
