//! Named groups of abstract identifiers.

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

/// Tag name → member identifiers, duplicates kept, insertion order preserved.
#[derive(Debug, Default)]
pub(crate) struct TagRegistry {
    tags: RwLock<IndexMap<String, Vec<String>>>,
}

impl TagRegistry {
    pub fn tag<S: AsRef<str>>(&self, tag: &str, ids: &[S]) {
        debug!(tag, count = ids.len(), "Tagged identifiers");
        self.tags
            .write()
            .entry(tag.to_string())
            .or_default()
            .extend(ids.iter().map(|id| id.as_ref().to_string()));
    }

    pub fn members(&self, tag: &str) -> Vec<String> {
        self.tags.read().get(tag).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_append_without_dedup() {
        let tags = TagRegistry::default();
        tags.tag("reports", &["Daily", "Weekly"]);
        tags.tag("reports", &["Daily"]);
        assert_eq!(tags.members("reports"), vec!["Daily", "Weekly", "Daily"]);
    }

    #[test]
    fn unknown_tag_is_empty() {
        let tags = TagRegistry::default();
        assert!(tags.members("nothing").is_empty());
    }
}
