//! Immutable emitter-identity labels, supplied by the `Tracer` and opaque to
//! the span itself. Resource *detection* is an external collaborator; this
//! module only carries the finished map.

use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Resource {
    labels: Arc<BTreeMap<String, String>>,
}

impl Resource {
    pub fn empty() -> Self {
        Resource::default()
    }

    pub fn new(labels: impl IntoIterator<Item = (String, String)>) -> Self {
        Resource {
            labels: Arc::new(labels.into_iter().collect()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
