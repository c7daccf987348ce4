use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

/// The caller-supplied view of the archive being decompiled: a byte fetch
/// for class files, and the set of names the archive contains.
///
/// Implementations must be cheap to clone, since batched resolution fans
/// fetches out onto separate tasks.
#[async_trait]
pub trait ClassEnvironment: Clone + Send + Sync + 'static {
    /// Returns the raw bytes of the named class, or `None` when there is no
    /// entry for it. Must accept arbitrary names, including ones never seen
    /// before.
    async fn fetch(&self, class_name: &str) -> Option<Vec<u8>>;

    /// Whether the name belongs to the archive. Names outside this set are
    /// treated as external library types and are never fetched.
    fn is_known(&self, class_name: &str) -> bool;
}

/// A ready-made environment over an in-memory map from class name to class
/// bytes; the known names are exactly the map's keys.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    classes: Arc<HashMap<String, Vec<u8>>>,
}

impl MapEnvironment {
    pub fn new(classes: HashMap<String, Vec<u8>>) -> Self {
        Self {
            classes: Arc::new(classes),
        }
    }
}

impl FromIterator<(String, Vec<u8>)> for MapEnvironment {
    fn from_iter<T: IntoIterator<Item = (String, Vec<u8>)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl ClassEnvironment for MapEnvironment {
    async fn fetch(&self, class_name: &str) -> Option<Vec<u8>> {
        self.classes.get(class_name).cloned()
    }

    fn is_known(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }
}
