use zvariant::OwnedValue;

use crate::bus::PropertyMap;

/// Property values of one interface as of the last completed refresh.
///
/// A snapshot is never edited in place. Refreshing builds a new one and
/// swaps it in whole.
#[derive(Debug, Default)]
pub struct PropertySnapshot {
    values: PropertyMap,
}

impl PropertySnapshot {
    pub fn new(values: PropertyMap) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&OwnedValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Property names, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl From<PropertyMap> for PropertySnapshot {
    fn from(values: PropertyMap) -> Self {
        Self::new(values)
    }
}
