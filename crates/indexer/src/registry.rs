use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute types discovered on classes: `class id → attribute → type`.
///
/// Filled from `self.attr = Factory()` assignments. Each file contributes its own
/// registry during the first pass; the pipeline merges them in file order so later
/// files overwrite earlier entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRegistry {
    classes: BTreeMap<String, BTreeMap<String, String>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: &str, attribute: &str, ty: &str) {
        self.classes
            .entry(class.to_string())
            .or_default()
            .insert(attribute.to_string(), ty.to_string());
    }

    pub fn attribute_type(&self, class: &str, attribute: &str) -> Option<&str> {
        self.classes
            .get(class)
            .and_then(|attrs| attrs.get(attribute))
            .map(String::as_str)
    }

    pub fn merge(&mut self, other: ClassRegistry) {
        for (class, attrs) in other.classes {
            self.classes.entry(class).or_default().extend(attrs);
        }
    }

    pub fn len(&self) -> usize {
        self.classes.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
