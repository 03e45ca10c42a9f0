use super::{OrderedMap, Udm};

/// A UDM object node.
///
/// `name` carries the element name for sources that have one (XML), the
/// `attributes` and `metadata` maps carry format details needed for
/// round-trip export. Only `properties` take part in equality and operators.
#[derive(Debug, Clone, Default)]
pub struct Object {
    pub name: Option<String>,
    pub attributes: OrderedMap<String>,
    pub properties: OrderedMap<Udm>,
    pub metadata: OrderedMap<String>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Object {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Udm) -> Self {
        self.properties.insert(key, value);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key, value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value.into());
        self
    }

    /// Spread `source`'s properties into this object.
    ///
    /// Keys already present keep their position and take the new value; new
    /// keys are appended in `source` order.
    pub fn merged(mut self, source: &Object) -> Self {
        for (key, value) in source.properties.iter() {
            self.properties.insert(key, value.clone());
        }
        self
    }

    pub fn property(&self, key: &str) -> Option<&Udm> {
        self.properties.get(key)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties
    }
}

impl FromIterator<(String, Udm)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Udm)>>(iter: I) -> Self {
        Object {
            properties: iter.into_iter().collect(),
            ..Object::default()
        }
    }
}
