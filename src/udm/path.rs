use super::Udm;

/// One step of a navigation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object property by key
    Property(String),
    /// Object attribute by name; only valid as the last step
    Attribute(String),
    /// Array element; negative indices count from the end
    Index(i64),
}

/// Result of [`Udm::get`].
///
/// `Found(&Udm::Null)` means the path exists and holds null, `Missing` means
/// it does not exist. `depth` is the index of the first segment that could not
/// be resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Navigation<'a> {
    Found(&'a Udm),
    Attribute(&'a str),
    Missing { depth: usize },
}

impl<'a> Navigation<'a> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Navigation::Missing { .. })
    }
}

/// Resolve a possibly negative index against a length.
pub(crate) fn resolve_index(index: i64, len: usize) -> Option<usize> {
    if index < 0 {
        let back = index.unsigned_abs() as usize;
        if back > len { None } else { Some(len - back) }
    } else {
        let i = index as usize;
        if i < len { Some(i) } else { None }
    }
}

impl Udm {
    /// Follow `path` from this node.
    pub fn get(&self, path: &[PathSegment]) -> Navigation<'_> {
        let mut current = self;
        for (depth, segment) in path.iter().enumerate() {
            let last = depth + 1 == path.len();
            match (current, segment) {
                (Udm::Object(object), PathSegment::Property(key)) => match object.property(key) {
                    Some(next) => current = next,
                    None => return Navigation::Missing { depth },
                },
                (Udm::Object(object), PathSegment::Attribute(name)) if last => {
                    return match object.attribute(name) {
                        Some(value) => Navigation::Attribute(value),
                        None => Navigation::Missing { depth },
                    };
                }
                (Udm::Array(items), PathSegment::Index(index)) => {
                    match resolve_index(*index, items.len()) {
                        Some(i) => current = &items[i],
                        None => return Navigation::Missing { depth },
                    }
                }
                _ => return Navigation::Missing { depth },
            }
        }
        Navigation::Found(current)
    }
}
