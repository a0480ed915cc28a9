use std::fmt::Display;

/// Encodes a user supplied filter so it can be appended to a collection path.
///
/// Spaces become `%20` and leading `?` characters are dropped. Empty filters
/// are treated as if none was given.
pub fn encode_filter(filter: &str) -> Option<String> {
    let encoded = filter.replace(' ', "%20");
    let encoded = encoded.trim_start_matches('?');
    if encoded.is_empty() {
        None
    } else {
        Some(encoded.to_string())
    }
}

/// A path relative to the API root, built segment by segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn root(segment: &str) -> Self {
        Self(segment.to_string())
    }

    /// `account/{id}`, the prefix every client scoped resource lives under.
    pub fn account(id: u64) -> Self {
        Self::root("account").item(id)
    }

    /// Appends `/{segment}`.
    pub fn join(mut self, segment: &str) -> Self {
        self.0.push('/');
        self.0.push_str(segment);
        self
    }

    /// Appends `/{id}`.
    pub fn item(mut self, id: impl Display) -> Self {
        self.0.push('/');
        self.0.push_str(&id.to_string());
        self
    }

    /// Finishes a collection path, appending `/?{filter}` when a filter is present.
    pub fn with_filter(self, filter: Option<&str>) -> String {
        match filter.and_then(encode_filter) {
            Some(f) => format!("{}/?{}", self.0, f),
            None => self.0,
        }
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.0
    }
}
