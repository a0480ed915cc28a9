use std::fmt::{self, Display};

/// Builder for the `&` separated `key=value` filters accepted by list endpoints.
///
/// ```
/// use blacktri::Filter;
///
/// let filter = Filter::new().param("status", "ACTIVE").sort_desc("publicid");
/// assert_eq!(filter.to_string(), "status=ACTIVE&sort=-publicid");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pairs: Vec<(String, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &str, value: impl Display) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Ascending sort on `field`.
    pub fn sort(self, field: &str) -> Self {
        self.param("sort", field)
    }

    /// Descending sort on `field`.
    pub fn sort_desc(self, field: &str) -> Self {
        self.param("sort", format!("-{}", field))
    }

    /// Limits the attributes present in the result set.
    pub fn fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = fields
            .into_iter()
            .map(|f| f.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        if joined.is_empty() {
            return self;
        }
        self.param("fields", joined)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}
