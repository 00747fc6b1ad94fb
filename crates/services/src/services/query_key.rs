use std::{collections::BTreeMap, fmt};

/// Identity of a remote read: ordered path segments plus optional filters.
///
/// Segments are split on `/`, so `"/api/staff"` and `["api", "staff"]`
/// name the same slot. The empty key is the root and is a
/// prefix of every other key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    segments: Vec<String>,
    filters: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(root: impl AsRef<str>) -> Self {
        Self::root().child(root.as_ref())
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        segments
            .into_iter()
            .fold(Self::root(), |key, segment| key.child(segment.as_ref()))
    }

    /// Appends a segment, e.g. a record id.
    pub fn child(mut self, segment: impl ToString) -> Self {
        let segment = segment.to_string();
        self.segments.extend(
            segment
                .split('/')
                .filter(|part| !part.is_empty())
                .map(str::to_string),
        );
        self
    }

    pub fn filter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.filters.insert(name.into(), value.to_string());
        self
    }

    pub fn filter_opt(self, name: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.filter(name, value),
            None => self,
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty() && self.filters.is_empty()
    }

    /// True when `other` lies under this key: same leading segments and a
    /// superset of this key's filters.
    pub fn is_prefix_of(&self, other: &QueryKey) -> bool {
        other.segments.starts_with(&self.segments)
            && self
                .filters
                .iter()
                .all(|(name, value)| other.filters.get(name) == Some(value))
    }

    /// Request path relative to the API base, without the query string.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())?;
        for (i, (name, value)) in self.filters.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{name}={value}")?;
        }
        Ok(())
    }
}
