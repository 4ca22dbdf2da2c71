//! Invalidation tags.
//!
//! A tag is a grouping label with an optional id: `Products`, `Products:LIST`,
//! `Products:42`. Query results declare the tags they provide and mutations
//! declare the tags they invalidate.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Set of tags declared by a query result or a mutation.
pub type TagSet = BTreeSet<Tag>;

/// Opaque grouping label, optionally parameterized by an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    kind: String,
    id: Option<String>,
}

impl Tag {
    /// Creates a bare tag of the given kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    /// Creates a tag of the given kind parameterized by `id`.
    pub fn with_id(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.into()),
        }
    }

    /// Parses `kind` or `kind:id`. Only the first `:` separates kind from id.
    ///
    /// # Examples
    ///
    /// ```
    /// use stockroom_core::cache::Tag;
    ///
    /// assert_eq!(Tag::parse("Products"), Tag::new("Products"));
    /// assert_eq!(Tag::parse("Products:42"), Tag::with_id("Products", "42"));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((kind, id)) => Self::with_id(kind, id),
            None => Self::new(s),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns true if invalidating `self` affects an entry that provided `provided`.
    ///
    /// A bare tag covers every id of its kind; a tag with an id covers only
    /// that exact tag.
    pub fn covers(&self, provided: &Tag) -> bool {
        if self.kind != provided.kind {
            return false;
        }
        match &self.id {
            None => true,
            Some(id) => provided.id.as_ref() == Some(id),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => f.write_str(&self.kind),
        }
    }
}

impl FromStr for Tag {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Builds a [`TagSet`] from anything convertible to tags.
pub fn tag_set<I, T>(tags: I) -> TagSet
where
    I: IntoIterator<Item = T>,
    T: Into<Tag>,
{
    tags.into_iter().map(Into::into).collect()
}
