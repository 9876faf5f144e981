use std::collections::BTreeSet;
use std::fmt;

use grouper_types::{ObjectKind, SyncToken};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// A single attribute value read from a column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Text(String),
}

impl Scalar {
    /// Returns the text value, if this is a text scalar.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) => None,
        }
    }

    /// Returns the integer value, if this is an integer scalar.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

/// The value of one attribute on a [`GrouperObject`].
///
/// Multi-valued attributes (group members, subject memberships) hold a set;
/// everything else holds a single nullable scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Multi(BTreeSet<Scalar>),
    Single(Option<Scalar>),
}

impl AttributeValue {
    /// Returns the single value, or `None` for sets and NULLs.
    #[must_use]
    pub fn as_single(&self) -> Option<&Scalar> {
        match self {
            Self::Single(v) => v.as_ref(),
            Self::Multi(_) => None,
        }
    }

    /// Returns the set of values, or `None` for single values.
    #[must_use]
    pub fn as_multi(&self) -> Option<&BTreeSet<Scalar>> {
        match self {
            Self::Multi(set) => Some(set),
            Self::Single(_) => None,
        }
    }

    /// Returns true when the value (or one of the set's values) equals `value`.
    #[must_use]
    pub fn contains(&self, value: &Scalar) -> bool {
        match self {
            Self::Multi(set) => set.contains(value),
            Self::Single(v) => v.as_ref() == Some(value),
        }
    }
}

/// A logical group or subject assembled from one or more joined rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrouperObject {
    identifier: Option<String>,
    name: Option<String>,
    kind: ObjectKind,
    attributes: IndexMap<String, AttributeValue>,
    deleted: bool,
    latest_timestamp: Option<i64>,
}

impl GrouperObject {
    /// Creates an empty object of the given kind.
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            identifier: None,
            name: None,
            kind,
            attributes: IndexMap::new(),
            deleted: false,
            latest_timestamp: None,
        }
    }

    /// Creates an empty object with its identifier already set.
    #[must_use]
    pub fn with_identifier(kind: ObjectKind, identifier: impl Into<String>) -> Self {
        let mut object = Self::new(kind);
        object.identifier = Some(identifier.into());
        object
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Sets the identifier.
    ///
    /// Setting the same identifier again is a no-op. Setting a different one
    /// on an object that already has an identifier fails.
    pub fn set_identifier(&mut self, identifier: impl Into<String>) -> ModelResult<()> {
        let identifier = identifier.into();
        match &self.identifier {
            Some(existing) if *existing != identifier => Err(ModelError::IdentifierMismatch {
                existing: existing.clone(),
                attempted: identifier,
            }),
            Some(_) => Ok(()),
            None => {
                self.identifier = Some(identifier);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    #[must_use]
    pub fn attributes(&self) -> &IndexMap<String, AttributeValue> {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Adds one attribute value.
    ///
    /// An existing set accumulates the value, an existing single value is
    /// replaced. A new attribute becomes a set when `multi_valued` is true.
    /// NULLs are never added to a set.
    pub fn add_attribute(&mut self, name: impl Into<String>, value: Option<Scalar>, multi_valued: bool) {
        let name = name.into();
        match self.attributes.get_mut(&name) {
            Some(AttributeValue::Multi(set)) => {
                if let Some(v) = value {
                    set.insert(v);
                }
            }
            Some(single) => *single = AttributeValue::Single(value),
            None if multi_valued => {
                let set = value.into_iter().collect();
                self.attributes.insert(name, AttributeValue::Multi(set));
            }
            None => {
                self.attributes.insert(name, AttributeValue::Single(value));
            }
        }
    }

    /// Adds a whole set of values to a multi-valued attribute.
    pub fn add_values(&mut self, name: impl Into<String>, values: impl IntoIterator<Item = Scalar>) {
        let entry = self
            .attributes
            .entry(name.into())
            .or_insert_with(|| AttributeValue::Multi(BTreeSet::new()));
        match entry {
            AttributeValue::Multi(set) => set.extend(values),
            single => *single = AttributeValue::Multi(values.into_iter().collect()),
        }
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    #[must_use]
    pub const fn latest_timestamp(&self) -> Option<i64> {
        self.latest_timestamp
    }

    pub fn set_latest_timestamp(&mut self, timestamp: i64) {
        self.latest_timestamp = Some(timestamp);
    }

    /// The object's latest timestamp as a sync token.
    #[must_use]
    pub fn sync_token(&self) -> Option<SyncToken> {
        self.latest_timestamp.map(SyncToken::new)
    }

    /// Merges another object's name and attributes into this one.
    ///
    /// Sets accumulate, single values are replaced. The deleted flag and the
    /// latest timestamp of `self` are kept.
    pub fn absorb(&mut self, other: GrouperObject) -> ModelResult<()> {
        if let Some(id) = other.identifier {
            self.set_identifier(id)?;
        }
        if let Some(name) = other.name {
            self.name = Some(name);
        }
        for (key, value) in other.attributes {
            match value {
                AttributeValue::Multi(set) => self.add_values(key, set),
                AttributeValue::Single(v) => self.add_attribute(key, v, false),
            }
        }
        Ok(())
    }
}
