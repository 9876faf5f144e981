//! The boolean filter tree callers search with.

use serde::{Deserialize, Serialize};

use crate::object::Scalar;

/// The attribute a filter leaf compares against, with its values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterAttribute {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl FilterAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    pub fn with_values(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Returns the value when exactly one is present.
    #[must_use]
    pub fn single_value(&self) -> Option<&Scalar> {
        match self.values.as_slice() {
            [v] => Some(v),
            _ => None,
        }
    }
}

/// Identity of a filter attribute after recognizing the generic names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeName {
    /// `__UID__`, the primary key.
    Uid,
    /// `__NAME__`, the display name column.
    Name,
    /// The kind's multi-valued membership attribute.
    Membership,
    /// Any other name, taken as a native column (optionally `table.column`).
    Column(String),
}

impl AttributeName {
    pub const UID: &'static str = "__UID__";
    pub const NAME: &'static str = "__NAME__";
}

/// A filter over logical objects.
///
/// Leaves carry an attribute name and its values. `EqualsIgnoreCase` and
/// `Extended` exist so they can be parsed and rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Equals(FilterAttribute),
    Contains(FilterAttribute),
    StartsWith(FilterAttribute),
    EndsWith(FilterAttribute),
    GreaterThan(FilterAttribute),
    GreaterOrEqual(FilterAttribute),
    LessThan(FilterAttribute),
    LessOrEqual(FilterAttribute),
    ContainsAllValues(FilterAttribute),
    EqualsIgnoreCase(FilterAttribute),
    Extended(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn equals(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Equals(FilterAttribute::new(name, value))
    }

    pub fn contains(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Contains(FilterAttribute::new(name, value))
    }

    pub fn starts_with(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::StartsWith(FilterAttribute::new(name, value))
    }

    pub fn ends_with(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::EndsWith(FilterAttribute::new(name, value))
    }

    pub fn greater_than(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::GreaterThan(FilterAttribute::new(name, value))
    }

    pub fn greater_or_equal(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::GreaterOrEqual(FilterAttribute::new(name, value))
    }

    pub fn less_than(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::LessThan(FilterAttribute::new(name, value))
    }

    pub fn less_or_equal(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::LessOrEqual(FilterAttribute::new(name, value))
    }

    pub fn contains_all_values(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self::ContainsAllValues(FilterAttribute::with_values(name, values))
    }

    pub fn and(children: Vec<Filter>) -> Self {
        Self::And(children)
    }

    pub fn or(children: Vec<Filter>) -> Self {
        Self::Or(children)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Filter) -> Self {
        Self::Not(Box::new(child))
    }

    /// Returns the leaf attribute, if this is a leaf.
    #[must_use]
    pub fn leaf_attribute(&self) -> Option<&FilterAttribute> {
        match self {
            Self::Equals(a)
            | Self::Contains(a)
            | Self::StartsWith(a)
            | Self::EndsWith(a)
            | Self::GreaterThan(a)
            | Self::GreaterOrEqual(a)
            | Self::LessThan(a)
            | Self::LessOrEqual(a)
            | Self::ContainsAllValues(a)
            | Self::EqualsIgnoreCase(a) => Some(a),
            Self::Extended(_) | Self::And(_) | Self::Or(_) | Self::Not(_) => None,
        }
    }

    /// Returns true when `pred` holds for the name of any leaf in the tree.
    pub fn any_attribute(&self, pred: &impl Fn(&str) -> bool) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.iter().any(|c| c.any_attribute(pred)),
            Self::Not(child) => child.any_attribute(pred),
            Self::Extended(_) => false,
            leaf => leaf.leaf_attribute().is_some_and(|a| pred(&a.name)),
        }
    }

    /// Returns true when matching requires a joined row for every value,
    /// i.e. a `ContainsAllValues` reachable through `And` nodes only.
    #[must_use]
    pub fn requires_inner_join(&self) -> bool {
        match self {
            Self::ContainsAllValues(_) => true,
            Self::And(children) => children.iter().any(Self::requires_inner_join),
            _ => false,
        }
    }
}
