/// Accumulator for a translated WHERE fragment.
///
/// Tracks whether the fragment is composite so that parents know when it
/// needs parentheses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    fragment: Option<String>,
    composite: bool,
}

impl ResourceQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A single comparison.
    #[must_use]
    pub fn leaf(fragment: impl Into<String>) -> Self {
        Self {
            fragment: Some(fragment.into()),
            composite: false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragment.is_none()
    }

    #[must_use]
    pub const fn is_composite(&self) -> bool {
        self.composite
    }

    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    #[must_use]
    pub fn into_fragment(self) -> Option<String> {
        self.fragment
    }

    /// Joins children with a boolean operator.
    ///
    /// A lone child is kept as is, parenthesized when composite. Several
    /// children are each parenthesized. Empty children are skipped.
    #[must_use]
    pub fn combine(children: Vec<ResourceQuery>, operator: &str) -> Self {
        let mut parts: Vec<ResourceQuery> = children.into_iter().filter(|c| !c.is_empty()).collect();
        match parts.len() {
            0 => Self::new(),
            1 => {
                let only = parts.remove(0);
                if only.composite {
                    Self {
                        fragment: Some(only.parenthesized()),
                        composite: true,
                    }
                } else {
                    only
                }
            }
            _ => {
                let joined = parts
                    .iter()
                    .map(Self::parenthesized)
                    .collect::<Vec<_>>()
                    .join(&format!(" {operator} "));
                Self {
                    fragment: Some(joined),
                    composite: true,
                }
            }
        }
    }

    /// `NOT (<child>)`.
    #[must_use]
    pub fn negate(child: ResourceQuery) -> Self {
        match child.fragment {
            Some(f) => Self {
                fragment: Some(format!("NOT ({f})")),
                composite: true,
            },
            None => Self::new(),
        }
    }

    fn parenthesized(&self) -> String {
        format!("({})", self.fragment.as_deref().unwrap_or_default())
    }
}
