//! Property definitions for entity catalogs.

use super::expand::ExpandDefinition;
use crate::value::Value;

/// A property that may appear in a filter expression.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDefinition {
    /// Property name; dotted for properties reached through a relation.
    name: String,
    /// Permitted values, or None when unrestricted.
    allowed_values: Option<Vec<Value>>,
    /// Relation that must be expanded before this property can be filtered.
    expand_dependency: Option<ExpandDefinition>,
}

impl PropertyDefinition {
    /// Creates an unrestricted property definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed_values: None,
            expand_dependency: None,
        }
    }

    /// Restricts the property to the given values.
    pub fn allowed_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Marks the property as reachable only through the given relation.
    pub fn depends_on(mut self, expand: ExpandDefinition) -> Self {
        self.expand_dependency = Some(expand);
        self
    }

    /// Returns the property name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the allowed value set, if restricted.
    #[inline]
    pub fn allowed(&self) -> Option<&[Value]> {
        self.allowed_values.as_deref()
    }

    /// Returns the relation this property depends on.
    #[inline]
    pub fn expand_dependency(&self) -> Option<&ExpandDefinition> {
        self.expand_dependency.as_ref()
    }

    /// Returns whether `value` is a member of the allowed set.
    pub fn permits(&self, value: &Value) -> bool {
        match &self.allowed_values {
            None => true,
            Some(allowed) => allowed.iter().any(|a| a.loose_eq(value)),
        }
    }
}
