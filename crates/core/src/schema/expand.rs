//! Expandable relation definitions.

use super::catalog::PropertyCatalog;
use super::entity::EntityType;
use std::sync::Arc;

/// A navigable relation from one entity type to another.
///
/// The nested catalog and orderable list override what the registry would
/// resolve for the target type; leave them unset to use the target's own
/// catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpandDefinition {
    name: String,
    target: EntityType,
    catalog: Option<Arc<PropertyCatalog>>,
    orderable: Option<Vec<String>>,
}

impl ExpandDefinition {
    /// Creates a relation named `name` that expands into `target`.
    pub fn new(name: impl Into<String>, target: EntityType) -> Self {
        Self {
            name: name.into(),
            target,
            catalog: None,
            orderable: None,
        }
    }

    /// Sets the catalog used for filters inside this expand.
    pub fn with_catalog(mut self, catalog: Arc<PropertyCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sets the properties orderable inside this expand.
    pub fn with_orderable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.orderable = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the relation property name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entity type the relation expands into.
    #[inline]
    pub fn target(&self) -> &EntityType {
        &self.target
    }

    /// Returns the catalog override, if any.
    #[inline]
    pub fn catalog(&self) -> Option<&Arc<PropertyCatalog>> {
        self.catalog.as_ref()
    }

    /// Returns the orderable override, if any.
    #[inline]
    pub fn orderable(&self) -> Option<&[String]> {
        self.orderable.as_deref()
    }
}
