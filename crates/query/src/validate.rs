//! Semantic validation of parsed options against entity catalogs.
//!
//! Validation stops at the first violation.

use crate::ast::{ExpandNode, FilterNode, OrderByNode};
use crate::options::AppliedQueryOptions;
use qopt_core::schema::PropertyCatalog;
use qopt_core::{CatalogRegistry, EntityType, Error, Result};

/// Checks a filter tree against `catalog`.
///
/// `expands` is the expand set of the same level; a property that depends on
/// a relation is only valid when that relation is expanded.
pub fn validate_filters(
    node: &FilterNode,
    catalog: &PropertyCatalog,
    expands: &[ExpandNode],
) -> Result<()> {
    match node {
        FilterNode::Operation(op) => op
            .children
            .iter()
            .try_for_each(|child| validate_filters(child, catalog, expands)),
        FilterNode::Expression(e) => {
            let definition = catalog
                .get(e.property())
                .ok_or_else(|| Error::unknown_property(e.property(), catalog.names()))?;

            if let Some(dependency) = definition.expand_dependency() {
                if ExpandNode::find(expands, dependency.name()).is_none() {
                    return Err(Error::expand_required(e.property(), dependency.name()));
                }
            }

            if let Some(allowed) = definition.allowed() {
                if let Some(value) = e.value().values().find(|v| !definition.permits(v)) {
                    return Err(Error::value_not_allowed(
                        e.property(),
                        value.clone(),
                        allowed.to_vec(),
                    ));
                }
            }
            Ok(())
        }
    }
}

/// Checks that every ordered property is in `allowed`.
pub fn validate_order_by(nodes: &[OrderByNode], allowed: &[String]) -> Result<()> {
    for node in nodes {
        if !allowed.contains(&node.property_name) {
            return Err(Error::unknown_property(&node.property_name, allowed));
        }
    }
    Ok(())
}

/// Checks that every selected property is in `allowed`.
pub fn validate_select(names: &[String], allowed: &[String]) -> Result<()> {
    for name in names {
        if !allowed.contains(name) {
            return Err(Error::unknown_property(name, allowed));
        }
    }
    Ok(())
}

/// Validator for option sets that span entity types.
#[derive(Clone, Copy, Debug)]
pub struct Validator<'a> {
    registry: &'a CatalogRegistry,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a CatalogRegistry) -> Self {
        Self { registry }
    }

    /// Checks expand nodes of `entity`, recursing into nested expands with
    /// the target entity type.
    pub fn validate_expand(&self, nodes: &[ExpandNode], entity: &EntityType) -> Result<()> {
        let catalog = self.registry.catalog(entity)?;
        for node in nodes {
            let definition = catalog.expand(&node.property_name).ok_or_else(|| {
                Error::not_expandable(&node.property_name, entity.as_str(), catalog.expand_names())
            })?;
            let target = self.registry.catalog(definition.target())?;

            if let Some(filters) = &node.filters {
                let properties = definition
                    .catalog()
                    .map(|c| c.as_ref())
                    .unwrap_or_else(|| target.properties());
                validate_filters(filters, properties, &node.children)?;
            }
            let orderable = definition.orderable().unwrap_or_else(|| target.orderable());
            validate_order_by(&node.order_by, orderable)?;
            validate_select(&node.select, target.selectable())?;

            if !node.children.is_empty() {
                self.validate_expand(&node.children, definition.target())?;
            }
        }
        Ok(())
    }

    /// Checks every option of `options` against its entity catalog.
    pub fn validate_options(&self, options: &AppliedQueryOptions) -> Result<()> {
        let catalog = options.catalog();
        let expands = options.expand().unwrap_or_default();
        if let Some(filters) = options.filters() {
            validate_filters(filters, catalog.properties(), expands)?;
        }
        if let Some(order_by) = options.order_by() {
            validate_order_by(order_by, catalog.orderable())?;
        }
        if let Some(select) = options.select() {
            validate_select(select, catalog.selectable())?;
        }
        if !expands.is_empty() {
            self.validate_expand(expands, options.entity())?;
        }
        Ok(())
    }
}
