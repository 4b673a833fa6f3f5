//! Applied query options: the per-request option state of one entity type.
//!
//! Instances start as a clone of the memoized default of their entity type
//! (see [`QueryOptionsFactory`]) and are then overridden with request values.
//! Nested options of expanded relations are kept per expand property and
//! rebuilt whenever the expand node that produced them changes.

use crate::ast::{ExpandNode, FilterNode, LogicalOp, OrderByNode};
use crate::factory::QueryOptionsFactory;
use crate::fingerprint::{
    hash_expand, hash_filter, hash_opt_str, hash_opt_u64, hash_order_by, hash_select, hash_str,
    FnvHasher,
};
use core::hash::Hasher;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use qopt_core::schema::{EntityCatalog, ExpandDefinition};
use qopt_core::{EntityType, Error, Result};
use std::sync::Arc;
use tracing::debug;

/// Nested options of one expanded relation.
#[derive(Clone, Debug)]
struct Expansion {
    options: AppliedQueryOptions,
    /// Canonical key of the expand node the options were built from.
    applied_key: String,
    /// Set by [`AppliedQueryOptions::mark_resolved`].
    resolved_key: Option<String>,
}

/// Option state for one entity type.
#[derive(Clone, Debug)]
pub struct AppliedQueryOptions {
    entity: EntityType,
    catalog: Arc<EntityCatalog>,
    top: Option<u64>,
    skip: u64,
    skiptoken: Option<String>,
    filters: Option<FilterNode>,
    order_by: Option<Vec<OrderByNode>>,
    select: Option<Vec<String>>,
    expand: Option<Vec<ExpandNode>>,
    total_results: Option<u64>,
    max_top: Option<u64>,
    nested: HashMap<String, Expansion>,
}

impl AppliedQueryOptions {
    /// Creates empty options for the entity of `catalog`.
    pub fn new(catalog: Arc<EntityCatalog>) -> Self {
        Self {
            entity: catalog.entity().clone(),
            catalog,
            top: None,
            skip: 0,
            skiptoken: None,
            filters: None,
            order_by: None,
            select: None,
            expand: None,
            total_results: None,
            max_top: None,
            nested: HashMap::new(),
        }
    }

    /// Sets the largest accepted `top`.
    pub fn with_max_top(mut self, max_top: Option<u64>) -> Self {
        self.max_top = max_top;
        self
    }

    #[inline]
    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    #[inline]
    pub fn catalog(&self) -> &Arc<EntityCatalog> {
        &self.catalog
    }

    #[inline]
    pub fn top(&self) -> Option<u64> {
        self.top
    }

    #[inline]
    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn skiptoken(&self) -> Option<&str> {
        self.skiptoken.as_deref()
    }

    pub fn filters(&self) -> Option<&FilterNode> {
        self.filters.as_ref()
    }

    pub fn order_by(&self) -> Option<&[OrderByNode]> {
        self.order_by.as_deref()
    }

    pub fn select(&self) -> Option<&[String]> {
        self.select.as_deref()
    }

    pub fn expand(&self) -> Option<&[ExpandNode]> {
        self.expand.as_deref()
    }

    #[inline]
    pub fn total_results(&self) -> Option<u64> {
        self.total_results
    }

    pub fn set_top(&mut self, top: u64) -> Result<()> {
        if let Some(max) = self.max_top {
            if top > max {
                return Err(Error::invalid_option(
                    "top",
                    format!("{} exceeds the maximum of {}", top, max),
                ));
            }
        }
        self.top = Some(top);
        Ok(())
    }

    pub fn set_skip(&mut self, skip: u64) {
        self.skip = skip;
    }

    pub fn set_skiptoken(&mut self, token: impl Into<String>) {
        self.skiptoken = Some(token.into());
    }

    /// Replaces the filters and binds them to this entity's catalog.
    pub fn set_filters(&mut self, mut filters: FilterNode) {
        filters.bind(self.catalog.properties());
        self.filters = Some(filters);
    }

    /// Merges `filters` into the current filters, overwriting comparisons on
    /// properties that are already filtered.
    pub fn merge_filters(&mut self, filters: &FilterNode, join: LogicalOp) {
        if let Some(existing) = self.filters.as_mut() {
            existing.merge_from(filters, join);
            existing.bind(self.catalog.properties());
            return;
        }
        self.set_filters(filters.clone());
    }

    pub fn set_order_by(&mut self, order_by: Vec<OrderByNode>) {
        self.order_by = Some(order_by);
    }

    pub fn set_select(&mut self, select: Vec<String>) {
        self.select = Some(select);
    }

    pub fn set_expand(&mut self, expand: Vec<ExpandNode>) {
        self.expand = Some(expand);
    }

    pub fn set_total_results(&mut self, total: u64) {
        self.total_results = Some(total);
    }

    /// Returns a deterministic identity of the request options.
    ///
    /// Covers the entity type and every option that shapes the result set;
    /// `total_results` and nested state are excluded.
    pub fn canonical_key(&self) -> String {
        let mut hasher = FnvHasher::new();
        hash_str(self.entity.as_str(), &mut hasher);
        hash_opt_u64(self.top, &mut hasher);
        hasher.write(&self.skip.to_le_bytes());
        hash_opt_str(self.skiptoken.as_deref(), &mut hasher);
        match &self.filters {
            Some(f) => hash_filter(f, &mut hasher),
            None => hasher.write(b"nofilter"),
        }
        hash_order_by(self.order_by.as_deref().unwrap_or_default(), &mut hasher);
        hash_select(self.select.as_deref().unwrap_or_default(), &mut hasher);
        hash_expand(self.expand.as_deref().unwrap_or_default(), &mut hasher);
        hasher.key()
    }

    /// Returns the options of the expanded relation `property`, creating them
    /// from the target's defaults and the expand node's own options.
    ///
    /// Options built for a different version of the expand node are
    /// discarded and rebuilt, which also clears their resolved mark.
    pub fn descend(
        &mut self,
        factory: &QueryOptionsFactory,
        property: &str,
    ) -> Result<&mut AppliedQueryOptions> {
        let node = self
            .expand
            .as_deref()
            .and_then(|nodes| ExpandNode::find(nodes, property))
            .ok_or_else(|| Error::invalid_expand(format!("'{}' is not expanded", property)))?;
        let definition = self.catalog.expand(property).ok_or_else(|| {
            Error::not_expandable(property, self.entity.as_str(), self.catalog.expand_names())
        })?;
        let key = node.canonical_key();

        match self.nested.entry(property.to_string()) {
            Entry::Occupied(slot) => {
                let expansion = slot.into_mut();
                if expansion.applied_key != key {
                    if expansion.resolved_key.is_some() {
                        debug!(
                            entity = %self.entity,
                            expand = property,
                            "invalidating stale expansion"
                        );
                    }
                    *expansion = Expansion {
                        options: nested_options(factory, definition, node)?,
                        applied_key: key,
                        resolved_key: None,
                    };
                }
                Ok(&mut expansion.options)
            }
            Entry::Vacant(slot) => {
                let expansion = slot.insert(Expansion {
                    options: nested_options(factory, definition, node)?,
                    applied_key: key,
                    resolved_key: None,
                });
                Ok(&mut expansion.options)
            }
        }
    }

    /// Returns the nested options of `property` if they have been created.
    pub fn nested(&self, property: &str) -> Option<&AppliedQueryOptions> {
        self.nested.get(property).map(|e| &e.options)
    }

    /// Records that the nested data of `property` was loaded with its
    /// current options.
    pub fn mark_resolved(&mut self, property: &str) {
        if let Some(expansion) = self.nested.get_mut(property) {
            expansion.resolved_key = Some(expansion.applied_key.clone());
        }
    }

    /// Returns true unless the nested data of `property` was resolved with
    /// the options of the current expand node.
    pub fn needs_resolution(&self, property: &str) -> bool {
        let Some(node) = self
            .expand
            .as_deref()
            .and_then(|nodes| ExpandNode::find(nodes, property))
        else {
            return false;
        };
        match self.nested.get(property) {
            Some(expansion) => {
                expansion.resolved_key.as_deref() != Some(node.canonical_key().as_str())
            }
            None => true,
        }
    }
}

/// Builds nested options from the target's defaults and the expand node.
fn nested_options(
    factory: &QueryOptionsFactory,
    definition: &ExpandDefinition,
    node: &ExpandNode,
) -> Result<AppliedQueryOptions> {
    let mut options = factory.create(definition.target())?;
    if let Some(filters) = &node.filters {
        let mut filters = filters.clone();
        match definition.catalog() {
            Some(catalog) => {
                filters.bind(catalog);
                options.filters = Some(filters);
            }
            None => options.set_filters(filters),
        }
    }
    if !node.order_by.is_empty() {
        options.set_order_by(node.order_by.clone());
    }
    if !node.select.is_empty() {
        options.set_select(node.select.clone());
    }
    if let Some(top) = node.top {
        options.set_top(top)?;
    }
    if node.skip > 0 {
        options.set_skip(node.skip);
    }
    if let Some(token) = &node.skiptoken {
        options.set_skiptoken(token.clone());
    }
    if !node.children.is_empty() {
        options.set_expand(node.children.clone());
    }
    Ok(options)
}
