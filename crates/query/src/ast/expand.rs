//! Expand tree: relations to load alongside the main entity, each with its
//! own nested options.

use super::filter::FilterNode;
use super::order::OrderByNode;

/// One expanded relation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpandNode {
    pub property_name: String,
    pub filters: Option<FilterNode>,
    pub order_by: Vec<OrderByNode>,
    pub select: Vec<String>,
    pub top: Option<u64>,
    pub skip: u64,
    pub skiptoken: Option<String>,
    pub children: Vec<ExpandNode>,
}

impl ExpandNode {
    /// Creates an expand without nested options.
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            ..Self::default()
        }
    }

    pub fn with_filters(mut self, filters: FilterNode) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_children(mut self, children: Vec<ExpandNode>) -> Self {
        self.children = children;
        self
    }

    /// Returns true if the node narrows or reshapes the nested result set.
    pub fn has_constraints(&self) -> bool {
        self.filters.is_some()
            || !self.order_by.is_empty()
            || !self.select.is_empty()
            || self.top.is_some()
            || self.skip > 0
            || self.skiptoken.is_some()
    }

    /// Finds a node by property name among `nodes`.
    pub fn find<'a>(nodes: &'a [ExpandNode], property_name: &str) -> Option<&'a ExpandNode> {
        nodes.iter().find(|n| n.property_name == property_name)
    }
}
