//! Compilation of applied options onto a query-building backend.
//!
//! The compiler never produces query text. It emits a normalized call
//! sequence (joins, where, order by, select, range, cursor) that a backend
//! adapter turns into a concrete query.

use crate::ast::{FilterNode, SortOrder};
use crate::options::AppliedQueryOptions;
use tracing::trace;

/// Receiver of compiled query operations.
pub trait QueryBackend {
    /// Adds the filter tree as the WHERE predicate.
    fn add_where(&mut self, predicate: &FilterNode);

    fn add_order_by(&mut self, property: &str, direction: SortOrder);

    /// Joins the relation `property` under `alias`.
    fn add_join(&mut self, property: &str, alias: &str);

    /// Restricts the projection to `columns`.
    fn add_select(&mut self, columns: &[String]);

    /// Applies pagination. Ignored by default.
    fn set_range(&mut self, _top: Option<u64>, _skip: u64) {}

    /// Applies a continuation cursor. Ignored by default.
    fn set_skiptoken(&mut self, _token: &str) {}
}

/// Emits the operations of `options` onto `backend`.
///
/// Each expanded relation is joined once, under its own name, as is each
/// relation a bound filter property depends on.
pub fn compile<B: QueryBackend + ?Sized>(options: &AppliedQueryOptions, backend: &mut B) {
    let mut joins: Vec<&str> = Vec::new();
    for node in options.expand().unwrap_or_default() {
        if !joins.contains(&node.property_name.as_str()) {
            joins.push(&node.property_name);
        }
    }
    if let Some(filters) = options.filters() {
        for expr in filters.expressions() {
            let dependency = expr.definition().and_then(|d| d.expand_dependency());
            if let Some(dependency) = dependency {
                if !joins.contains(&dependency.name()) {
                    joins.push(dependency.name());
                }
            }
        }
    }
    for property in &joins {
        backend.add_join(property, property);
    }

    if let Some(filters) = options.filters() {
        backend.add_where(filters);
    }
    let order_by = options.order_by().unwrap_or_default();
    for node in order_by {
        backend.add_order_by(&node.property_name, node.direction);
    }
    let select = options.select().unwrap_or_default();
    if !select.is_empty() {
        backend.add_select(select);
    }
    if options.top().is_some() || options.skip() > 0 {
        backend.set_range(options.top(), options.skip());
    }
    if let Some(token) = options.skiptoken() {
        backend.set_skiptoken(token);
    }

    trace!(
        entity = %options.entity(),
        joins = joins.len(),
        has_where = options.filters().is_some(),
        order_by = order_by.len(),
        select = select.len(),
        "compiled query options"
    );
}

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    Where(FilterNode),
    OrderBy(String, SortOrder),
    Join { property: String, alias: String },
    Select(Vec<String>),
    Range { top: Option<u64>, skip: u64 },
    Skiptoken(String),
}

/// Backend that records the call sequence.
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueryBackend for RecordingBackend {
    fn add_where(&mut self, predicate: &FilterNode) {
        self.calls.push(BackendCall::Where(predicate.clone()));
    }

    fn add_order_by(&mut self, property: &str, direction: SortOrder) {
        self.calls
            .push(BackendCall::OrderBy(property.to_string(), direction));
    }

    fn add_join(&mut self, property: &str, alias: &str) {
        self.calls.push(BackendCall::Join {
            property: property.to_string(),
            alias: alias.to_string(),
        });
    }

    fn add_select(&mut self, columns: &[String]) {
        self.calls.push(BackendCall::Select(columns.to_vec()));
    }

    fn set_range(&mut self, top: Option<u64>, skip: u64) {
        self.calls.push(BackendCall::Range { top, skip });
    }

    fn set_skiptoken(&mut self, token: &str) {
        self.calls.push(BackendCall::Skiptoken(token.to_string()));
    }
}
