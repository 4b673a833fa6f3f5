//! Filter tree: comparison leaves joined by AND/OR operations.

use core::cmp::Ordering;
use core::fmt;
use qopt_core::schema::{PropertyCatalog, PropertyDefinition};
use qopt_core::{Error, Result, Value};
use std::sync::Arc;

/// Comparison operators of the filter language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    Bw,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Ge,
        Operator::Lt,
        Operator::Le,
        Operator::In,
        Operator::Bw,
    ];

    /// Parses an operator keyword, ignoring ASCII case.
    pub fn parse(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(keyword))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::In => "in",
            Operator::Bw => "bw",
        }
    }

    /// Only `eq` and `ne` compare against null.
    #[inline]
    pub fn accepts_null(self) -> bool {
        matches!(self, Operator::Eq | Operator::Ne)
    }

    /// Only `in` and `bw` take an array.
    #[inline]
    pub fn takes_list(self) -> bool {
        matches!(self, Operator::In | Operator::Bw)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical operator joining filter nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LogicalOp {
    #[default]
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    Single(Value),
    List(Vec<Value>),
}

impl FilterValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Single(Value::Null))
    }

    pub fn as_single(&self) -> Option<&Value> {
        match self {
            FilterValue::Single(v) => Some(v),
            FilterValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            FilterValue::Single(_) => None,
            FilterValue::List(values) => Some(values),
        }
    }

    /// Iterates the scalar, or every array element.
    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        let slice: &[Value] = match self {
            FilterValue::Single(v) => core::slice::from_ref(v),
            FilterValue::List(values) => values,
        };
        slice.iter()
    }
}

impl From<Value> for FilterValue {
    fn from(v: Value) -> Self {
        FilterValue::Single(v)
    }
}

impl From<Vec<Value>> for FilterValue {
    fn from(values: Vec<Value>) -> Self {
        FilterValue::List(values)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Single(v) => write!(f, "{}", v),
            FilterValue::List(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A `property operator value` comparison.
///
/// Construction enforces the operator/value shape rules, so every
/// `Expression` in a tree is well formed.
#[derive(Clone, Debug)]
pub struct Expression {
    property: String,
    operator: Operator,
    value: FilterValue,
    definition: Option<Arc<PropertyDefinition>>,
}

impl Expression {
    /// Creates a comparison, rejecting operator/value combinations that can
    /// never be evaluated.
    pub fn new(
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Result<Self> {
        let property = property.into();
        let value = value.into();
        check_shape(&property, operator, &value)?;
        Ok(Self {
            property,
            operator,
            value,
            definition: None,
        })
    }

    #[inline]
    pub fn property(&self) -> &str {
        &self.property
    }

    #[inline]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    #[inline]
    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    /// The catalog definition attached by [`FilterNode::bind`].
    #[inline]
    pub fn definition(&self) -> Option<&Arc<PropertyDefinition>> {
        self.definition.as_ref()
    }

    /// Evaluates the comparison for a candidate value of the property.
    pub fn admits(&self, candidate: &Value) -> bool {
        match (&self.operator, &self.value) {
            (Operator::Eq, FilterValue::Single(v)) => candidate.loose_eq(v),
            (Operator::Ne, FilterValue::Single(v)) => !candidate.loose_eq(v),
            (Operator::Gt, FilterValue::Single(v)) => {
                candidate.compare_numeric(v) == Some(Ordering::Greater)
            }
            (Operator::Ge, FilterValue::Single(v)) => matches!(
                candidate.compare_numeric(v),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            (Operator::Lt, FilterValue::Single(v)) => {
                candidate.compare_numeric(v) == Some(Ordering::Less)
            }
            (Operator::Le, FilterValue::Single(v)) => matches!(
                candidate.compare_numeric(v),
                Some(Ordering::Less | Ordering::Equal)
            ),
            (Operator::In, FilterValue::List(values)) => {
                values.iter().any(|v| candidate.loose_eq(v))
            }
            (Operator::Bw, FilterValue::List(bounds)) => match bounds.as_slice() {
                [low, high] => {
                    matches!(
                        candidate.compare_numeric(low),
                        Some(Ordering::Greater | Ordering::Equal)
                    ) && matches!(
                        candidate.compare_numeric(high),
                        Some(Ordering::Less | Ordering::Equal)
                    )
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn overwrite_from(&mut self, other: &Expression) {
        self.operator = other.operator;
        self.value = other.value.clone();
        if other.definition.is_some() {
            self.definition = other.definition.clone();
        }
    }
}

/// Attached definitions do not take part in equality.
impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.property == other.property
            && self.operator == other.operator
            && self.value == other.value
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.property, self.operator, self.value)
    }
}

fn check_shape(property: &str, operator: Operator, value: &FilterValue) -> Result<()> {
    let fail =
        |message: &str| Err(Error::invalid_value_shape(property, operator.as_str(), message));
    match value {
        FilterValue::Single(Value::Null) if !operator.accepts_null() => {
            fail("only eq and ne accept null")
        }
        FilterValue::Single(_) if operator.takes_list() => fail("operator requires an array value"),
        FilterValue::List(_) if !operator.takes_list() => {
            fail("only in and bw accept an array value")
        }
        FilterValue::List(values) if operator == Operator::Bw && values.len() != 2 => {
            fail("bw requires exactly 2 values")
        }
        FilterValue::List(values) if operator == Operator::In && values.is_empty() => {
            fail("in requires at least one value")
        }
        FilterValue::List(values) if values.iter().any(Value::is_null) => {
            fail("array values must not be null")
        }
        _ => Ok(()),
    }
}

/// Children joined by one logical operator.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub op: LogicalOp,
    pub children: Vec<FilterNode>,
}

impl Operation {
    pub fn new(op: LogicalOp, children: Vec<FilterNode>) -> Self {
        Self { op, children }
    }
}

/// Which end of a range to extract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeBound {
    Min,
    Max,
}

/// A node of the filter tree.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterNode {
    Expression(Expression),
    Operation(Operation),
}

impl FilterNode {
    /// Creates a comparison leaf.
    pub fn expression(
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Result<Self> {
        Expression::new(property, operator, value).map(FilterNode::Expression)
    }

    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Operation(Operation::new(LogicalOp::And, children))
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Operation(Operation::new(LogicalOp::Or, children))
    }

    /// Returns the first comparison on `name` in depth-first order,
    /// optionally restricted to `operators`.
    pub fn find_first_by_property(
        &self,
        name: &str,
        operators: Option<&[Operator]>,
    ) -> Option<&Expression> {
        match self {
            FilterNode::Expression(e) => matches_property(e, name, operators).then_some(e),
            FilterNode::Operation(op) => op
                .children
                .iter()
                .find_map(|child| child.find_first_by_property(name, operators)),
        }
    }

    /// Returns every comparison on `name` in depth-first order.
    pub fn find_all_by_property(
        &self,
        name: &str,
        operators: Option<&[Operator]>,
    ) -> Vec<&Expression> {
        self.expressions()
            .into_iter()
            .filter(|e| matches_property(e, name, operators))
            .collect()
    }

    fn find_first_mut(&mut self, name: &str) -> Option<&mut Expression> {
        match self {
            FilterNode::Expression(e) => (e.property == name).then_some(e),
            FilterNode::Operation(op) => op
                .children
                .iter_mut()
                .find_map(|child| child.find_first_mut(name)),
        }
    }

    /// Returns the comparison leaves in depth-first order.
    pub fn expressions(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        self.collect_expressions(&mut out);
        out
    }

    fn collect_expressions<'a>(&'a self, out: &mut Vec<&'a Expression>) {
        match self {
            FilterNode::Expression(e) => out.push(e),
            FilterNode::Operation(op) => {
                for child in &op.children {
                    child.collect_expressions(out);
                }
            }
        }
    }

    /// Extracts the lower or upper bound placed on `name` by `ge`/`gt` or
    /// `le`/`lt`, or by either end of a `bw`.
    pub fn range_bound(&self, name: &str, bound: RangeBound) -> Option<&Value> {
        let (operators, index) = match bound {
            RangeBound::Min => ([Operator::Ge, Operator::Gt, Operator::Bw], 0),
            RangeBound::Max => ([Operator::Le, Operator::Lt, Operator::Bw], 1),
        };
        let expr = self.find_first_by_property(name, Some(&operators))?;
        match expr.value() {
            FilterValue::Single(v) => Some(v),
            FilterValue::List(values) => values.get(index),
        }
    }

    /// Returns whether a record whose `name` equals `candidate` could satisfy
    /// the tree. Comparisons on other properties hold vacuously.
    pub fn admits_value(&self, name: &str, candidate: &Value) -> bool {
        match self {
            FilterNode::Expression(e) => e.property != name || e.admits(candidate),
            FilterNode::Operation(op) => match op.op {
                LogicalOp::And => op.children.iter().all(|c| c.admits_value(name, candidate)),
                LogicalOp::Or => op.children.iter().any(|c| c.admits_value(name, candidate)),
            },
        }
    }

    /// Merges the comparisons of `other` into this tree.
    ///
    /// A comparison on a property already present overwrites the first
    /// existing one in place; others are appended to the root operation,
    /// wrapping a bare expression root into a `join` operation first.
    pub fn merge_from(&mut self, other: &FilterNode, join: LogicalOp) {
        for leaf in other.expressions() {
            if let Some(existing) = self.find_first_mut(leaf.property()) {
                existing.overwrite_from(leaf);
                continue;
            }
            if matches!(self, FilterNode::Expression(_)) {
                let empty = FilterNode::Operation(Operation::new(join, Vec::new()));
                let root = core::mem::replace(self, empty);
                if let FilterNode::Operation(op) = self {
                    op.children.push(root);
                }
            }
            if let FilterNode::Operation(op) = self {
                op.children.push(FilterNode::Expression(leaf.clone()));
            }
        }
    }

    /// Attaches the catalog definition of each compared property. Properties
    /// missing from `catalog` are left unbound.
    pub fn bind(&mut self, catalog: &PropertyCatalog) {
        match self {
            FilterNode::Expression(e) => {
                e.definition = catalog.get(&e.property).cloned();
            }
            FilterNode::Operation(op) => {
                for child in &mut op.children {
                    child.bind(catalog);
                }
            }
        }
    }
}

fn matches_property(e: &Expression, name: &str, operators: Option<&[Operator]>) -> bool {
    e.property == name && operators.map_or(true, |ops| ops.contains(&e.operator))
}

/// Renders filter text. Nested operations are parenthesized, so parsing the
/// output of a parsed tree yields the same tree.
impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Expression(e) => write!(f, "{}", e),
            FilterNode::Operation(op) => {
                for (i, child) in op.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.op.as_str())?;
                    }
                    // The left fold rebuilds a leading operation without parentheses
                    match child {
                        FilterNode::Operation(_) if i > 0 => write!(f, "({})", child)?,
                        _ => write!(f, "{}", child)?,
                    }
                }
                Ok(())
            }
        }
    }
}
