//! Canonical keys for option trees.
//!
//! Trees with the same structure and values hash to the same key. Keys are
//! stable across processes, so hosts may use them as external cache keys.

use crate::ast::{ExpandNode, FilterNode, FilterValue, LogicalOp, OrderByNode};
use core::hash::Hasher;
use qopt_core::Value;

/// FNV-1a hasher.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FnvHasher {
    state: u64,
}

impl FnvHasher {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self {
            state: Self::FNV_OFFSET,
        }
    }

    /// Formats the current state as a key.
    pub fn key(&self) -> String {
        format!("{:016x}", self.finish())
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= *byte as u64;
            self.state = self.state.wrapping_mul(Self::FNV_PRIME);
        }
    }
}

/// Length-prefixed so adjacent strings cannot run together.
pub(crate) fn hash_str<H: Hasher>(s: &str, hasher: &mut H) {
    hasher.write(&(s.len() as u64).to_le_bytes());
    hasher.write(s.as_bytes());
}

pub(crate) fn hash_value<H: Hasher>(value: &Value, hasher: &mut H) {
    match value {
        Value::Null => hasher.write(b"null"),
        Value::Boolean(b) => {
            hasher.write(b"bool");
            hasher.write(&[*b as u8]);
        }
        Value::Int64(i) => {
            hasher.write(b"i64");
            hasher.write(&i.to_le_bytes());
        }
        Value::Float64(f) => {
            hasher.write(b"f64");
            hasher.write(&f.to_le_bytes());
        }
        Value::String(s) => {
            hasher.write(b"str");
            hash_str(s, hasher);
        }
    }
}

pub(crate) fn hash_filter<H: Hasher>(node: &FilterNode, hasher: &mut H) {
    match node {
        FilterNode::Expression(e) => {
            hasher.write(b"expr");
            hash_str(e.property(), hasher);
            hasher.write(e.operator().as_str().as_bytes());
            match e.value() {
                FilterValue::Single(v) => hash_value(v, hasher),
                FilterValue::List(values) => {
                    hasher.write(b"list");
                    hasher.write(&(values.len() as u64).to_le_bytes());
                    for v in values {
                        hash_value(v, hasher);
                    }
                }
            }
        }
        FilterNode::Operation(op) => {
            hasher.write(match op.op {
                LogicalOp::And => b"and",
                LogicalOp::Or => b"or_",
            });
            hasher.write(&(op.children.len() as u64).to_le_bytes());
            for child in &op.children {
                hash_filter(child, hasher);
            }
        }
    }
}

pub(crate) fn hash_order_by<H: Hasher>(nodes: &[OrderByNode], hasher: &mut H) {
    hasher.write(b"order");
    hasher.write(&(nodes.len() as u64).to_le_bytes());
    for node in nodes {
        hash_str(&node.property_name, hasher);
        hasher.write(node.direction.as_str().as_bytes());
    }
}

pub(crate) fn hash_select<H: Hasher>(names: &[String], hasher: &mut H) {
    hasher.write(b"select");
    hasher.write(&(names.len() as u64).to_le_bytes());
    for name in names {
        hash_str(name, hasher);
    }
}

pub(crate) fn hash_opt_u64<H: Hasher>(value: Option<u64>, hasher: &mut H) {
    match value {
        Some(v) => {
            hasher.write(&[1]);
            hasher.write(&v.to_le_bytes());
        }
        None => hasher.write(&[0]),
    }
}

pub(crate) fn hash_opt_str<H: Hasher>(value: Option<&str>, hasher: &mut H) {
    match value {
        Some(s) => {
            hasher.write(&[1]);
            hash_str(s, hasher);
        }
        None => hasher.write(&[0]),
    }
}

pub(crate) fn hash_expand<H: Hasher>(nodes: &[ExpandNode], hasher: &mut H) {
    hasher.write(b"expand");
    hasher.write(&(nodes.len() as u64).to_le_bytes());
    for node in nodes {
        hash_str(&node.property_name, hasher);
        match &node.filters {
            Some(f) => hash_filter(f, hasher),
            None => hasher.write(b"nofilter"),
        }
        hash_order_by(&node.order_by, hasher);
        hash_select(&node.select, hasher);
        hash_opt_u64(node.top, hasher);
        hasher.write(&node.skip.to_le_bytes());
        hash_opt_str(node.skiptoken.as_deref(), hasher);
        hash_expand(&node.children, hasher);
    }
}

impl FilterNode {
    /// Returns a deterministic identity of the tree.
    pub fn canonical_key(&self) -> String {
        let mut hasher = FnvHasher::new();
        hash_filter(self, &mut hasher);
        hasher.key()
    }
}

impl ExpandNode {
    /// Returns a deterministic identity of the node and its nested options.
    pub fn canonical_key(&self) -> String {
        let mut hasher = FnvHasher::new();
        hash_expand(core::slice::from_ref(self), &mut hasher);
        hasher.key()
    }
}
