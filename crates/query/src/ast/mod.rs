//! AST module for filter, order-by and expand options.

mod expand;
mod filter;
mod order;

pub use expand::ExpandNode;
pub use filter::{Expression, FilterNode, FilterValue, LogicalOp, Operation, Operator, RangeBound};
pub use order::{OrderByNode, SortOrder};
