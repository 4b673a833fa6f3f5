//! Order-by clauses.

use core::fmt;

/// Sort order for ORDER BY.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// One `property [asc|desc]` item.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrderByNode {
    pub property_name: String,
    pub direction: SortOrder,
}

impl OrderByNode {
    pub fn new(property_name: impl Into<String>, direction: SortOrder) -> Self {
        Self {
            property_name: property_name.into(),
            direction,
        }
    }

    pub fn asc(property_name: impl Into<String>) -> Self {
        Self::new(property_name, SortOrder::Asc)
    }

    pub fn desc(property_name: impl Into<String>) -> Self {
        Self::new(property_name, SortOrder::Desc)
    }
}

impl fmt::Display for OrderByNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property_name, self.direction.as_str())
    }
}
