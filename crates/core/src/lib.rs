//! qopt Core - Core types and schema catalogs for the qopt query options engine.
//!
//! This crate provides the foundational types shared by the option parsers,
//! the validator and the compiler:
//!
//! - `Value`: Scalar literals (null, boolean, integer, float, string)
//! - `schema`: Property and expand definitions, entity catalogs, and the
//!   `SchemaProvider` trait through which a host describes its entities
//! - `CatalogRegistry`: Concurrency-safe, per-entity memoized catalogs
//! - `Error`: Error types for option parsing and validation
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use qopt_core::{CatalogRegistry, EntityType};
//! use qopt_core::schema::{EntityDescription, PropertyDefinition, StaticSchemaProvider};
//!
//! let provider = StaticSchemaProvider::new().register(
//!     "Post",
//!     EntityDescription::new()
//!         .property(PropertyDefinition::new("status").allowed_values(["active", "inactive"])),
//! );
//! let registry = CatalogRegistry::new(Arc::new(provider));
//!
//! let catalog = registry.catalog(&EntityType::new("Post")).unwrap();
//! assert!(catalog.properties().contains("status"));
//! ```

mod error;
mod registry;
pub mod schema;
mod value;

pub use error::{Error, ErrorKind, ParseError, Result};
pub use registry::CatalogRegistry;
pub use schema::EntityType;
pub use value::Value;
