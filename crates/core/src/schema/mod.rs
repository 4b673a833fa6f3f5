//! Schema module for the query options engine.
//!
//! This module contains the per-entity metadata the validator consults:
//! property definitions, expandable relations, the catalogs that bundle them,
//! and the provider trait through which a host supplies them.

mod catalog;
mod entity;
mod expand;
mod property;
mod provider;

pub use catalog::{CatalogBuilder, EntityCatalog, PropertyCatalog};
pub use entity::EntityType;
pub use expand::ExpandDefinition;
pub use property::PropertyDefinition;
pub use provider::{EntityDescription, SchemaProvider, StaticSchemaProvider};
