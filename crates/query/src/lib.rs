//! qopt Query - Option parsing, validation and compilation for qopt.
//!
//! This crate turns the raw text of request parameters into validated,
//! schema-constrained query operations:
//!
//! - `parser`: Filter, order-by, select and expand mini-language parsers
//! - `ast`: Filter and expand trees with their tree operations
//! - `validate`: Checks of parsed options against entity catalogs
//! - `AppliedQueryOptions`: Per-request option state and canonical keys
//! - `QueryOptionsFactory`: Memoized per-entity defaults, request decoding
//! - `compile`: Emission of options onto a `QueryBackend`
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use qopt_core::{CatalogRegistry, EntityType};
//! use qopt_core::schema::{EntityDescription, PropertyDefinition, StaticSchemaProvider};
//! use qopt_query::{compile, QueryOptionsFactory, QueryParams, RecordingBackend};
//!
//! let provider = StaticSchemaProvider::new().register(
//!     "Post",
//!     EntityDescription::new()
//!         .property(PropertyDefinition::new("status").allowed_values(["active", "inactive"]))
//!         .property(PropertyDefinition::new("amount")),
//! );
//! let factory = QueryOptionsFactory::new(Arc::new(CatalogRegistry::new(Arc::new(provider))));
//!
//! let params = QueryParams::from_query_str(
//!     "filters=status eq 'active' and amount gt 100&orderBy=amount desc&top=20",
//! )
//! .unwrap();
//! let options = factory.from_params(&EntityType::new("Post"), &params).unwrap();
//!
//! let mut backend = RecordingBackend::new();
//! compile(&options, &mut backend);
//! assert_eq!(backend.calls.len(), 3);
//! ```

pub mod ast;
mod compile;
mod config;
mod factory;
mod fingerprint;
mod lexer;
mod options;
mod params;
pub mod parser;
mod validate;

pub use compile::{compile, BackendCall, QueryBackend, RecordingBackend};
pub use config::OptionsConfig;
pub use factory::QueryOptionsFactory;
pub use options::AppliedQueryOptions;
pub use params::QueryParams;
pub use validate::{validate_filters, validate_order_by, validate_select, Validator};
