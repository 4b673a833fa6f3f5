//! Memoized default options per entity type.

use crate::config::OptionsConfig;
use crate::options::AppliedQueryOptions;
use crate::params::QueryParams;
use crate::parser::{parse_order_by, parse_select, ExpandParser, FilterParser};
use crate::validate::Validator;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use qopt_core::{CatalogRegistry, EntityType, Result};
use std::sync::Arc;
use tracing::debug;

type DefaultsSlot = Arc<OnceCell<Arc<AppliedQueryOptions>>>;

/// Hands out per-request [`AppliedQueryOptions`] cloned from a default built
/// once per entity type.
pub struct QueryOptionsFactory {
    registry: Arc<CatalogRegistry>,
    config: OptionsConfig,
    defaults: DashMap<EntityType, DefaultsSlot>,
}

impl QueryOptionsFactory {
    /// Creates a factory with the default configuration.
    pub fn new(registry: Arc<CatalogRegistry>) -> Self {
        Self::with_config(registry, OptionsConfig::default())
    }

    pub fn with_config(registry: Arc<CatalogRegistry>, config: OptionsConfig) -> Self {
        Self {
            registry,
            config,
            defaults: DashMap::new(),
        }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<CatalogRegistry> {
        &self.registry
    }

    #[inline]
    pub fn config(&self) -> &OptionsConfig {
        &self.config
    }

    pub fn validator(&self) -> Validator<'_> {
        Validator::new(&self.registry)
    }

    pub fn filter_parser(&self) -> FilterParser {
        self.config.filter_parser()
    }

    pub fn expand_parser(&self) -> ExpandParser {
        ExpandParser::new(self.config.max_expand_depth).with_filter_parser(self.filter_parser())
    }

    /// Returns the shared default options of `entity`, building them on
    /// first access.
    pub fn defaults_for(&self, entity: &EntityType) -> Result<Arc<AppliedQueryOptions>> {
        let slot: DefaultsSlot = Arc::clone(&self.defaults.entry(entity.clone()).or_default());
        slot.get_or_try_init(|| self.build_defaults(entity)).cloned()
    }

    /// Returns a fresh, request-owned copy of the default options.
    pub fn create(&self, entity: &EntityType) -> Result<AppliedQueryOptions> {
        Ok(self.defaults_for(entity)?.as_ref().clone())
    }

    /// Builds validated options for `entity` from raw request parameters.
    pub fn from_params(
        &self,
        entity: &EntityType,
        params: &QueryParams,
    ) -> Result<AppliedQueryOptions> {
        let mut options = self.create(entity)?;
        if let Some(top) = params.top()? {
            options.set_top(top)?;
        }
        if let Some(skip) = params.skip()? {
            options.set_skip(skip);
        }
        if let Some(token) = params.skiptoken() {
            options.set_skiptoken(token);
        }
        if let Some(expand) = params.expand() {
            options.set_expand(self.expand_parser().parse(expand)?);
        }
        if let Some(filters) = params.filters() {
            options.set_filters(self.filter_parser().parse(filters)?);
        }
        if let Some(order_by) = params.order_by() {
            options.set_order_by(parse_order_by(order_by)?);
        }
        if let Some(select) = params.select() {
            options.set_select(parse_select(select)?);
        }
        self.validator().validate_options(&options)?;
        Ok(options)
    }

    /// Drops the cached defaults and catalog of `entity`.
    pub fn invalidate(&self, entity: &EntityType) {
        self.defaults.remove(entity);
        self.registry.invalidate(entity);
    }

    fn build_defaults(&self, entity: &EntityType) -> Result<Arc<AppliedQueryOptions>> {
        let catalog = self.registry.catalog(entity)?;
        let mut options = AppliedQueryOptions::new(catalog).with_max_top(self.config.max_top);
        if let Some(top) = self.config.default_top {
            options.set_top(top)?;
        }
        debug!(
            entity = %entity,
            properties = options.catalog().properties().len(),
            top = ?options.top(),
            "built default query options"
        );
        Ok(Arc::new(options))
    }
}

impl core::fmt::Debug for QueryOptionsFactory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QueryOptionsFactory")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("defaults", &self.defaults.len())
            .finish()
    }
}
