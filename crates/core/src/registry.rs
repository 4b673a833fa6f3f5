//! Process-wide catalog memoization.
//!
//! The registry resolves an [`EntityCatalog`] through the [`SchemaProvider`]
//! the first time an entity type is requested and hands out the shared,
//! immutable result afterwards. Concurrent first requests for the same type
//! initialize it once; a failed build is not cached and is retried on the
//! next request.

use crate::error::{Error, Result};
use crate::schema::{CatalogBuilder, EntityCatalog, EntityType, SchemaProvider};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, error};

type CatalogSlot = Arc<OnceCell<Arc<EntityCatalog>>>;

/// Concurrency-safe cache of entity catalogs keyed by entity type.
pub struct CatalogRegistry {
    provider: Arc<dyn SchemaProvider>,
    catalogs: DashMap<EntityType, CatalogSlot>,
}

impl CatalogRegistry {
    /// Creates a registry backed by `provider`.
    pub fn new(provider: Arc<dyn SchemaProvider>) -> Self {
        Self {
            provider,
            catalogs: DashMap::new(),
        }
    }

    /// Returns the schema provider.
    #[inline]
    pub fn provider(&self) -> &Arc<dyn SchemaProvider> {
        &self.provider
    }

    /// Returns the catalog of `entity`, building it on first access.
    pub fn catalog(&self, entity: &EntityType) -> Result<Arc<EntityCatalog>> {
        // Clone the slot out so the shard lock is released before building;
        // building may resolve other entity types through this registry.
        let slot: CatalogSlot = Arc::clone(&self.catalogs.entry(entity.clone()).or_default());
        slot.get_or_try_init(|| self.build(entity)).cloned()
    }

    /// Returns whether the catalog of `entity` has been built.
    pub fn is_cached(&self, entity: &EntityType) -> bool {
        self.catalogs
            .get(entity)
            .map(|slot| slot.value().get().is_some())
            .unwrap_or(false)
    }

    /// Drops the cached catalog of `entity`.
    pub fn invalidate(&self, entity: &EntityType) {
        self.catalogs.remove(entity);
    }

    /// Returns the number of built catalogs.
    pub fn len(&self) -> usize {
        self.catalogs.iter().filter(|slot| slot.value().get().is_some()).count()
    }

    /// Returns true if no catalog has been built.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn build(&self, entity: &EntityType) -> Result<Arc<EntityCatalog>> {
        if !self.provider.supports_query_options(entity) {
            return Err(Error::not_queryable(entity.as_str()));
        }
        let catalog = self.describe(entity).map_err(|err| {
            if let Error::Internal { message } = &err {
                error!(
                    entity = %entity,
                    %message,
                    "schema provider returned an inconsistent catalog"
                );
            }
            err
        })?;
        debug!(
            entity = %entity,
            properties = catalog.properties().len(),
            expands = catalog.expands().len(),
            "built property catalog"
        );
        Ok(Arc::new(catalog))
    }

    fn describe(&self, entity: &EntityType) -> Result<EntityCatalog> {
        let mut builder = CatalogBuilder::new(entity.clone());
        for property in self.provider.filterable_properties(entity)? {
            builder = builder.add_property(property)?;
        }
        for expand in self.provider.expandable_properties(entity)? {
            builder = builder.add_expand(expand)?;
        }
        if let Some(names) = self.provider.orderable_properties(entity)? {
            builder = builder.orderable(names)?;
        }
        if let Some(names) = self.provider.selectable_properties(entity)? {
            builder = builder.selectable(names)?;
        }
        Ok(builder.build())
    }
}

impl core::fmt::Debug for CatalogRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CatalogRegistry")
            .field("catalogs", &self.len())
            .finish()
    }
}
