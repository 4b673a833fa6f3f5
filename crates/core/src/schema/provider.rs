//! Schema provider: the host's description of its queryable entity types.

use super::entity::EntityType;
use super::expand::ExpandDefinition;
use super::property::PropertyDefinition;
use crate::error::{Error, Result};
use hashbrown::HashMap;

/// Supplies property and relation metadata per entity type.
///
/// Implementations are consulted at most once per entity type by
/// [`CatalogRegistry`](crate::CatalogRegistry); they may be slow.
pub trait SchemaProvider: Send + Sync {
    /// Returns whether the entity type accepts query options at all.
    fn supports_query_options(&self, entity: &EntityType) -> bool;

    /// Returns the properties that may appear in filters.
    fn filterable_properties(&self, entity: &EntityType) -> Result<Vec<PropertyDefinition>>;

    /// Returns the relations that may be expanded.
    fn expandable_properties(&self, entity: &EntityType) -> Result<Vec<ExpandDefinition>>;

    /// Returns the properties that may appear in `orderBy`, or None to reuse
    /// the filterable names.
    fn orderable_properties(&self, _entity: &EntityType) -> Result<Option<Vec<String>>> {
        Ok(None)
    }

    /// Returns the properties that may appear in `select`, or None to reuse
    /// the filterable names.
    fn selectable_properties(&self, _entity: &EntityType) -> Result<Option<Vec<String>>> {
        Ok(None)
    }
}

/// Static description of one entity type.
#[derive(Clone, Debug, Default)]
pub struct EntityDescription {
    properties: Vec<PropertyDefinition>,
    expands: Vec<ExpandDefinition>,
    orderable: Option<Vec<String>>,
    selectable: Option<Vec<String>>,
}

impl EntityDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filterable property.
    pub fn property(mut self, definition: PropertyDefinition) -> Self {
        self.properties.push(definition);
        self
    }

    /// Adds an expandable relation.
    pub fn expand(mut self, definition: ExpandDefinition) -> Self {
        self.expands.push(definition);
        self
    }

    /// Sets the orderable property names.
    pub fn orderable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.orderable = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the selectable property names.
    pub fn selectable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selectable = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// Schema provider backed by explicit per-entity registration.
#[derive(Clone, Debug, Default)]
pub struct StaticSchemaProvider {
    entities: HashMap<EntityType, EntityDescription>,
}

impl StaticSchemaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the description of an entity type.
    pub fn register(
        mut self,
        entity: impl Into<EntityType>,
        description: EntityDescription,
    ) -> Self {
        self.entities.insert(entity.into(), description);
        self
    }

    fn describe(&self, entity: &EntityType) -> Result<&EntityDescription> {
        self.entities
            .get(entity)
            .ok_or_else(|| Error::internal(format!("No schema registered for entity {}", entity)))
    }
}

impl SchemaProvider for StaticSchemaProvider {
    fn supports_query_options(&self, entity: &EntityType) -> bool {
        self.entities.contains_key(entity)
    }

    fn filterable_properties(&self, entity: &EntityType) -> Result<Vec<PropertyDefinition>> {
        Ok(self.describe(entity)?.properties.clone())
    }

    fn expandable_properties(&self, entity: &EntityType) -> Result<Vec<ExpandDefinition>> {
        Ok(self.describe(entity)?.expands.clone())
    }

    fn orderable_properties(&self, entity: &EntityType) -> Result<Option<Vec<String>>> {
        Ok(self.describe(entity)?.orderable.clone())
    }

    fn selectable_properties(&self, entity: &EntityType) -> Result<Option<Vec<String>>> {
        Ok(self.describe(entity)?.selectable.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_provider() {
        let provider = StaticSchemaProvider::new().register(
            "Post",
            EntityDescription::new()
                .property(PropertyDefinition::new("status"))
                .expand(ExpandDefinition::new("author", EntityType::new("User")))
                .orderable(["createdAt"]),
        );

        let post = EntityType::new("Post");
        assert!(provider.supports_query_options(&post));
        assert_eq!(provider.filterable_properties(&post).unwrap().len(), 1);
        assert_eq!(provider.expandable_properties(&post).unwrap().len(), 1);
        assert_eq!(
            provider.orderable_properties(&post).unwrap(),
            Some(vec!["createdAt".to_string()])
        );
        assert_eq!(provider.selectable_properties(&post).unwrap(), None);
    }

    #[test]
    fn test_static_provider_unknown_entity() {
        let provider = StaticSchemaProvider::new();
        let tag = EntityType::new("Tag");
        assert!(!provider.supports_query_options(&tag));
        assert!(matches!(
            provider.filterable_properties(&tag),
            Err(Error::Internal { .. })
        ));
    }
}
