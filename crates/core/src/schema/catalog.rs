//! Property catalogs: the per-entity whitelist consulted by the validator.

use super::entity::EntityType;
use super::expand::ExpandDefinition;
use super::property::PropertyDefinition;
use crate::error::{Error, Result};
use hashbrown::HashMap;
use std::sync::Arc;

/// Ordered set of property definitions, unique by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyCatalog {
    definitions: Vec<Arc<PropertyDefinition>>,
    index: HashMap<String, usize>,
}

impl PropertyCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from definitions, rejecting duplicate names.
    pub fn from_definitions<I>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = PropertyDefinition>,
    {
        let mut catalog = Self::new();
        for def in definitions {
            catalog.insert(def)?;
        }
        Ok(catalog)
    }

    /// Appends a definition.
    pub fn insert(&mut self, definition: PropertyDefinition) -> Result<()> {
        check_naming_rules(definition.name())?;
        if self.index.contains_key(definition.name()) {
            return Err(Error::internal(format!(
                "Property defined twice: {}",
                definition.name()
            )));
        }
        self.index
            .insert(definition.name().to_string(), self.definitions.len());
        self.definitions.push(Arc::new(definition));
        Ok(())
    }

    /// Gets a definition by property name.
    pub fn get(&self, name: &str) -> Option<&Arc<PropertyDefinition>> {
        self.index.get(name).map(|&i| &self.definitions[i])
    }

    /// Returns whether the catalog contains `name`.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the property names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.definitions.iter().map(|d| d.name())
    }

    /// Iterates the definitions in order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PropertyDefinition>> + '_ {
        self.definitions.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Everything the engine knows about one entity type.
#[derive(Clone, Debug)]
pub struct EntityCatalog {
    entity: EntityType,
    properties: PropertyCatalog,
    orderable: Vec<String>,
    selectable: Vec<String>,
    expands: Vec<ExpandDefinition>,
}

impl EntityCatalog {
    /// Returns the entity type.
    #[inline]
    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    /// Returns the filterable properties.
    #[inline]
    pub fn properties(&self) -> &PropertyCatalog {
        &self.properties
    }

    /// Returns the orderable property names.
    #[inline]
    pub fn orderable(&self) -> &[String] {
        &self.orderable
    }

    /// Returns the selectable property names.
    #[inline]
    pub fn selectable(&self) -> &[String] {
        &self.selectable
    }

    /// Returns the expandable relations.
    #[inline]
    pub fn expands(&self) -> &[ExpandDefinition] {
        &self.expands
    }

    /// Gets an expandable relation by property name.
    pub fn expand(&self, name: &str) -> Option<&ExpandDefinition> {
        self.expands.iter().find(|e| e.name() == name)
    }

    /// Returns the expandable relation names.
    pub fn expand_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.expands.iter().map(|e| e.name())
    }
}

/// Builder for entity catalogs.
pub struct CatalogBuilder {
    entity: EntityType,
    properties: PropertyCatalog,
    orderable: Option<Vec<String>>,
    selectable: Option<Vec<String>>,
    expands: Vec<ExpandDefinition>,
}

impl CatalogBuilder {
    /// Creates a new catalog builder.
    pub fn new(entity: EntityType) -> Self {
        Self {
            entity,
            properties: PropertyCatalog::new(),
            orderable: None,
            selectable: None,
            expands: Vec::new(),
        }
    }

    /// Adds a filterable property.
    pub fn add_property(mut self, definition: PropertyDefinition) -> Result<Self> {
        self.properties.insert(definition)?;
        Ok(self)
    }

    /// Adds an expandable relation.
    pub fn add_expand(mut self, definition: ExpandDefinition) -> Result<Self> {
        check_naming_rules(definition.name())?;
        if self.expands.iter().any(|e| e.name() == definition.name()) {
            return Err(Error::internal(format!(
                "Expand defined twice on {}: {}",
                self.entity,
                definition.name()
            )));
        }
        self.expands.push(definition);
        Ok(self)
    }

    /// Sets the orderable properties. Defaults to the filterable names.
    pub fn orderable(mut self, names: Vec<String>) -> Result<Self> {
        for name in &names {
            check_naming_rules(name)?;
        }
        self.orderable = Some(names);
        Ok(self)
    }

    /// Sets the selectable properties. Defaults to the filterable names.
    pub fn selectable(mut self, names: Vec<String>) -> Result<Self> {
        for name in &names {
            check_naming_rules(name)?;
        }
        self.selectable = Some(names);
        Ok(self)
    }

    /// Builds the catalog.
    pub fn build(self) -> EntityCatalog {
        let names: Vec<String> = self.properties.names().map(str::to_string).collect();
        let orderable = self.orderable.unwrap_or_else(|| names.clone());
        let selectable = self.selectable.unwrap_or(names);
        EntityCatalog {
            entity: self.entity,
            properties: self.properties,
            orderable,
            selectable,
            expands: self.expands,
        }
    }
}

/// Property names are identifier segments joined by single dots.
fn check_naming_rules(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::internal("Property name cannot be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(Error::internal(format!(
            "Property name contains invalid characters: {}",
            name
        )));
    }
    if name.split('.').any(str::is_empty) {
        return Err(Error::internal(format!(
            "Property name has an empty path segment: {}",
            name
        )));
    }
    Ok(())
}
