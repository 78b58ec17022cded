//! Named hierarchies held in memory.

use std::collections::BTreeMap;

use crate::block_type::BlockTypeRegistry;
use crate::error::CoreError;
use crate::exchange::HierarchyDict;
use crate::hierarchy::Hierarchy;
use crate::types::DbId;

/// Hierarchies keyed by their unique name.
#[derive(Debug, Default)]
pub struct HierarchyRegistry {
    hierarchies: BTreeMap<String, Hierarchy>,
    next_id: DbId,
}

impl HierarchyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty hierarchy. Fails if the name is taken.
    pub fn create(
        &mut self,
        name: &str,
        base_url: &str,
    ) -> Result<&mut Hierarchy, CoreError> {
        self.ensure_name_free(name)?;
        let id = self.alloc_id();
        tracing::info!(hierarchy_id = id, name, "Hierarchy created");
        Ok(self
            .hierarchies
            .entry(name.to_string())
            .or_insert_with(|| Hierarchy::new(id, name, base_url)))
    }

    /// Build a hierarchy from the exchange format and register it.
    pub fn import(
        &mut self,
        dict: &HierarchyDict,
        block_types: &BlockTypeRegistry,
    ) -> Result<&mut Hierarchy, CoreError> {
        self.ensure_name_free(&dict.name)?;
        let id = self.next_id + 1;
        let hierarchy = Hierarchy::from_nested_dict(id, dict, block_types)?;
        self.next_id = id;
        tracing::info!(
            hierarchy_id = id,
            name = %dict.name,
            sections = hierarchy.section_count(),
            "Hierarchy imported"
        );
        Ok(self.hierarchies.entry(dict.name.clone()).or_insert(hierarchy))
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&Hierarchy> {
        self.hierarchies.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Hierarchy> {
        self.hierarchies.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Hierarchy> {
        let removed = self.hierarchies.remove(name);
        if removed.is_some() {
            tracing::info!(name, "Hierarchy deleted");
        }
        removed
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hierarchies.keys().map(String::as_str)
    }

    fn ensure_name_free(&self, name: &str) -> Result<(), CoreError> {
        if self.hierarchies.contains_key(name) {
            return Err(CoreError::Conflict(format!(
                "A hierarchy named '{name}' already exists"
            )));
        }
        Ok(())
    }

    fn alloc_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}
