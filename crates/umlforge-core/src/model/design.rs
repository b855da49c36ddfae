use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::class::DesignClass;
use super::relationship::DesignRelationship;
use super::ModelError;

/// Classes and relationships of one design, with case-insensitive indexes
/// kept in sync by every mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ModelData")]
pub struct DesignModel {
    classes: Vec<DesignClass>,
    relationships: Vec<DesignRelationship>,
    #[serde(skip)]
    class_index: HashMap<String, usize>,
    #[serde(skip)]
    relationship_index: HashMap<(String, String), usize>,
}

/// Wire shape; converted through `add_class`/`add_relationship` so
/// client-submitted duplicates are merged.
#[derive(Deserialize)]
struct ModelData {
    #[serde(default)]
    classes: Vec<DesignClass>,
    #[serde(default)]
    relationships: Vec<DesignRelationship>,
}

impl From<ModelData> for DesignModel {
    fn from(data: ModelData) -> Self {
        let mut model = Self::new();
        for class in data.classes {
            model.add_class(class);
        }
        for relationship in data.relationships {
            model.add_relationship(relationship);
        }
        model
    }
}

impl PartialEq for DesignModel {
    fn eq(&self, other: &Self) -> bool {
        self.classes == other.classes && self.relationships == other.relationships
    }
}

fn pair_key(source: &str, target: &str) -> (String, String) {
    (source.to_lowercase(), target.to_lowercase())
}

impl DesignModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classes(&self) -> &[DesignClass] {
        &self.classes
    }

    pub fn relationships(&self) -> &[DesignRelationship] {
        &self.relationships
    }

    pub fn classes_mut(&mut self) -> impl Iterator<Item = &mut DesignClass> {
        self.classes.iter_mut()
    }

    pub fn relationships_mut(&mut self) -> impl Iterator<Item = &mut DesignRelationship> {
        self.relationships.iter_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.relationships.is_empty()
    }

    pub fn find_class(&self, name: &str) -> Option<&DesignClass> {
        self.class_index
            .get(&name.to_lowercase())
            .map(|&i| &self.classes[i])
    }

    pub fn find_class_mut(&mut self, name: &str) -> Option<&mut DesignClass> {
        self.class_index
            .get(&name.to_lowercase())
            .map(|&i| &mut self.classes[i])
    }

    pub fn find_relationship(&self, source: &str, target: &str) -> Option<&DesignRelationship> {
        self.relationship_index
            .get(&pair_key(source, target))
            .map(|&i| &self.relationships[i])
    }

    pub fn find_relationship_mut(
        &mut self,
        source: &str,
        target: &str,
    ) -> Option<&mut DesignRelationship> {
        self.relationship_index
            .get(&pair_key(source, target))
            .map(|&i| &mut self.relationships[i])
    }

    /// Adds a class, or merges its members into the existing class with the
    /// same name ignoring case. Returns `true` when a new class was appended.
    pub fn add_class(&mut self, class: DesignClass) -> bool {
        let key = class.name().to_lowercase();
        if let Some(&index) = self.class_index.get(&key) {
            self.classes[index].absorb(class);
            return false;
        }
        self.class_index.insert(key, self.classes.len());
        self.classes.push(class);
        true
    }

    /// Adds a relationship, or overwrites kind and confidence on the existing
    /// pair. Returns `true` when a new relationship was appended.
    pub fn add_relationship(&mut self, relationship: DesignRelationship) -> bool {
        let key = relationship.key();
        if let Some(&index) = self.relationship_index.get(&key) {
            let existing = &mut self.relationships[index];
            existing.kind = relationship.kind;
            existing.confidence = relationship.confidence;
            return false;
        }
        self.relationship_index.insert(key, self.relationships.len());
        self.relationships.push(relationship);
        true
    }

    /// Removes the class and every relationship touching it. Dangling
    /// relationships naming `name` are removed even when no class matches.
    pub fn remove_class(&mut self, name: &str) -> bool {
        let key = name.to_lowercase();
        let found = self.class_index.contains_key(&key);
        if found {
            self.classes.retain(|c| c.name().to_lowercase() != key);
        }
        let before = self.relationships.len();
        self.relationships.retain(|r| !r.touches(name));
        if found || before != self.relationships.len() {
            self.reindex();
        }
        found
    }

    pub fn remove_relationship(&mut self, source: &str, target: &str) -> bool {
        let key = pair_key(source, target);
        if !self.relationship_index.contains_key(&key) {
            return false;
        }
        self.relationships.retain(|r| r.key() != key);
        self.reindex();
        true
    }

    /// Renames a class and rewrites relationship endpoints that named it.
    /// Returns `Ok(false)` when no class is called `old`.
    pub fn rename_class(&mut self, old: &str, new: &str) -> Result<bool, ModelError> {
        let new = new.trim();
        if new.is_empty() {
            return Err(ModelError::EmptyName);
        }
        let Some(&index) = self.class_index.get(&old.to_lowercase()) else {
            return Ok(false);
        };
        if let Some(&other) = self.class_index.get(&new.to_lowercase()) {
            if other != index {
                return Err(ModelError::NameConflict {
                    from: self.classes[index].name().to_string(),
                    to: new.to_string(),
                });
            }
        }

        let previous = self.classes[index].name().to_lowercase();
        self.classes[index].set_name(new);
        for relationship in &mut self.relationships {
            if relationship.source().to_lowercase() == previous {
                relationship.set_source(new);
            }
            if relationship.target().to_lowercase() == previous {
                relationship.set_target(new);
            }
        }

        let mut seen = HashSet::new();
        self.relationships.retain(|r| seen.insert(r.key()));
        self.reindex();
        Ok(true)
    }

    /// Removes relationships whose endpoints are the same class.
    pub fn drop_self_loops(&mut self) -> usize {
        let before = self.relationships.len();
        self.relationships.retain(|r| !r.is_self_loop());
        let dropped = before - self.relationships.len();
        if dropped > 0 {
            self.reindex();
        }
        dropped
    }

    /// Orders classes by name and relationships by (source, target), both
    /// ignoring case.
    pub fn sort(&mut self) {
        self.classes
            .sort_by_cached_key(|c| c.name().to_lowercase());
        self.relationships.sort_by_cached_key(DesignRelationship::key);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.class_index.clear();
        for (i, class) in self.classes.iter().enumerate() {
            self.class_index.entry(class.name().to_lowercase()).or_insert(i);
        }
        self.relationship_index.clear();
        for (i, relationship) in self.relationships.iter().enumerate() {
            self.relationship_index.entry(relationship.key()).or_insert(i);
        }
    }
}
