//! Entity snapshots handed to the diff engine
//!
//! A snapshot is the state of one pending entity at the moment a commit
//! starts: its type, key, tracking state and field values before and after.

use std::collections::HashMap;

use super::field::{Auditable, FieldValues, SoftDelete};

/// Tracking state of a pending entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Added,
    Modified,
    Deleted,
}

/// Entity key as known when the snapshot is taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKey {
    /// Key already assigned
    Known(String),
    /// Store-generated key, identified by the snapshot's slot in the commit
    Pending(usize),
}

impl EntityKey {
    /// Replace a pending slot with the key the store generated for it
    pub fn resolve(&self, generated: &HashMap<usize, String>) -> Option<String> {
        match self {
            EntityKey::Known(key) => Some(key.clone()),
            EntityKey::Pending(slot) => generated.get(slot).cloned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntitySnapshot {
    pub entity_type: &'static str,
    pub key: EntityKey,
    pub state: EntityState,
    pub soft_delete: SoftDelete,
    /// Empty for `Added`
    pub original: FieldValues,
    pub current: FieldValues,
}

impl EntitySnapshot {
    pub fn added<T: Auditable>(key: EntityKey, entity: &T) -> Self {
        Self {
            entity_type: T::ENTITY_TYPE,
            key,
            state: EntityState::Added,
            soft_delete: T::SOFT_DELETE,
            original: Vec::new(),
            current: entity.field_values(),
        }
    }

    pub fn modified<T: Auditable>(key: EntityKey, original: Option<&T>, current: &T) -> Self {
        Self {
            entity_type: T::ENTITY_TYPE,
            key,
            state: EntityState::Modified,
            soft_delete: T::SOFT_DELETE,
            original: original.map(Auditable::field_values).unwrap_or_default(),
            current: current.field_values(),
        }
    }

    /// Deleted rows keep their last values as both original and current
    pub fn deleted<T: Auditable>(key: EntityKey, original: Option<&T>) -> Self {
        let values = original.map(Auditable::field_values).unwrap_or_default();
        Self {
            entity_type: T::ENTITY_TYPE,
            key,
            state: EntityState::Deleted,
            soft_delete: T::SOFT_DELETE,
            original: values.clone(),
            current: values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_key_resolves_to_itself() {
        let key = EntityKey::Known("abc".into());
        assert_eq!(key.resolve(&HashMap::new()).as_deref(), Some("abc"));
    }

    #[test]
    fn test_pending_key_resolution() {
        let mut generated = HashMap::new();
        generated.insert(2, "generated-key".to_string());

        assert_eq!(
            EntityKey::Pending(2).resolve(&generated).as_deref(),
            Some("generated-key")
        );
        assert_eq!(EntityKey::Pending(3).resolve(&generated), None);
    }
}
