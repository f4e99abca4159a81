//! Diff engine
//!
//! Pure change detection over the snapshots of one commit. Each snapshot
//! yields at most one [`AuditEntryDraft`]; snapshots of the audit log itself
//! are skipped so that writing audit rows never produces more audit rows.

use thiserror::Error;

use super::entry::{AuditAction, AuditEntryDraft, FieldChange, AUDIT_LOG_ENTITY_TYPE};
use super::field::{FieldValue, FieldValues};
use super::snapshot::{EntitySnapshot, EntityState};

/// A snapshot the engine cannot interpret; always aborts the commit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("{entity_type} snapshot has no original values")]
    MissingOriginal { entity_type: &'static str },

    #[error("{entity_type} snapshot has {original} original fields but {current} current fields")]
    FieldCount {
        entity_type: &'static str,
        original: usize,
        current: usize,
    },

    #[error("{entity_type} field mismatch: original '{original}' vs current '{current}'")]
    FieldName {
        entity_type: &'static str,
        original: &'static str,
        current: &'static str,
    },

    #[error("{entity_type}.{field} changed type from {from} to {to}")]
    FieldType {
        entity_type: &'static str,
        field: &'static str,
        from: &'static str,
        to: &'static str,
    },

    #[error("{entity_type} declares soft-delete marker '{field}' which is not an audited field")]
    UnknownMarker {
        entity_type: &'static str,
        field: &'static str,
    },
}

/// Compute the drafts for every snapshot of a commit, in snapshot order
pub fn compute_drafts(snapshots: &[EntitySnapshot]) -> Result<Vec<AuditEntryDraft>, DiffError> {
    let mut drafts = Vec::new();
    for snapshot in snapshots {
        if let Some(draft) = compute_draft(snapshot)? {
            drafts.push(draft);
        }
    }
    Ok(drafts)
}

/// Compute the draft for a single snapshot
///
/// Returns `Ok(None)` for audit-log snapshots and for modifications that
/// leave every field unchanged.
pub fn compute_draft(snapshot: &EntitySnapshot) -> Result<Option<AuditEntryDraft>, DiffError> {
    if snapshot.entity_type == AUDIT_LOG_ENTITY_TYPE {
        return Ok(None);
    }

    if let Some(marker) = snapshot.soft_delete.marker() {
        if !snapshot.current.iter().any(|(name, _)| *name == marker) {
            return Err(DiffError::UnknownMarker {
                entity_type: snapshot.entity_type,
                field: marker,
            });
        }
    }

    let (action, changes) = match snapshot.state {
        EntityState::Added => (AuditAction::Create, created_fields(&snapshot.current)),
        EntityState::Deleted => {
            require_original(snapshot)?;
            (AuditAction::Delete, deleted_fields(&snapshot.original))
        }
        EntityState::Modified => {
            require_original(snapshot)?;
            let candidates = changed_fields(snapshot)?;
            if candidates.is_empty() {
                return Ok(None);
            }
            (classify_modification(snapshot, &candidates), candidates)
        }
    };

    if changes.is_empty() {
        return Ok(None);
    }

    Ok(Some(AuditEntryDraft {
        entity_type: snapshot.entity_type,
        entity_id: snapshot.key.clone(),
        action,
        changes,
    }))
}

fn require_original(snapshot: &EntitySnapshot) -> Result<(), DiffError> {
    if snapshot.original.is_empty() && !snapshot.current.is_empty() {
        return Err(DiffError::MissingOriginal {
            entity_type: snapshot.entity_type,
        });
    }
    Ok(())
}

fn created_fields(current: &FieldValues) -> Vec<FieldChange> {
    current
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| FieldChange::new(name, &FieldValue::Null, value))
        .collect()
}

fn deleted_fields(original: &FieldValues) -> Vec<FieldChange> {
    original
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| FieldChange::new(name, value, &FieldValue::Null))
        .collect()
}

fn changed_fields(snapshot: &EntitySnapshot) -> Result<Vec<FieldChange>, DiffError> {
    let entity_type = snapshot.entity_type;
    if snapshot.original.len() != snapshot.current.len() {
        return Err(DiffError::FieldCount {
            entity_type,
            original: snapshot.original.len(),
            current: snapshot.current.len(),
        });
    }

    let mut changes = Vec::new();
    for ((old_name, old), (new_name, new)) in snapshot.original.iter().zip(&snapshot.current) {
        let (old_name, new_name) = (*old_name, *new_name);
        if old_name != new_name {
            return Err(DiffError::FieldName {
                entity_type,
                original: old_name,
                current: new_name,
            });
        }
        if let (Some(from), Some(to)) = (old.kind(), new.kind()) {
            if from != to {
                return Err(DiffError::FieldType {
                    entity_type,
                    field: old_name,
                    from,
                    to,
                });
            }
        }
        if old != new {
            changes.push(FieldChange::new(old_name, old, new));
        }
    }
    Ok(changes)
}

fn classify_modification(snapshot: &EntitySnapshot, candidates: &[FieldChange]) -> AuditAction {
    let marker_change = snapshot
        .soft_delete
        .marker()
        .and_then(|marker| candidates.iter().find(|c| c.field_name == marker));

    match marker_change {
        Some(change) if change.old_value.is_none() && change.new_value.is_some() => {
            AuditAction::Delete
        }
        Some(change) if change.old_value.is_some() && change.new_value.is_none() => {
            AuditAction::Restore
        }
        _ => AuditAction::Update,
    }
}
