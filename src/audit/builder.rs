//! Audit record builder
//!
//! Turns resolved drafts into [`AuditLogEntity`] rows. One builder is created
//! per commit so every record of that commit shares the actor snapshot and
//! the commit timestamp.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::actor::ActorContext;
use super::entry::{AuditAction, AuditEntryDraft, AuditLogEntity, FieldChange};
use crate::error::{LedgerError, LedgerResult};
use crate::models::AuditLogId;

/// A draft whose entity key is final
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDraft {
    pub entity_type: &'static str,
    pub entity_id: String,
    pub action: AuditAction,
    pub changes: Vec<FieldChange>,
}

impl ResolvedDraft {
    /// Swap a pending key for the one generated during the write
    pub fn resolve(draft: AuditEntryDraft, generated: &HashMap<usize, String>) -> LedgerResult<Self> {
        let entity_id = draft.entity_id.resolve(generated).ok_or_else(|| {
            LedgerError::Audit(format!(
                "{} key {:?} was never generated",
                draft.entity_type, draft.entity_id
            ))
        })?;

        Ok(Self {
            entity_type: draft.entity_type,
            entity_id,
            action: draft.action,
            changes: draft.changes,
        })
    }
}

pub struct AuditRecordBuilder {
    actor: ActorContext,
    changed_at: DateTime<Utc>,
}

impl AuditRecordBuilder {
    pub fn new(actor: ActorContext, changed_at: DateTime<Utc>) -> Self {
        Self { actor, changed_at }
    }

    pub fn changed_at(&self) -> DateTime<Utc> {
        self.changed_at
    }

    pub fn build(&self, draft: &ResolvedDraft) -> LedgerResult<AuditLogEntity> {
        if draft.changes.is_empty() {
            return Err(LedgerError::Audit(format!(
                "refusing to record {} {} with no changes",
                draft.entity_type, draft.entity_id
            )));
        }

        Ok(AuditLogEntity {
            id: AuditLogId::new(),
            entity_type: draft.entity_type.to_string(),
            entity_id: draft.entity_id.clone(),
            action: draft.action,
            changes_json: serialize_changes(&draft.changes)?,
            changed_by_user_id: self.actor.user_id.clone(),
            changed_by_api_key_id: self.actor.api_key_id,
            changed_at: self.changed_at,
            ip_address: self.actor.ip_address.clone(),
        })
    }
}

/// Compact JSON array of changes, in field order
pub fn serialize_changes(changes: &[FieldChange]) -> LedgerResult<String> {
    serde_json::to_string(changes)
        .map_err(|e| LedgerError::Audit(format!("Failed to serialize changes: {}", e)))
}
