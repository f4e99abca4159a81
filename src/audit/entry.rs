//! Audit entry data structures
//!
//! Defines the audit actions, the per-field change record, the in-memory
//! draft produced by the diff engine, and the persisted, append-only
//! [`AuditLogEntity`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::field::{Auditable, FieldDescriptor, FieldValue};
use super::snapshot::EntityKey;
use crate::models::{ApiKeyId, AuditLogId};

/// Entity type name of the audit log itself; never diffed
pub const AUDIT_LOG_ENTITY_TYPE: &str = "AuditLog";

/// Kind of change an audit record documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    /// Entity was inserted
    Create,
    /// One or more fields changed
    Update,
    /// Entity was hard-deleted or soft-deleted
    Delete,
    /// A soft-deleted entity was brought back
    Restore,
}

impl AuditAction {
    /// Parse an action name, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "restore" => Some(Self::Restore),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Create => write!(f, "CREATE"),
            AuditAction::Update => write!(f, "UPDATE"),
            AuditAction::Delete => write!(f, "DELETE"),
            AuditAction::Restore => write!(f, "RESTORE"),
        }
    }
}

/// One field's before/after values in string form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldChange {
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldChange {
    pub fn new(field_name: &str, old: &FieldValue, new: &FieldValue) -> Self {
        Self {
            field_name: field_name.to_string(),
            old_value: old.to_change_string(),
            new_value: new.to_change_string(),
        }
    }
}

/// What one entity's audit record will contain, before it is persisted
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntryDraft {
    pub entity_type: &'static str,
    pub entity_id: EntityKey,
    pub action: AuditAction,
    pub changes: Vec<FieldChange>,
}

/// A persisted audit record
///
/// Written exactly once, in the same commit as the change it documents, and
/// never modified afterwards. Only the retention prune removes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntity {
    pub id: AuditLogId,

    /// Entity type affected (e.g. "Account", "Receipt")
    pub entity_type: String,

    /// Primary key of the affected entity
    pub entity_id: String,

    pub action: AuditAction,

    /// Compact JSON array of `{FieldName, OldValue, NewValue}`
    pub changes_json: String,

    #[serde(default)]
    pub changed_by_user_id: Option<String>,

    #[serde(default)]
    pub changed_by_api_key_id: Option<ApiKeyId>,

    pub changed_at: DateTime<Utc>,

    #[serde(default)]
    pub ip_address: Option<String>,
}

impl AuditLogEntity {
    /// Decode `changes_json` for display
    pub fn changes(&self) -> Result<Vec<FieldChange>, serde_json::Error> {
        serde_json::from_str(&self.changes_json)
    }

    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.changed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action,
            self.entity_type,
            self.entity_id
        );

        if let Some(user) = &self.changed_by_user_id {
            output.push_str(&format!(" by {}", user));
        } else if let Some(key) = &self.changed_by_api_key_id {
            output.push_str(&format!(" by api key {}", key.key()));
        }

        match self.changes() {
            Ok(changes) => {
                for change in changes {
                    output.push_str(&format!(
                        "\n  {}: {} -> {}",
                        change.field_name,
                        change.old_value.as_deref().unwrap_or("null"),
                        change.new_value.as_deref().unwrap_or("null"),
                    ));
                }
            }
            Err(_) => output.push_str("\n  (unreadable changes)"),
        }

        output
    }
}

impl Auditable for AuditLogEntity {
    const ENTITY_TYPE: &'static str = AUDIT_LOG_ENTITY_TYPE;
    const FIELDS: &'static [FieldDescriptor<Self>] = &[
        FieldDescriptor {
            name: "EntityType",
            read: |r: &AuditLogEntity| (&r.entity_type).into(),
        },
        FieldDescriptor {
            name: "EntityId",
            read: |r: &AuditLogEntity| (&r.entity_id).into(),
        },
        FieldDescriptor {
            name: "Action",
            read: |r: &AuditLogEntity| FieldValue::Text(r.action.to_string()),
        },
        FieldDescriptor {
            name: "ChangesJson",
            read: |r: &AuditLogEntity| (&r.changes_json).into(),
        },
        FieldDescriptor {
            name: "ChangedByUserId",
            read: |r: &AuditLogEntity| r.changed_by_user_id.as_deref().into(),
        },
        FieldDescriptor {
            name: "ChangedByApiKeyId",
            read: |r: &AuditLogEntity| r.changed_by_api_key_id.map(|k| *k.as_uuid()).into(),
        },
        FieldDescriptor {
            name: "ChangedAt",
            read: |r: &AuditLogEntity| r.changed_at.into(),
        },
        FieldDescriptor {
            name: "IpAddress",
            read: |r: &AuditLogEntity| r.ip_address.as_deref().into(),
        },
    ];
}
