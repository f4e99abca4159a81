//! Change-capture audit trail
//!
//! Every commit of a unit of work runs through this module:
//!
//! - `field`: static per-entity field descriptors and soft-delete markers
//! - `snapshot`: the pending entity states a commit hands over
//! - `diff`: pure change detection producing one draft per changed entity
//! - `builder`: turns drafts plus the actor into `AuditLogEntity` rows
//! - `actor`: who is writing
//! - `query`: read-only lookups over stored records
//!
//! # Example
//!
//! ```rust,ignore
//! use receipts_ledger::audit::ActorContext;
//! use receipts_ledger::models::Account;
//! use receipts_ledger::storage::Ledger;
//!
//! let ledger = Ledger::in_memory();
//! let mut uow = ledger.begin();
//! uow.add(Account::new("ACC001", "Test Account"));
//! uow.commit(&ActorContext::user("u1"))?;
//!
//! let recent = ledger.audit().get_recent(10);
//! ```

mod actor;
mod builder;
mod diff;
mod entry;
mod field;
mod query;
mod snapshot;

pub use actor::{ActorContext, ActorContextProvider, AnonymousActor, EnvActorProvider};
pub use builder::{serialize_changes, AuditRecordBuilder, ResolvedDraft};
pub use diff::{compute_draft, compute_drafts, DiffError};
pub use entry::{AuditAction, AuditEntryDraft, AuditLogEntity, FieldChange, AUDIT_LOG_ENTITY_TYPE};
pub use field::{Auditable, FieldDescriptor, FieldValue, FieldValues, SoftDelete};
pub use query::AuditQuery;
pub use snapshot::{EntityKey, EntitySnapshot, EntityState};
