//! Unit of work
//!
//! Tracks the entities added, modified and removed during one logical write
//! and flushes them in a single commit. `commit` diffs every tracked entity
//! before anything is written, applies the writes (generating pending keys),
//! builds the audit records for the same commit, and hands business and
//! audit rows to the backend together. Any failure leaves the store exactly
//! as it was.
//!
//! A modified or removed row must still hold the values it was loaded with
//! when the commit applies it; otherwise the commit fails with
//! `LedgerError::Conflict` and can be retried from scratch.
//!
//! Dropping a unit of work without committing discards it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, error, info, info_span};

use super::ledger::Ledger;
use super::tables::{Entity, Tables};
use crate::audit::{
    compute_drafts, ActorContext, ActorContextProvider, AuditLogEntity, AuditRecordBuilder,
    EntityKey, EntitySnapshot, EntityState, ResolvedDraft,
};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, Receipt, ReceiptItem, RecordId, Transaction};

/// One tracked entity: its state, the values it was loaded with, and its
/// pending values
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    state: EntityState,
    original: Option<T>,
    current: T,
}

impl<T: Entity> Tracked<T> {
    fn added(entity: T) -> Self {
        Self {
            state: EntityState::Added,
            original: None,
            current: entity,
        }
    }

    fn loaded(state: EntityState, entity: T) -> Self {
        Self {
            state,
            original: Some(entity.clone()),
            current: entity,
        }
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    fn key(&self, slot: usize) -> EntityKey {
        let id = self.current.id();
        if id.is_pending() {
            EntityKey::Pending(slot)
        } else {
            EntityKey::Known(id.key())
        }
    }

    fn snapshot(&self, slot: usize) -> EntitySnapshot {
        let key = self.key(slot);
        match self.state {
            EntityState::Added => EntitySnapshot::added(key, &self.current),
            EntityState::Modified => {
                EntitySnapshot::modified(key, self.original.as_ref(), &self.current)
            }
            EntityState::Deleted => EntitySnapshot::deleted(key, self.original.as_ref()),
        }
    }

    fn apply(
        &self,
        tables: &mut Tables,
        slot: usize,
        generated: &mut HashMap<usize, String>,
    ) -> LedgerResult<()> {
        let table = T::table_mut(tables);

        match self.state {
            EntityState::Added => {
                let mut row = self.current.clone();
                if row.id().is_pending() {
                    let mut id = T::Id::generate();
                    while table.contains_key(&id) {
                        id = T::Id::generate();
                    }
                    row.set_id(id);
                    generated.insert(slot, id.key());
                } else if table.contains_key(&row.id()) {
                    return Err(LedgerError::Duplicate {
                        entity_type: T::ENTITY_TYPE,
                        identifier: row.id().key(),
                    });
                }
                table.insert(row.id(), row);
            }
            EntityState::Modified => {
                let row = self.live_row(table)?;
                *row = self.current.clone();
            }
            EntityState::Deleted => {
                self.live_row(table)?;
                table.shift_remove(&self.current.id());
            }
        }

        Ok(())
    }

    /// The stored row, provided it still holds the values this entry was
    /// loaded with
    fn live_row<'t>(&self, table: &'t mut IndexMap<T::Id, T>) -> LedgerResult<&'t mut T> {
        let id = self.current.id();
        let row = table.get_mut(&id).ok_or_else(|| not_found::<T>(id))?;
        if self.original.as_ref() != Some(&*row) {
            return Err(LedgerError::Conflict {
                entity_type: T::ENTITY_TYPE,
                identifier: id.key(),
            });
        }
        Ok(row)
    }
}

/// A tracked entity of any stored type, in the order it was tracked
#[derive(Debug, Clone)]
pub enum TrackedEntry {
    Account(Tracked<Account>),
    Receipt(Tracked<Receipt>),
    ReceiptItem(Tracked<ReceiptItem>),
    Transaction(Tracked<Transaction>),
    AuditLog(Tracked<AuditLogEntity>),
}

macro_rules! dispatch {
    ($entry:expr, $tracked:ident => $body:expr) => {
        match $entry {
            TrackedEntry::Account($tracked) => $body,
            TrackedEntry::Receipt($tracked) => $body,
            TrackedEntry::ReceiptItem($tracked) => $body,
            TrackedEntry::Transaction($tracked) => $body,
            TrackedEntry::AuditLog($tracked) => $body,
        }
    };
}

impl TrackedEntry {
    fn snapshot(&self, slot: usize) -> EntitySnapshot {
        dispatch!(self, tracked => tracked.snapshot(slot))
    }

    fn apply(
        &self,
        tables: &mut Tables,
        slot: usize,
        generated: &mut HashMap<usize, String>,
    ) -> LedgerResult<()> {
        dispatch!(self, tracked => tracked.apply(tables, slot, generated))
    }
}

/// Handle to an entity added in a unit of work
///
/// Resolves to the stored key through [`CommitSummary::id_of`] once the
/// commit has generated it.
#[derive(Debug)]
pub struct Added<T: Entity> {
    slot: usize,
    id: T::Id,
}

impl<T: Entity> Added<T> {
    /// Key as it was at `add` time; pending if the store generates it
    pub fn id(&self) -> T::Id {
        self.id
    }
}

/// Outcome of a successful commit
#[derive(Debug, Clone, Default)]
pub struct CommitSummary {
    pub rows_written: usize,
    pub audit_records: usize,
    pub changed_at: Option<DateTime<Utc>>,
    generated: HashMap<usize, String>,
}

impl CommitSummary {
    /// Stored key of an added entity
    pub fn id_of<T: Entity>(&self, added: &Added<T>) -> Option<T::Id> {
        if !added.id.is_pending() {
            return Some(added.id);
        }
        self.generated
            .get(&added.slot)
            .and_then(|key| T::Id::from_key(key))
    }

    pub fn generated_keys(&self) -> usize {
        self.generated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows_written == 0
    }
}

/// Invariant checked against the post-commit tables, inside the write lock
type Guard<'a> = Box<dyn Fn(&Tables) -> LedgerResult<()> + 'a>;

pub struct UnitOfWork<'a> {
    ledger: &'a Ledger,
    entries: Vec<(usize, TrackedEntry)>,
    guards: Vec<Guard<'a>>,
    next_slot: usize,
}

impl<'a> UnitOfWork<'a> {
    pub(crate) fn new(ledger: &'a Ledger) -> Self {
        Self {
            ledger,
            entries: Vec::new(),
            guards: Vec::new(),
            next_slot: 0,
        }
    }

    fn next_slot(&mut self) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    fn position<T: Entity>(&self, id: T::Id) -> Option<usize> {
        if id.is_pending() {
            return None;
        }
        self.entries.iter().position(|(_, entry)| {
            T::as_tracked(entry).map_or(false, |tracked| tracked.current.id() == id)
        })
    }

    fn position_of_slot(&self, slot: usize) -> Option<usize> {
        self.entries.iter().position(|(s, _)| *s == slot)
    }

    fn tracked_mut<T: Entity>(&mut self, index: usize) -> LedgerResult<&mut Tracked<T>> {
        T::as_tracked_mut(&mut self.entries[index].1).ok_or_else(|| {
            LedgerError::Storage(format!("tracked entry is not a {}", T::ENTITY_TYPE))
        })
    }

    fn load<T: Entity>(&mut self, id: T::Id, state: EntityState) -> LedgerResult<usize> {
        let entity = self
            .ledger
            .get::<T>(id)?
            .ok_or_else(|| not_found::<T>(id))?;
        let slot = self.next_slot();
        self.entries
            .push((slot, T::into_entry(Tracked::loaded(state, entity))));
        Ok(self.entries.len() - 1)
    }

    /// Track a new entity; a pending key is generated on commit
    pub fn add<T: Entity>(&mut self, entity: T) -> Added<T> {
        let slot = self.next_slot();
        let id = entity.id();
        self.entries
            .push((slot, T::into_entry(Tracked::added(entity))));
        Added { slot, id }
    }

    /// Change a stored (or already tracked) entity in place
    pub fn modify<T, F>(&mut self, id: T::Id, f: F) -> LedgerResult<()>
    where
        T: Entity,
        F: FnOnce(&mut T),
    {
        if !T::MUTABLE {
            return Err(LedgerError::Immutable(T::ENTITY_TYPE));
        }

        let index = match self.position::<T>(id) {
            Some(index) => index,
            None => self.load::<T>(id, EntityState::Modified)?,
        };

        let tracked = self.tracked_mut::<T>(index)?;
        if tracked.state == EntityState::Deleted {
            return Err(not_found::<T>(id));
        }

        f(&mut tracked.current);
        tracked.current.set_id(id);
        Ok(())
    }

    /// Replace a stored entity's values with `entity`'s
    pub fn update<T: Entity>(&mut self, entity: T) -> LedgerResult<()> {
        let id = entity.id();
        self.modify::<T, _>(id, move |current| *current = entity)
    }

    /// Change an entity added earlier in this unit of work
    pub fn modify_added<T, F>(&mut self, added: &Added<T>, f: F) -> LedgerResult<()>
    where
        T: Entity,
        F: FnOnce(&mut T),
    {
        let index = self
            .position_of_slot(added.slot)
            .ok_or_else(|| not_found::<T>(added.id))?;
        let tracked = self.tracked_mut::<T>(index)?;

        f(&mut tracked.current);
        tracked.current.set_id(added.id);
        Ok(())
    }

    /// Hard-delete a stored entity
    ///
    /// Removing an entity that was added in this unit of work detaches it;
    /// it is never written.
    pub fn remove<T: Entity>(&mut self, id: T::Id) -> LedgerResult<()> {
        if !T::MUTABLE {
            return Err(LedgerError::Immutable(T::ENTITY_TYPE));
        }

        let Some(index) = self.position::<T>(id) else {
            self.load::<T>(id, EntityState::Deleted)?;
            return Ok(());
        };

        if self.tracked_mut::<T>(index)?.state == EntityState::Added {
            self.entries.remove(index);
            return Ok(());
        }

        let tracked = self.tracked_mut::<T>(index)?;
        if tracked.state == EntityState::Modified {
            tracked.state = EntityState::Deleted;
            if let Some(original) = tracked.original.clone() {
                tracked.current = original;
            }
        }
        Ok(())
    }

    /// Detach an entity added in this unit of work
    pub fn remove_added<T: Entity>(&mut self, added: &Added<T>) -> bool {
        match self.position_of_slot(added.slot) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Entity as this unit of work sees it: tracked values first, then the
    /// store
    pub fn find<T: Entity>(&self, id: T::Id) -> LedgerResult<Option<T>> {
        if let Some(index) = self.position::<T>(id) {
            let tracked = T::as_tracked(&self.entries[index].1);
            return Ok(tracked
                .filter(|t| t.state != EntityState::Deleted)
                .map(|t| t.current.clone()));
        }
        self.ledger.get::<T>(id)
    }

    /// Check `invariant` against the tables as they will be after this
    /// commit, while the write lock is held; an error aborts the commit
    pub fn guard<F>(&mut self, invariant: F)
    where
        F: Fn(&Tables) -> LedgerResult<()> + 'a,
    {
        self.guards.push(Box::new(invariant));
    }

    pub fn has_changes(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Commit with the actor supplied by `provider`
    pub fn commit_with<P>(self, provider: &P) -> LedgerResult<CommitSummary>
    where
        P: ActorContextProvider + ?Sized,
    {
        let actor = provider.current();
        self.commit(&actor)
    }

    /// Write every tracked change and its audit records atomically
    pub fn commit(mut self, actor: &ActorContext) -> LedgerResult<CommitSummary> {
        let span = info_span!(
            "commit",
            user_id = ?actor.user_id,
            api_key_id = ?actor.api_key_id,
            ip_address = ?actor.ip_address,
            user_agent = ?actor.user_agent,
        );
        let _guard = span.enter();

        let entries = std::mem::take(&mut self.entries);
        if entries.is_empty() {
            debug!("Nothing to commit");
            return Ok(CommitSummary::default());
        }

        let snapshots: Vec<EntitySnapshot> = entries
            .iter()
            .map(|(slot, entry)| entry.snapshot(*slot))
            .collect();
        let drafts = compute_drafts(&snapshots).map_err(|e| abort(e.into()))?;
        for draft in &drafts {
            debug!(
                entity_type = draft.entity_type,
                action = %draft.action,
                changes = draft.changes.len(),
                "Audit draft"
            );
        }

        let mut live = self.ledger.write_tables()?;
        let mut working = live.clone();
        let mut generated = HashMap::new();

        for (slot, entry) in &entries {
            entry
                .apply(&mut working, *slot, &mut generated)
                .map_err(abort)?;
        }
        for guard in &self.guards {
            guard(&working).map_err(abort)?;
        }

        let builder = AuditRecordBuilder::new(actor.clone(), Utc::now());
        let mut audit_records = 0;
        for draft in drafts {
            let resolved = ResolvedDraft::resolve(draft, &generated).map_err(abort)?;
            let record = builder.build(&resolved).map_err(abort)?;
            working.audit_logs.insert(record.id, record);
            audit_records += 1;
        }

        self.ledger
            .backend()
            .persist(&working.to_document())
            .map_err(abort)?;
        *live = working;

        info!(
            rows_written = entries.len(),
            audit_records,
            user_id = ?actor.user_id,
            "Committed unit of work"
        );

        Ok(CommitSummary {
            rows_written: entries.len(),
            audit_records,
            changed_at: Some(builder.changed_at()),
            generated,
        })
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            debug!(
                entries = self.entries.len(),
                "Discarding uncommitted unit of work"
            );
        }
    }
}

fn not_found<T: Entity>(id: T::Id) -> LedgerError {
    LedgerError::NotFound {
        entity_type: T::ENTITY_TYPE,
        identifier: id.key(),
    }
}

fn abort(e: LedgerError) -> LedgerError {
    error!(error = %e, "Commit aborted");
    e
}
