//! Read-only audit lookups
//!
//! Every lookup returns records newest first. Records written by the same
//! commit share a timestamp; among those the one written last comes first.
//! Lookups never fail: a store error is logged and yields no records.

use tracing::warn;

use super::entry::AuditLogEntity;
use crate::models::ApiKeyId;
use crate::storage::Ledger;

pub struct AuditQuery<'a> {
    ledger: &'a Ledger,
}

impl<'a> AuditQuery<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// History of one entity
    pub fn get_by_entity(&self, entity_type: &str, entity_id: &str) -> Vec<AuditLogEntity> {
        self.select("get_by_entity", usize::MAX, |record| {
            record.entity_type == entity_type && record.entity_id == entity_id
        })
    }

    /// The `count` most recent records; zero or negative yields nothing
    pub fn get_recent(&self, count: i64) -> Vec<AuditLogEntity> {
        if count <= 0 {
            return Vec::new();
        }
        let limit = usize::try_from(count).unwrap_or(usize::MAX);
        self.select("get_recent", limit, |_| true)
    }

    pub fn get_by_user(&self, user_id: &str) -> Vec<AuditLogEntity> {
        self.select("get_by_user", usize::MAX, |record| {
            record.changed_by_user_id.as_deref() == Some(user_id)
        })
    }

    pub fn get_by_api_key(&self, api_key_id: ApiKeyId) -> Vec<AuditLogEntity> {
        self.select("get_by_api_key", usize::MAX, |record| {
            record.changed_by_api_key_id == Some(api_key_id)
        })
    }

    fn select<F>(&self, operation: &'static str, limit: usize, filter: F) -> Vec<AuditLogEntity>
    where
        F: Fn(&AuditLogEntity) -> bool,
    {
        let tables = match self.ledger.read_tables() {
            Ok(tables) => tables,
            Err(e) => {
                warn!(operation, error = %e, "Audit query failed, returning no records");
                return Vec::new();
            }
        };

        let mut matches: Vec<(usize, &AuditLogEntity)> = tables
            .audit_logs
            .values()
            .enumerate()
            .filter(|(_, record)| filter(record))
            .collect();

        matches.sort_by(|(a_pos, a), (b_pos, b)| {
            b.changed_at
                .cmp(&a.changed_at)
                .then_with(|| b_pos.cmp(a_pos))
        });

        matches
            .into_iter()
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{ActorContext, AuditAction};
    use crate::models::Account;

    fn ledger_with_history() -> (Ledger, String) {
        let ledger = Ledger::in_memory();

        let mut uow = ledger.begin();
        let added = uow.add(Account::new("ACC001", "First"));
        let id = uow
            .commit(&ActorContext::user("u1"))
            .unwrap()
            .id_of(&added)
            .unwrap();

        let mut uow = ledger.begin();
        uow.modify::<Account, _>(id, |a| a.name = "Second".into())
            .unwrap();
        uow.commit(&ActorContext::user("u2")).unwrap();

        (ledger, id.key())
    }

    #[test]
    fn test_get_by_entity_newest_first() {
        let (ledger, key) = ledger_with_history();
        let history = ledger.audit().get_by_entity("Account", &key);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, AuditAction::Update);
        assert_eq!(history[1].action, AuditAction::Create);
        assert!(history[0].changed_at >= history[1].changed_at);
    }

    #[test]
    fn test_get_recent_limits_and_clamps() {
        let (ledger, _) = ledger_with_history();
        let query = ledger.audit();

        assert_eq!(query.get_recent(1).len(), 1);
        assert_eq!(query.get_recent(1)[0].action, AuditAction::Update);
        assert_eq!(query.get_recent(100).len(), 2);
        assert!(query.get_recent(0).is_empty());
        assert!(query.get_recent(-5).is_empty());
    }

    #[test]
    fn test_get_by_user() {
        let (ledger, _) = ledger_with_history();
        let query = ledger.audit();

        let by_u1 = query.get_by_user("u1");
        assert_eq!(by_u1.len(), 1);
        assert_eq!(by_u1[0].action, AuditAction::Create);
        assert!(query.get_by_user("nobody").is_empty());
    }

    #[test]
    fn test_get_by_api_key() {
        let ledger = Ledger::in_memory();
        let key = ApiKeyId::new();

        let mut uow = ledger.begin();
        uow.add(Account::new("ACC001", "Via key"));
        uow.commit(&ActorContext::api_key(key)).unwrap();

        let records = ledger.audit().get_by_api_key(key);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].changed_by_user_id, None);
        assert!(ledger.audit().get_by_api_key(ApiKeyId::new()).is_empty());
    }

    #[test]
    fn test_same_commit_ties_break_by_reverse_insertion() {
        let ledger = Ledger::in_memory();
        let mut uow = ledger.begin();
        uow.add(Account::new("A", "First"));
        uow.add(Account::new("B", "Second"));
        uow.commit(&ActorContext::anonymous()).unwrap();

        let recent = ledger.audit().get_recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].changed_at, recent[1].changed_at);
        assert!(recent[0].changes_json.contains("\"B\""));
        assert!(recent[1].changes_json.contains("\"A\""));
    }
}
