//! Audit record display formatting

use crate::audit::AuditLogEntity;

/// One line per record, newest first as given
pub fn format_audit_list(records: &[AuditLogEntity]) -> String {
    if records.is_empty() {
        return "No audit records found.".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<20}  {:<8}  {:<12}  {:<36}  {:<12}  {}\n",
        "Changed At", "Action", "Entity", "Entity ID", "User", "Fields"
    ));
    output.push_str(&format!(
        "{:-<20}  {:-<8}  {:-<12}  {:-<36}  {:-<12}  {:-<6}\n",
        "", "", "", "", "", ""
    ));

    for record in records {
        let fields = match record.changes() {
            Ok(changes) => changes
                .iter()
                .map(|c| c.field_name.as_str())
                .collect::<Vec<_>>()
                .join(","),
            Err(_) => "?".to_string(),
        };

        output.push_str(&format!(
            "{:<20}  {:<8}  {:<12}  {:<36}  {:<12}  {}\n",
            record.changed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.action.to_string(),
            record.entity_type,
            record.entity_id,
            actor(record),
            fields,
        ));
    }

    output
}

/// Full before/after view of each record
pub fn format_audit_details(records: &[AuditLogEntity]) -> String {
    if records.is_empty() {
        return "No audit records found.".to_string();
    }

    records
        .iter()
        .map(AuditLogEntity::format_human_readable)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn actor(record: &AuditLogEntity) -> String {
    match (&record.changed_by_user_id, record.changed_by_api_key_id) {
        (Some(user), _) => user.clone(),
        (None, Some(key)) => key.to_string(),
        (None, None) => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{ActorContext, AuditAction, AuditRecordBuilder, FieldChange, FieldValue, ResolvedDraft};
    use chrono::Utc;

    fn record(actor: ActorContext) -> AuditLogEntity {
        let draft = ResolvedDraft {
            entity_type: "Account",
            entity_id: "00000000-0000-4000-8000-000000000001".into(),
            action: AuditAction::Update,
            changes: vec![FieldChange::new(
                "Name",
                &FieldValue::Text("Old".into()),
                &FieldValue::Text("New".into()),
            )],
        };
        AuditRecordBuilder::new(actor, Utc::now()).build(&draft).unwrap()
    }

    #[test]
    fn test_empty() {
        assert_eq!(format_audit_list(&[]), "No audit records found.");
        assert_eq!(format_audit_details(&[]), "No audit records found.");
    }

    #[test]
    fn test_list_shows_actor_and_fields() {
        let output = format_audit_list(&[record(ActorContext::user("alice"))]);
        assert!(output.contains("UPDATE"));
        assert!(output.contains("alice"));
        assert!(output.contains("Name"));

        let anonymous = format_audit_list(&[record(ActorContext::anonymous())]);
        assert!(anonymous.contains(" - "));
    }

    #[test]
    fn test_details_show_values() {
        let output = format_audit_details(&[record(ActorContext::anonymous())]);
        assert!(output.contains("Old"));
        assert!(output.contains("New"));
    }
}
