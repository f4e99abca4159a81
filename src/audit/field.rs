//! Static field descriptors for audited entities
//!
//! Every audited entity type declares, once, the ordered list of persisted
//! scalar fields the change tracker reads, plus how (or whether) it marks
//! soft deletion. Declaration order is the order changes appear in an audit
//! record. Relationship/navigation data is simply never declared here.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use crate::models::Money;

/// A typed value read from one persisted field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Money(Money),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Short name of the value's type, `None` for null
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(_) => Some("bool"),
            FieldValue::Int(_) => Some("int"),
            FieldValue::Money(_) => Some("money"),
            FieldValue::Text(_) => Some("text"),
            FieldValue::Date(_) => Some("date"),
            FieldValue::Timestamp(_) => Some("timestamp"),
            FieldValue::Uuid(_) => Some("uuid"),
        }
    }

    /// String form stored in `ChangesJson`; lossy by design, display only
    pub fn to_change_string(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Int(i) => Some(i.to_string()),
            FieldValue::Money(m) => Some(m.to_plain_string()),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            FieldValue::Timestamp(t) => Some(t.to_rfc3339_opts(SecondsFormat::Micros, true)),
            FieldValue::Uuid(u) => Some(u.to_string()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<Money> for FieldValue {
    fn from(value: Money) -> Self {
        FieldValue::Money(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Text(value.clone())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// One persisted scalar field of `T`
pub struct FieldDescriptor<T> {
    pub name: &'static str,
    pub read: fn(&T) -> FieldValue,
}

/// How an entity type expresses logical deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftDelete {
    /// Rows are only ever hard-deleted
    Unsupported,
    /// Named nullable field: null while live, set once deleted
    NullableMarker(&'static str),
}

impl SoftDelete {
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            SoftDelete::Unsupported => None,
            SoftDelete::NullableMarker(field) => Some(field),
        }
    }
}

/// Field values of one entity, in declaration order
pub type FieldValues = Vec<(&'static str, FieldValue)>;

/// An entity type whose changes are captured in the audit trail
pub trait Auditable: Sized + 'static {
    /// Stable name written to `AuditLogEntity::entity_type`
    const ENTITY_TYPE: &'static str;

    /// Persisted scalar fields in declaration order
    const FIELDS: &'static [FieldDescriptor<Self>];

    const SOFT_DELETE: SoftDelete = SoftDelete::Unsupported;

    fn field_values(&self) -> FieldValues {
        Self::FIELDS
            .iter()
            .map(|field| (field.name, (field.read)(self)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Widget {
        label: String,
        count: i64,
        retired_at: Option<DateTime<Utc>>,
    }

    impl Auditable for Widget {
        const ENTITY_TYPE: &'static str = "Widget";
        const FIELDS: &'static [FieldDescriptor<Self>] = &[
            FieldDescriptor {
                name: "Label",
                read: |w: &Widget| (&w.label).into(),
            },
            FieldDescriptor {
                name: "Count",
                read: |w: &Widget| w.count.into(),
            },
            FieldDescriptor {
                name: "RetiredAt",
                read: |w: &Widget| w.retired_at.into(),
            },
        ];
        const SOFT_DELETE: SoftDelete = SoftDelete::NullableMarker("RetiredAt");
    }

    #[test]
    fn test_field_values_follow_declaration_order() {
        let widget = Widget {
            label: "bolt".into(),
            count: 3,
            retired_at: None,
        };
        let values = widget.field_values();
        let names: Vec<_> = values.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["Label", "Count", "RetiredAt"]);
        assert_eq!(values[1].1, FieldValue::Int(3));
        assert!(values[2].1.is_null());
        assert_eq!(Widget::SOFT_DELETE.marker(), Some("RetiredAt"));
    }

    #[test]
    fn test_change_strings() {
        assert_eq!(FieldValue::Null.to_change_string(), None);
        assert_eq!(FieldValue::Bool(true).to_change_string().unwrap(), "true");
        assert_eq!(
            FieldValue::Money(Money::from_cents(1250)).to_change_string().unwrap(),
            "12.50"
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(FieldValue::Date(date).to_change_string().unwrap(), "2024-03-09");
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(
            FieldValue::Timestamp(ts).to_change_string().unwrap(),
            "2024-03-09T14:05:00.000000Z"
        );
    }

    #[test]
    fn test_money_compares_by_value() {
        let a = FieldValue::from(Money::from_cents(500));
        let b = FieldValue::from(Money::parse("5.00").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_option_conversion() {
        let none: Option<i64> = None;
        assert_eq!(FieldValue::from(none), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(7i64)), FieldValue::Int(7));
        assert_eq!(FieldValue::Text("a".into()).kind(), Some("text"));
        assert_eq!(FieldValue::Null.kind(), None);
    }
}
