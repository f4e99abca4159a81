//! Strongly-typed ID wrappers for all entity types
//!
//! Newtype wrappers keep identifiers of different entity types apart at
//! compile time. The nil UUID is reserved as the "pending" key of an entity
//! that has not been written yet; the store replaces it on insert.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

/// Behaviour the store needs from every primary key type
pub trait RecordId: Copy + Eq + Hash + fmt::Display + Send + Sync + 'static {
    /// A fresh, non-pending key
    fn generate() -> Self;

    /// True while the key is still the placeholder
    fn is_pending(&self) -> bool;

    /// Full string form used as the audit `EntityId`
    fn key(&self) -> String;

    /// Inverse of [`RecordId::key`]
    fn from_key(key: &str) -> Option<Self>;
}

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Placeholder key for an entity the store has not written yet
            pub const fn pending() -> Self {
                Self(Uuid::nil())
            }

            /// True while the key is still the placeholder
            pub fn is_pending(&self) -> bool {
                self.0.is_nil()
            }

            /// Create an ID from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Full hyphenated form, as stored in audit records
            pub fn key(&self) -> String {
                self.0.to_string()
            }

            /// Parse an ID from a string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl RecordId for $name {
            fn generate() -> Self {
                Self::new()
            }

            fn is_pending(&self) -> bool {
                $name::is_pending(self)
            }

            fn key(&self) -> String {
                $name::key(self)
            }

            fn from_key(key: &str) -> Option<Self> {
                Uuid::parse_str(key).ok().map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.to_string()[..8])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if let Ok(uuid) = Uuid::parse_str(s) {
                    return Ok(Self(uuid));
                }
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(AccountId, "acc-");
define_id!(ReceiptId, "rcp-");
define_id!(ReceiptItemId, "itm-");
define_id!(TransactionId, "txn-");
define_id!(AuditLogId, "aud-");
define_id!(ApiKeyId, "key-");
