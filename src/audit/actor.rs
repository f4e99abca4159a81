//! Actor context
//!
//! Identity and network metadata of whoever initiated a write. The context
//! is a plain value handed to `UnitOfWork::commit`; providers exist only to
//! produce that value at the edge (CLI, request handlers).

use tracing::warn;

use crate::models::ApiKeyId;

/// Who is writing, captured once per commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: Option<String>,
    pub api_key_id: Option<ApiKeyId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ActorContext {
    /// System or anonymous writes: every field null
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn api_key(api_key_id: ApiKeyId) -> Self {
        Self {
            api_key_id: Some(api_key_id),
            ..Self::default()
        }
    }

    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Source of the current actor for the in-flight request
pub trait ActorContextProvider {
    fn current(&self) -> ActorContext;
}

impl ActorContextProvider for ActorContext {
    fn current(&self) -> ActorContext {
        self.clone()
    }
}

/// Provider that always reports an all-null actor
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousActor;

impl ActorContextProvider for AnonymousActor {
    fn current(&self) -> ActorContext {
        ActorContext::anonymous()
    }
}

/// Reads the actor from `RECEIPTS_USER_ID`, `RECEIPTS_API_KEY_ID`,
/// `RECEIPTS_IP_ADDRESS` and `RECEIPTS_USER_AGENT`
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvActorProvider;

impl EnvActorProvider {
    pub const USER_ID_VAR: &'static str = "RECEIPTS_USER_ID";
    pub const API_KEY_ID_VAR: &'static str = "RECEIPTS_API_KEY_ID";
    pub const IP_ADDRESS_VAR: &'static str = "RECEIPTS_IP_ADDRESS";
    pub const USER_AGENT_VAR: &'static str = "RECEIPTS_USER_AGENT";

    fn var(name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl ActorContextProvider for EnvActorProvider {
    fn current(&self) -> ActorContext {
        let api_key_id = Self::var(Self::API_KEY_ID_VAR).and_then(|raw| match raw.parse() {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(value = %raw, error = %e, "Ignoring malformed API key id");
                None
            }
        });

        ActorContext {
            user_id: Self::var(Self::USER_ID_VAR),
            api_key_id,
            ip_address: Self::var(Self::IP_ADDRESS_VAR),
            user_agent: Self::var(Self::USER_AGENT_VAR),
        }
    }
}
