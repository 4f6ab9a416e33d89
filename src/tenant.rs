//! Tenant Membership
//!
//! Session resolution and the membership lookup live outside this crate; the
//! lifecycle handlers receive an already-resolved [`Caller`]. The role check
//! itself is part of the lifecycle contract.

use crate::error::{Result, ZapgateError};
use serde::{Deserialize, Serialize};

/// Role of a user inside one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Manager,
    Agent,
}

/// An authenticated caller acting within one organization.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub org_id: String,
    pub role: MemberRole,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, org_id: impl Into<String>, role: MemberRole) -> Self {
        Self {
            user_id: user_id.into(),
            org_id: org_id.into(),
            role,
        }
    }

    /// Gate for destructive instance operations (disconnect, delete).
    pub fn require_manager(&self) -> Result<()> {
        match self.role {
            MemberRole::Owner | MemberRole::Manager => Ok(()),
            MemberRole::Agent => Err(ZapgateError::Forbidden),
        }
    }
}

/// Resolve an optional session into a caller, `Unauthorized` when absent.
pub fn require_session(caller: Option<&Caller>) -> Result<&Caller> {
    caller.ok_or(ZapgateError::Unauthorized)
}
