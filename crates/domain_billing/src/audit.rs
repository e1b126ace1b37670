//! Audit trail for manual payment plan edits
//!
//! Every admin create, edit or delete of an installment appends one entry.
//! Automatic status changes made by reconciliation are not audited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use core_kernel::{AuditEntryId, InstallmentId, UserId};

use crate::error::PaymentPlanError;
use crate::installment::{Installment, InstallmentRevision};

/// The kind of manual change recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Add,
    Edit,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Add => "add",
            AuditAction::Edit => "edit",
            AuditAction::Delete => "delete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = PaymentPlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(AuditAction::Add),
            "edit" => Ok(AuditAction::Edit),
            "delete" => Ok(AuditAction::Delete),
            other => Err(PaymentPlanError::validation(
                "action",
                format!("unknown audit action '{}'", other),
            )),
        }
    }
}

/// An audit entry waiting to be written
///
/// `before` is absent for additions and `after` is absent for deletions.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub installment_id: InstallmentId,
    pub actor: UserId,
    pub action: AuditAction,
    pub timestamp: DateTime<Utc>,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl NewAuditEntry {
    pub fn added(installment: &Installment, actor: UserId, at: DateTime<Utc>) -> Self {
        Self {
            installment_id: installment.id,
            actor,
            action: AuditAction::Add,
            timestamp: at,
            before: None,
            after: Some(installment.snapshot()),
        }
    }

    pub fn edited(revision: &InstallmentRevision, actor: UserId, at: DateTime<Utc>) -> Self {
        Self {
            installment_id: revision.after.id,
            actor,
            action: AuditAction::Edit,
            timestamp: at,
            before: Some(revision.before.snapshot()),
            after: Some(revision.after.snapshot()),
        }
    }

    pub fn deleted(installment: &Installment, actor: UserId, at: DateTime<Utc>) -> Self {
        Self {
            installment_id: installment.id,
            actor,
            action: AuditAction::Delete,
            timestamp: at,
            before: Some(installment.snapshot()),
            after: None,
        }
    }

    /// Attaches the id assigned by storage
    pub fn into_entry(self, id: AuditEntryId) -> AuditLogEntry {
        AuditLogEntry {
            id,
            installment_id: self.installment_id,
            actor: self.actor,
            action: self.action,
            timestamp: self.timestamp,
            before: self.before,
            after: self.after,
        }
    }
}

/// A stored audit entry. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: AuditEntryId,
    pub installment_id: InstallmentId,
    pub actor: UserId,
    pub action: AuditAction,
    pub timestamp: DateTime<Utc>,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// An audit entry joined with the acting user's contact details
///
/// The user fields are empty when the user row no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogView {
    pub id: AuditEntryId,
    pub action: AuditAction,
    pub timestamp: DateTime<Utc>,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}
