//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for payment plan types that give
//! more meaningful error messages than standard assertions.

use chrono::{DateTime, Utc};

use core_kernel::UserId;
use domain_billing::{
    AuditAction, AuditLogEntry, Installment, InstallmentNotice, InstallmentStatus,
    NotificationEvent,
};

/// Asserts the statuses of a schedule, in order
pub fn assert_statuses(schedule: &[Installment], expected: &[InstallmentStatus]) {
    let actual: Vec<InstallmentStatus> = schedule.iter().map(|i| i.status).collect();
    assert_eq!(
        actual, expected,
        "Schedule statuses differ: actual={:?}, expected={:?}",
        actual, expected
    );
}

/// Asserts that paid installments form a prefix of the due-date ordering
///
/// Only meaningful for schedules where nothing was marked paid by hand and
/// amounts do not shrink along the due dates.
pub fn assert_paid_prefix(schedule: &[Installment]) {
    let mut ordered: Vec<&Installment> = schedule.iter().collect();
    ordered.sort_by_key(|i| (i.due_date, i.id));

    if let Some(first_unpaid) = ordered.iter().position(|i| !i.status.is_paid()) {
        let stray: Vec<_> = ordered[first_unpaid..]
            .iter()
            .filter(|i| i.status.is_paid())
            .map(|i| i.id)
            .collect();
        assert!(
            stray.is_empty(),
            "Installments {:?} are paid after an unpaid installment",
            stray
        );
    }
}

/// Asserts no unpaid installment past its due date is still pending
pub fn assert_overdue_precedence(schedule: &[Installment], now: DateTime<Utc>) {
    for installment in schedule {
        if installment.is_past_due(now) && !installment.status.is_paid() {
            assert_eq!(
                installment.status,
                InstallmentStatus::Overdue,
                "Installment {} is past due but {}",
                installment.id,
                installment.status
            );
        }
    }
}

/// Asserts an audit entry's action and actor, and that its before/after
/// snapshots are present exactly where the action requires them
pub fn assert_audit_entry(entry: &AuditLogEntry, action: AuditAction, actor: UserId) {
    assert_eq!(entry.action, action, "Unexpected audit action");
    assert_eq!(entry.actor, actor, "Unexpected audit actor");

    let (before, after) = match action {
        AuditAction::Add => (false, true),
        AuditAction::Edit => (true, true),
        AuditAction::Delete => (true, false),
    };
    assert_eq!(
        entry.before.is_some(),
        before,
        "{} entry before snapshot: {:?}",
        action,
        entry.before
    );
    assert_eq!(
        entry.after.is_some(),
        after,
        "{} entry after snapshot: {:?}",
        action,
        entry.after
    );
}

/// Asserts that exactly one notice of `event` was sent to `to`
pub fn assert_single_notice(sent: &[InstallmentNotice], event: NotificationEvent, to: &str) {
    let matching: Vec<_> = sent.iter().filter(|n| n.event == event).collect();
    assert_eq!(
        matching.len(),
        1,
        "Expected one {} notice, got {}: {:?}",
        event,
        matching.len(),
        sent
    );
    assert_eq!(matching[0].to, to, "Notice sent to the wrong recipient");
}
