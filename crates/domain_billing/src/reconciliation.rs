//! Installment reconciliation
//!
//! Recomputes installment statuses from the invoice's payment pool and the
//! current time, persists the changes and notifies the client about
//! installments that newly fall overdue.
//!
//! The pool is walked in due-date order and every installment the remaining
//! pool covers is funded, so a smaller installment later in the schedule can
//! still be paid after a larger one is skipped.
//!
//! Installments already marked paid stay paid. Their amount comes off the
//! pool only when the pool covers it; a row marked paid by hand with no
//! matching payment leaves the pool to the installments after it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument};

use core_kernel::{Clock, InstallmentId, InvoiceId, MinorUnits, PortError};

use crate::installment::{Installment, InstallmentStatus};
use crate::invoice::InvoiceWithClient;
use crate::notification::{notify_best_effort, InstallmentNotice, NotificationEvent};
use crate::payment::{payment_pool, Payment};
use crate::ports::{LedgerPort, NotificationPort};

/// A status change decided by reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransition {
    pub installment_id: InstallmentId,
    pub from: InstallmentStatus,
    pub to: InstallmentStatus,
}

/// Output of the pure planning step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconciliationPlan {
    /// Changes in schedule order. Unchanged installments are omitted.
    pub transitions: Vec<StatusTransition>,
    /// Pool left after funding. Not rolled forward anywhere.
    pub unapplied: MinorUnits,
}

/// Decides the status of every installment without touching storage
///
/// `installments` may arrive in any order; they are walked by due date,
/// with the identifier breaking ties.
pub fn plan_reconciliation(
    installments: &[Installment],
    payments: &[Payment],
    now: DateTime<Utc>,
) -> ReconciliationPlan {
    let mut schedule: Vec<&Installment> = installments.iter().collect();
    schedule.sort_by_key(|i| (i.due_date, i.id));

    let mut pool = payment_pool(payments);
    let mut transitions = Vec::new();

    for installment in schedule {
        let covered = pool >= installment.amount;
        if covered {
            pool = pool - installment.amount;
        }

        let candidate = if covered || installment.status.is_paid() {
            InstallmentStatus::Paid
        } else if installment.is_past_due(now) {
            InstallmentStatus::Overdue
        } else {
            InstallmentStatus::Pending
        };

        if candidate != installment.status {
            transitions.push(StatusTransition {
                installment_id: installment.id,
                from: installment.status,
                to: candidate,
            });
        }
    }

    ReconciliationPlan {
        transitions,
        unapplied: pool,
    }
}

/// What a reconciliation pass did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub invoice_id: InvoiceId,
    pub transitions: Vec<StatusTransition>,
    pub notices_sent: usize,
    pub unapplied: MinorUnits,
}

impl ReconciliationReport {
    fn unchanged(invoice_id: InvoiceId) -> Self {
        Self {
            invoice_id,
            transitions: Vec::new(),
            notices_sent: 0,
            unapplied: MinorUnits::ZERO,
        }
    }
}

/// Per-invoice async locks
///
/// Reconciliation passes over the same invoice run one at a time within a
/// process, so racing reads cannot both send the same overdue notice.
#[derive(Debug, Default)]
pub struct InvoiceLocks {
    locks: Mutex<HashMap<InvoiceId, Arc<tokio::sync::Mutex<()>>>>,
}

impl InvoiceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to an invoice
    pub async fn lock(&self, invoice_id: InvoiceId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Entries nobody else holds are stale.
            locks.retain(|id, lock| *id == invoice_id || Arc::strong_count(lock) > 1);
            locks.entry(invoice_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of invoices currently tracked
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Applies reconciliation plans to the ledger
pub struct ReconciliationEngine {
    ledger: Arc<dyn LedgerPort>,
    notifier: Arc<dyn NotificationPort>,
    clock: Arc<dyn Clock>,
    locks: InvoiceLocks,
}

impl ReconciliationEngine {
    pub fn new(
        ledger: Arc<dyn LedgerPort>,
        notifier: Arc<dyn NotificationPort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            notifier,
            clock,
            locks: InvoiceLocks::new(),
        }
    }

    /// Reconciles one invoice
    ///
    /// An invoice without installments is left alone. The first ledger
    /// failure aborts the pass; status writes made before it stay applied
    /// and the next pass picks up from there.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn reconcile(&self, invoice_id: InvoiceId) -> Result<ReconciliationReport, PortError> {
        let _guard = self.locks.lock(invoice_id).await;

        let installments = self.ledger.get_installments(invoice_id).await?;
        if installments.is_empty() {
            debug!("no installments to reconcile");
            return Ok(ReconciliationReport::unchanged(invoice_id));
        }

        let payments = self.ledger.get_payments(invoice_id).await?;
        let plan = plan_reconciliation(&installments, &payments, self.clock.now());
        debug!(
            installments = installments.len(),
            payments = payments.len(),
            transitions = plan.transitions.len(),
            unapplied = %plan.unapplied,
            "reconciliation planned"
        );

        let by_id: HashMap<InstallmentId, &Installment> =
            installments.iter().map(|i| (i.id, i)).collect();
        let mut invoice: Option<Option<InvoiceWithClient>> = None;
        let mut notices_sent = 0;

        for transition in &plan.transitions {
            self.ledger
                .save_installment_status(transition.installment_id, transition.to)
                .await?;
            info!(
                installment_id = %transition.installment_id,
                from = %transition.from,
                to = %transition.to,
                "installment status changed"
            );

            if transition.to != InstallmentStatus::Overdue {
                continue;
            }
            let Some(stored) = by_id.get(&transition.installment_id) else {
                continue;
            };

            if invoice.is_none() {
                invoice = Some(self.ledger.get_invoice_with_client(invoice_id).await?);
            }
            let Some(Some(invoice)) = invoice.as_ref() else {
                continue;
            };

            let overdue = Installment {
                status: InstallmentStatus::Overdue,
                ..(*stored).clone()
            };
            if let Some(notice) =
                InstallmentNotice::for_installment(NotificationEvent::Overdue, &overdue, invoice)
            {
                if notify_best_effort(self.notifier.as_ref(), &notice).await {
                    notices_sent += 1;
                }
            }
        }

        Ok(ReconciliationReport {
            invoice_id,
            transitions: plan.transitions,
            notices_sent,
            unapplied: plan.unapplied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_kernel::PaymentId;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()
    }

    fn installment(id: i64, due_offset_days: i64, amount: i64, status: InstallmentStatus) -> Installment {
        Installment {
            id: InstallmentId::new(id),
            invoice_id: InvoiceId::new(1),
            due_date: now() + Duration::days(due_offset_days),
            amount: MinorUnits::new(amount),
            status,
        }
    }

    fn payment(amount: i64) -> Payment {
        Payment {
            id: PaymentId::new(1),
            invoice_id: InvoiceId::new(1),
            amount: MinorUnits::new(amount),
            date: now(),
            method: None,
            note: None,
        }
    }

    #[test]
    fn test_pool_spent_in_due_date_order() {
        // Listed out of order on purpose.
        let schedule = vec![
            installment(2, 5, 5000, InstallmentStatus::Pending),
            installment(1, -9, 5000, InstallmentStatus::Pending),
        ];
        let plan = plan_reconciliation(&schedule, &[payment(5000)], now());

        assert_eq!(
            plan.transitions,
            vec![StatusTransition {
                installment_id: InstallmentId::new(1),
                from: InstallmentStatus::Pending,
                to: InstallmentStatus::Paid,
            }]
        );
        assert!(plan.unapplied.is_zero());
    }

    #[test]
    fn test_smaller_later_installment_funded_after_shortfall() {
        let schedule = vec![
            installment(1, -5, 3000, InstallmentStatus::Pending),
            installment(2, -3, 1000, InstallmentStatus::Pending),
        ];
        let plan = plan_reconciliation(&schedule, &[payment(2000)], now());

        assert_eq!(
            plan.transitions,
            vec![
                StatusTransition {
                    installment_id: InstallmentId::new(1),
                    from: InstallmentStatus::Pending,
                    to: InstallmentStatus::Overdue,
                },
                StatusTransition {
                    installment_id: InstallmentId::new(2),
                    from: InstallmentStatus::Pending,
                    to: InstallmentStatus::Paid,
                },
            ]
        );
        assert_eq!(plan.unapplied, MinorUnits::new(1000));
    }

    #[test]
    fn test_equal_due_dates_fund_lower_id_first() {
        let first = installment(1, -2, 4000, InstallmentStatus::Pending);
        let second = installment(2, -2, 4000, InstallmentStatus::Pending);
        assert_eq!(first.due_date, second.due_date);

        let plan = plan_reconciliation(&[second, first], &[payment(4000)], now());

        assert_eq!(
            plan.transitions,
            vec![
                StatusTransition {
                    installment_id: InstallmentId::new(1),
                    from: InstallmentStatus::Pending,
                    to: InstallmentStatus::Paid,
                },
                StatusTransition {
                    installment_id: InstallmentId::new(2),
                    from: InstallmentStatus::Pending,
                    to: InstallmentStatus::Overdue,
                },
            ]
        );
    }

    #[test]
    fn test_excess_pool_is_reported() {
        let schedule = vec![
            installment(1, -9, 5000, InstallmentStatus::Pending),
            installment(2, 5, 5000, InstallmentStatus::Pending),
        ];
        let plan = plan_reconciliation(&schedule, &[payment(12000)], now());

        assert_eq!(plan.transitions.len(), 2);
        assert_eq!(plan.unapplied, MinorUnits::new(2000));
    }

    #[test]
    fn test_paid_is_never_reverted() {
        let schedule = vec![installment(1, -30, 2500, InstallmentStatus::Paid)];
        let plan = plan_reconciliation(&schedule, &[], now());
        assert!(plan.transitions.is_empty());
    }

    #[test]
    fn test_paid_share_is_not_spent_twice() {
        let schedule = vec![
            installment(1, -9, 5000, InstallmentStatus::Paid),
            installment(2, 5, 5000, InstallmentStatus::Pending),
        ];
        let plan = plan_reconciliation(&schedule, &[payment(5000)], now());
        assert!(plan.transitions.is_empty());
    }

    #[test]
    fn test_uncovered_manual_paid_leaves_pool_to_later_installments() {
        let schedule = vec![
            installment(1, -9, 5000, InstallmentStatus::Paid),
            installment(2, 5, 3000, InstallmentStatus::Pending),
        ];
        let plan = plan_reconciliation(&schedule, &[payment(3000)], now());

        assert_eq!(
            plan.transitions,
            vec![StatusTransition {
                installment_id: InstallmentId::new(2),
                from: InstallmentStatus::Pending,
                to: InstallmentStatus::Paid,
            }]
        );
        assert!(plan.unapplied.is_zero());

        let mut after = schedule.clone();
        after[1].status = InstallmentStatus::Paid;
        assert!(plan_reconciliation(&after, &[payment(3000)], now()).transitions.is_empty());
    }

    #[test]
    fn test_overdue_recovers_when_pool_grows() {
        let schedule = vec![installment(1, -9, 5000, InstallmentStatus::Overdue)];
        let plan = plan_reconciliation(&schedule, &[payment(5000)], now());
        assert_eq!(plan.transitions[0].to, InstallmentStatus::Paid);
    }

    #[test]
    fn test_due_exactly_now_is_pending() {
        let mut row = installment(1, 0, 5000, InstallmentStatus::Overdue);
        row.due_date = now();
        let plan = plan_reconciliation(&[row], &[], now());
        assert_eq!(plan.transitions[0].to, InstallmentStatus::Pending);
    }

    #[tokio::test]
    async fn test_locks_are_pruned() {
        let locks = InvoiceLocks::new();
        {
            let _a = locks.lock(InvoiceId::new(1)).await;
        }
        let _b = locks.lock(InvoiceId::new(2)).await;
        assert_eq!(locks.tracked(), 1);
    }
}
