//! Reconciliation properties checked with the shared generators and assertions

use proptest::prelude::*;
use std::sync::Arc;

use core_kernel::{FixedClock, MinorUnits};
use domain_billing::ports::mock::RecordingNotifier;
use domain_billing::{plan_reconciliation, Installment, InstallmentStatus, ReconciliationEngine};
use test_utils::*;

fn apply(schedule: &[Installment], plan: &domain_billing::ReconciliationPlan) -> Vec<Installment> {
    schedule
        .iter()
        .map(|installment| {
            let mut next = installment.clone();
            if let Some(t) = plan.transitions.iter().find(|t| t.installment_id == installment.id) {
                next.status = t.to;
            }
            next
        })
        .collect()
}

proptest! {
    #[test]
    fn test_rising_schedules_fund_a_prefix(
        schedule in rising_schedule_strategy(10),
        payments in payments_strategy(6),
    ) {
        let now = TemporalFixtures::now();
        let plan = plan_reconciliation(&schedule, &payments, now);
        let after = apply(&schedule, &plan);

        assert_paid_prefix(&after);
        assert_overdue_precedence(&after, now);
    }

    #[test]
    fn test_unpaid_schedules_leave_no_coverable_installment(
        schedule in unpaid_schedule_strategy(10),
        payments in payments_strategy(6),
    ) {
        let now = TemporalFixtures::now();
        let plan = plan_reconciliation(&schedule, &payments, now);
        let after = apply(&schedule, &plan);

        assert_overdue_precedence(&after, now);
        for installment in after.iter().filter(|i| !i.status.is_paid()) {
            prop_assert!(plan.unapplied < installment.amount);
        }
    }

    #[test]
    fn test_paid_stays_paid_in_any_schedule(
        schedule in schedule_strategy(10),
        payments in payments_strategy(6),
    ) {
        let plan = plan_reconciliation(&schedule, &payments, TemporalFixtures::now());
        for transition in &plan.transitions {
            prop_assert_ne!(transition.from, InstallmentStatus::Paid);
        }
    }

    #[test]
    fn test_unapplied_never_exceeds_pool(
        schedule in schedule_strategy(10),
        payments in payments_strategy(6),
    ) {
        let pool: MinorUnits = payments.iter().map(|p| p.amount).sum();
        let plan = plan_reconciliation(&schedule, &payments, TemporalFixtures::now());
        prop_assert!(plan.unapplied <= pool);
    }
}

#[tokio::test]
async fn test_scenario_through_engine() {
    let seeded = LedgerScenario::new()
        .installment(TemporalFixtures::jan(10), 5000)
        .installment(TemporalFixtures::jan(20), 5000)
        .payment(5000, TemporalFixtures::jan(5))
        .seed()
        .await;
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = ReconciliationEngine::new(
        seeded.ledger.clone(),
        notifier.clone(),
        Arc::new(FixedClock::new(TemporalFixtures::jan(25))),
    );

    engine.reconcile(seeded.invoice_id).await.unwrap();

    assert_eq!(
        seeded.statuses().await,
        vec![InstallmentStatus::Paid, InstallmentStatus::Overdue]
    );
    assert_single_notice(
        &notifier.sent().await,
        domain_billing::NotificationEvent::Overdue,
        "accounts@globex.test",
    );
}
