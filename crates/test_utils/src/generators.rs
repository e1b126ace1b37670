//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating schedules and payments
//! that respect the domain's invariants (positive amounts, one invoice).

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;

use core_kernel::{Currency, InstallmentId, MinorUnits, Money};
use domain_billing::{Installment, InstallmentStatus, Payment};

use crate::builders::payment;
use crate::fixtures::{IdFixtures, TemporalFixtures};

/// Strategy for generating supported Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::JPY),
    ]
}

/// Strategy for generating valid positive amounts in minor units
pub fn positive_amount_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000i64
}

/// Strategy for generating Money with positive amounts
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

pub fn status_strategy() -> impl Strategy<Value = InstallmentStatus> {
    prop_oneof![
        Just(InstallmentStatus::Pending),
        Just(InstallmentStatus::Paid),
        Just(InstallmentStatus::Overdue),
    ]
}

/// A due date within 60 days either side of the fixture "now"
pub fn due_date_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (-60i64..60i64).prop_map(|days| TemporalFixtures::now() + Duration::days(days))
}

/// Up to `max` unpaid installments with distinct ids
pub fn unpaid_schedule_strategy(max: usize) -> impl Strategy<Value = Vec<Installment>> {
    prop::collection::vec((due_date_strategy(), 1i64..20_000i64), 0..=max).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (due_date, amount))| Installment {
                id: InstallmentId::new(i as i64 + 1),
                invoice_id: IdFixtures::invoice_id(),
                due_date,
                amount: MinorUnits::new(amount),
                status: InstallmentStatus::Pending,
            })
            .collect()
    })
}

/// Unpaid installments whose amounts never shrink along the due-date order
///
/// On such schedules the paid installments always form a prefix.
pub fn rising_schedule_strategy(max: usize) -> impl Strategy<Value = Vec<Installment>> {
    unpaid_schedule_strategy(max).prop_map(|mut schedule| {
        schedule.sort_by_key(|i| (i.due_date, i.id));
        let mut amounts: Vec<MinorUnits> = schedule.iter().map(|i| i.amount).collect();
        amounts.sort();
        for (installment, amount) in schedule.iter_mut().zip(amounts) {
            installment.amount = amount;
        }
        schedule
    })
}

/// Up to `max` installments in any stored status
pub fn schedule_strategy(max: usize) -> impl Strategy<Value = Vec<Installment>> {
    (unpaid_schedule_strategy(max), prop::collection::vec(status_strategy(), max)).prop_map(
        |(mut schedule, statuses)| {
            for (installment, status) in schedule.iter_mut().zip(statuses) {
                installment.status = status;
            }
            schedule
        },
    )
}

/// Up to `max` payments against the fixture invoice
pub fn payments_strategy(max: usize) -> impl Strategy<Value = Vec<Payment>> {
    prop::collection::vec((1i64..30_000i64, -30i64..0i64), 0..=max).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (amount, days))| {
                payment(i as i64 + 1, amount, TemporalFixtures::now() + Duration::days(days))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_generated_amounts_are_positive(schedule in unpaid_schedule_strategy(8), payments in payments_strategy(5)) {
            prop_assert!(schedule.iter().all(|i| i.amount.is_positive()));
            prop_assert!(payments.iter().all(|p| p.amount.is_positive()));
        }

        #[test]
        fn test_money_strategy_is_positive(money in positive_money_strategy()) {
            prop_assert!(money.amount().is_positive());
        }
    }
}
