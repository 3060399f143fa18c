//! Property-based and unit tests for event to delta derivation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::ledger::{EntryStatus, TransactionEvent, TransactionKind};
use crate::stats::delta::{EventDiscard, EventEffect, deltas_for};
use crate::stats::key::StatisticKey;

fn event(kind: TransactionKind, amount: Decimal) -> TransactionEvent {
    TransactionEvent {
        id: Uuid::new_v4(),
        property_id: Some(Uuid::new_v4()),
        kind: Some(kind),
        status: EntryStatus::Accepted,
        amount,
        date: NaiveDate::from_ymd_opt(2023, 6, 15).unwrap(),
        income_category_id: None,
    }
}

fn amount_of(deltas: &crate::stats::delta::EventDeltas, key: StatisticKey) -> Option<Decimal> {
    deltas
        .deltas
        .iter()
        .find(|d| d.key == key)
        .map(|d| d.amount)
}

// ============================================================================
// Sign table
// ============================================================================

#[test]
fn test_income_adds_amount_to_income_and_balance() {
    let deltas = deltas_for(&event(TransactionKind::Income, dec!(249)), EventEffect::Apply, None)
        .unwrap();

    assert_eq!(amount_of(&deltas, StatisticKey::Income), Some(dec!(249)));
    assert_eq!(amount_of(&deltas, StatisticKey::Balance), Some(dec!(249)));
    assert_eq!(deltas.deltas.len(), 2);
}

#[test]
fn test_expense_stores_positive_magnitude() {
    // Ledger expense amounts arrive negative; the EXPENSE cell accumulates
    // the magnitude while BALANCE keeps the signed cash effect.
    let deltas = deltas_for(
        &event(TransactionKind::Expense, dec!(-80.50)),
        EventEffect::Apply,
        None,
    )
    .unwrap();

    assert_eq!(amount_of(&deltas, StatisticKey::Expense), Some(dec!(80.50)));
    assert_eq!(amount_of(&deltas, StatisticKey::Balance), Some(dec!(-80.50)));
}

#[test]
fn test_deposit_adds_signed_amount() {
    let deltas = deltas_for(
        &event(TransactionKind::Deposit, dec!(1000)),
        EventEffect::Apply,
        None,
    )
    .unwrap();

    assert_eq!(amount_of(&deltas, StatisticKey::Deposit), Some(dec!(1000)));
    assert_eq!(amount_of(&deltas, StatisticKey::Balance), Some(dec!(1000)));
}

#[test]
fn test_withdraw_negates_ledger_amount() {
    // A withdrawal is stored negative in the ledger; the WITHDRAW cell gets
    // the negation, yielding a positive stored value.
    let deltas = deltas_for(
        &event(TransactionKind::Withdraw, dec!(-300)),
        EventEffect::Apply,
        None,
    )
    .unwrap();

    assert_eq!(amount_of(&deltas, StatisticKey::Withdraw), Some(dec!(300)));
    assert_eq!(amount_of(&deltas, StatisticKey::Balance), Some(dec!(-300)));
}

// ============================================================================
// Rental visits counter
// ============================================================================

#[test]
fn test_rental_income_counts_one_visit() {
    let rental = Uuid::new_v4();
    let mut ev = event(TransactionKind::Income, dec!(120));
    ev.income_category_id = Some(rental);

    let deltas = deltas_for(&ev, EventEffect::Apply, Some(rental)).unwrap();

    assert_eq!(
        amount_of(&deltas, StatisticKey::RentalVisits),
        Some(Decimal::ONE)
    );
}

#[test]
fn test_other_income_category_counts_no_visit() {
    let rental = Uuid::new_v4();
    let mut ev = event(TransactionKind::Income, dec!(120));
    ev.income_category_id = Some(Uuid::new_v4());

    let deltas = deltas_for(&ev, EventEffect::Apply, Some(rental)).unwrap();

    assert_eq!(amount_of(&deltas, StatisticKey::RentalVisits), None);
}

#[test]
fn test_no_designated_category_disables_visit_counting() {
    let mut ev = event(TransactionKind::Income, dec!(120));
    ev.income_category_id = Some(Uuid::new_v4());

    let deltas = deltas_for(&ev, EventEffect::Apply, None).unwrap();

    assert_eq!(amount_of(&deltas, StatisticKey::RentalVisits), None);
}

#[test]
fn test_rental_category_on_non_income_counts_no_visit() {
    let rental = Uuid::new_v4();
    let mut ev = event(TransactionKind::Deposit, dec!(120));
    ev.income_category_id = Some(rental);

    let deltas = deltas_for(&ev, EventEffect::Apply, Some(rental)).unwrap();

    assert_eq!(amount_of(&deltas, StatisticKey::RentalVisits), None);
}

// ============================================================================
// Discards
// ============================================================================

#[test]
fn test_pending_and_rejected_events_are_discarded() {
    for status in [EntryStatus::Pending, EntryStatus::Rejected] {
        let mut ev = event(TransactionKind::Income, dec!(10));
        ev.status = status;

        assert_eq!(
            deltas_for(&ev, EventEffect::Apply, None),
            Err(EventDiscard::NotAccepted(status))
        );
    }
}

#[test]
fn test_missing_property_is_discarded() {
    let mut ev = event(TransactionKind::Income, dec!(10));
    ev.property_id = None;

    assert_eq!(
        deltas_for(&ev, EventEffect::Apply, None),
        Err(EventDiscard::MissingProperty)
    );
}

#[test]
fn test_unknown_kind_is_discarded() {
    let mut ev = event(TransactionKind::Income, dec!(10));
    ev.kind = None;

    assert_eq!(
        deltas_for(&ev, EventEffect::Apply, None),
        Err(EventDiscard::UnknownKind)
    );
}

// ============================================================================
// Properties
// ============================================================================

/// Strategy for generating signed decimal amounts
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for generating transaction kinds
fn kind_strategy() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![
        Just(TransactionKind::Income),
        Just(TransactionKind::Expense),
        Just(TransactionKind::Deposit),
        Just(TransactionKind::Withdraw),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Revert is the exact negation of apply, delta for delta, so a created
    /// transaction followed by its deletion nets to zero on every cell.
    #[test]
    fn prop_revert_negates_apply(
        kind in kind_strategy(),
        amount in amount_strategy(),
        rental in proptest::bool::ANY,
    ) {
        let rental_id = Uuid::new_v4();
        let mut ev = event(kind, amount);
        if rental {
            ev.income_category_id = Some(rental_id);
        }

        let applied = deltas_for(&ev, EventEffect::Apply, Some(rental_id)).unwrap();
        let reverted = deltas_for(&ev, EventEffect::Revert, Some(rental_id)).unwrap();

        prop_assert_eq!(applied.deltas.len(), reverted.deltas.len());
        for (a, r) in applied.deltas.iter().zip(reverted.deltas.iter()) {
            prop_assert_eq!(a.key, r.key);
            prop_assert_eq!(a.amount, -r.amount);
        }
    }

    /// Every accepted event adjusts BALANCE by its signed ledger amount.
    #[test]
    fn prop_balance_always_gets_signed_amount(
        kind in kind_strategy(),
        amount in amount_strategy(),
    ) {
        let deltas = deltas_for(&event(kind, amount), EventEffect::Apply, None).unwrap();

        prop_assert_eq!(amount_of(&deltas, StatisticKey::Balance), Some(amount));
    }

    /// The per-kind counter cell never goes negative for expense, and for
    /// withdraw it mirrors the negated ledger amount.
    #[test]
    fn prop_expense_magnitude_never_negative(amount in amount_strategy()) {
        let deltas = deltas_for(
            &event(TransactionKind::Expense, amount),
            EventEffect::Apply,
            None,
        )
        .unwrap();

        let expense = amount_of(&deltas, StatisticKey::Expense).unwrap();
        prop_assert!(expense >= Decimal::ZERO);
        prop_assert_eq!(expense, amount.abs());
    }

    /// Exactly one counter delta plus one balance delta per non-rental event.
    #[test]
    fn prop_delta_count_is_stable(
        kind in kind_strategy(),
        amount in amount_strategy(),
    ) {
        let deltas = deltas_for(&event(kind, amount), EventEffect::Apply, None).unwrap();
        prop_assert_eq!(deltas.deltas.len(), 2);
    }

    /// Non-accepted events never aggregate, whatever the payload.
    #[test]
    fn prop_non_accepted_always_discarded(
        kind in kind_strategy(),
        amount in amount_strategy(),
        pending in proptest::bool::ANY,
    ) {
        let mut ev = event(kind, amount);
        ev.status = if pending {
            EntryStatus::Pending
        } else {
            EntryStatus::Rejected
        };

        prop_assert!(deltas_for(&ev, EventEffect::Apply, None).is_err());
    }
}
