//! Unit tests for the statistic repository's pure helpers.

use proptest::prelude::*;
use sea_orm::DbErr;
use uuid::Uuid;

use crate::repositories::statistic::{is_transient, property_lock_key};

// ============================================================================
// Advisory lock key derivation
// ============================================================================

#[test]
fn test_lock_key_is_deterministic() {
    let property = Uuid::new_v4();
    assert_eq!(property_lock_key(property), property_lock_key(property));
}

#[test]
fn test_lock_key_differs_across_properties() {
    // Not guaranteed in general (the keyspace is 64 bits), but two fresh
    // random UUIDs colliding would indicate a broken fold.
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    assert_ne!(property_lock_key(a), property_lock_key(b));
}

#[test]
fn test_lock_key_of_nil_uuid_is_zero() {
    assert_eq!(property_lock_key(Uuid::nil()), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The fold uses every bit of the UUID: flipping any bit changes the key.
    #[test]
    fn prop_lock_key_sensitive_to_every_bit(bytes in proptest::array::uniform16(any::<u8>()), bit in 0usize..128) {
        let original = Uuid::from_bytes(bytes);

        let mut flipped = bytes;
        flipped[bit / 8] ^= 1u8 << (bit % 8);
        let mutated = Uuid::from_bytes(flipped);

        prop_assert_ne!(property_lock_key(original), property_lock_key(mutated));
    }
}

// ============================================================================
// Transient conflict classification
// ============================================================================

#[test]
fn test_serialization_failure_is_transient() {
    let err = DbErr::Custom(
        "Execution Error: error returned from database: 40001: could not serialize access due to concurrent update".into(),
    );
    assert!(is_transient(&err));
}

#[test]
fn test_deadlock_is_transient() {
    let err = DbErr::Custom("error returned from database: deadlock detected".into());
    assert!(is_transient(&err));
}

#[test]
fn test_other_errors_are_fatal() {
    assert!(!is_transient(&DbErr::Custom("connection refused".into())));
    assert!(!is_transient(&DbErr::Custom(
        "duplicate key value violates unique constraint".into()
    )));
}
