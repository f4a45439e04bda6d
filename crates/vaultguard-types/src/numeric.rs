//! Numeric Guard: overflow/underflow-checked `u64` arithmetic.
//!
//! Every balance mutation under the secure policy goes through these
//! functions. They are pure; a failure leaves the caller's value untouched
//! because nothing is written until the result is known.

use crate::{GuardError, Result};

/// `a + b`, or [`GuardError::ArithmeticOverflow`] if it exceeds `u64::MAX`.
pub fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b)
        .ok_or(GuardError::ArithmeticOverflow { lhs: a, rhs: b })
}

/// `a - b`, or [`GuardError::ArithmeticUnderflow`] if `b > a`.
pub fn checked_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b)
        .ok_or(GuardError::ArithmeticUnderflow { lhs: a, rhs: b })
}

/// `a * b`, or [`GuardError::ArithmeticOverflow`] if it exceeds `u64::MAX`.
pub fn checked_mul(a: u64, b: u64) -> Result<u64> {
    a.checked_mul(b)
        .ok_or(GuardError::ArithmeticOverflow { lhs: a, rhs: b })
}

/// Sum an iterator of balances without wrapping.
pub fn checked_sum<I: IntoIterator<Item = u64>>(values: I) -> Result<u64> {
    values.into_iter().try_fold(0u64, checked_add)
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn add_within_range() {
        assert_eq!(checked_add(40, 2).unwrap(), 42);
        assert_eq!(checked_add(u64::MAX - 1, 1).unwrap(), u64::MAX);
    }

    #[test]
    fn add_overflow_reports_operands() {
        let err = checked_add(u64::MAX, 1).unwrap_err();
        assert_eq!(err, GuardError::ArithmeticOverflow { lhs: u64::MAX, rhs: 1 });
    }

    #[test]
    fn sub_underflow_from_zero() {
        let err = checked_sub(0, 1).unwrap_err();
        assert_eq!(err, GuardError::ArithmeticUnderflow { lhs: 0, rhs: 1 });
        assert_eq!(checked_sub(5, 5).unwrap(), 0);
    }

    #[test]
    fn mul_overflow() {
        assert_eq!(checked_mul(10, 100).unwrap(), 1000);
        assert!(matches!(
            checked_mul(u64::MAX / 2 + 1, 2),
            Err(GuardError::ArithmeticOverflow { .. })
        ));
        assert_eq!(checked_mul(u64::MAX, 0).unwrap(), 0);
    }

    #[test]
    fn sum_detects_overflow() {
        assert_eq!(checked_sum([1, 2, 3]).unwrap(), 6);
        assert!(checked_sum([u64::MAX, 1]).is_err());
        assert_eq!(checked_sum(std::iter::empty()).unwrap(), 0);
    }

    #[test]
    fn randomized_add_never_wraps() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let b = rng.gen_range(0..=u64::MAX);
            let d = rng.gen_range(0..=u64::MAX);
            match checked_add(b, d) {
                Ok(sum) => {
                    assert!(u128::from(b) + u128::from(d) <= u128::from(u64::MAX));
                    assert_eq!(u128::from(sum), u128::from(b) + u128::from(d));
                }
                Err(err) => {
                    assert!(u128::from(b) + u128::from(d) > u128::from(u64::MAX));
                    assert_eq!(err, GuardError::ArithmeticOverflow { lhs: b, rhs: d });
                }
            }
        }
    }

    #[test]
    fn randomized_sub_never_wraps() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let b = rng.gen_range(0..=u64::MAX);
            let d = rng.gen_range(0..=u64::MAX);
            match checked_sub(b, d) {
                Ok(diff) => {
                    assert!(d <= b);
                    assert_eq!(diff + d, b);
                }
                Err(err) => {
                    assert!(d > b);
                    assert_eq!(err, GuardError::ArithmeticUnderflow { lhs: b, rhs: d });
                }
            }
        }
    }
}
