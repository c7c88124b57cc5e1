//! Cent and basis-point arithmetic.
//!
//! All money is handled as `i64` cents and all rates as `i32` basis points
//! (10_000 bp = 100%), so commission math never touches floating point.

/// 100% expressed in basis points.
pub const FULL_RATE_BPS: i32 = 10_000;

/// Largest amount accepted for a configured price, fee, bonus or threshold
/// ($10 billion). Keeps per-period sums far away from `i64::MAX`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Apply a basis-point rate to an amount in cents, rounding half away from zero.
///
/// Intermediate math runs in `i128` so large sales totals cannot overflow.
///
/// ```text
/// apply_rate(10_000, 1_250) == 1_250   // 12.5% of $100.00
/// apply_rate(333, 5_000)    == 167     // 50% of $3.33, rounded up
/// ```
pub fn apply_rate(amount_cents: i64, rate_bps: i32) -> i64 {
    let product = amount_cents as i128 * rate_bps as i128;
    let denom = FULL_RATE_BPS as i128;
    let half = denom / 2;

    let rounded = if product >= 0 {
        (product + half) / denom
    } else {
        (product - half) / denom
    };

    rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Value of one session out of a package, in cents.
///
/// Uses integer division; the remainder stays with the studio.
pub fn per_session_value(price_cents: i64, total_sessions: i32) -> i64 {
    if total_sessions <= 0 {
        return 0;
    }
    price_cents / total_sessions as i64
}
