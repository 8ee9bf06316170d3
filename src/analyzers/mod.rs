pub mod authors;
pub mod collaboration;
pub mod files;
pub mod temporal;

/// Sums line counts without overflowing; one absurd record pins at `u64::MAX`.
pub(crate) fn saturating_sum<I: IntoIterator<Item = u64>>(values: I) -> u64 {
    values.into_iter().fold(0, u64::saturating_add)
}

/// Rounds to `places` decimals so serialized scores stay stable and readable.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
