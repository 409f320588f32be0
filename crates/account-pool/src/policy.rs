//! Demand sizing for replenishment

/// Fabrications needed to bring `available` budget back to `capacity`,
/// assuming each new account arrives with `per_account` requests.
///
/// Ceil division over the deficit; zero when the pool is at or above
/// capacity. `per_account` is validated positive by configuration.
pub(crate) fn accounts_to_request(capacity: u32, available: i64, per_account: u32) -> i64 {
    let deficit = i64::from(capacity) - available;
    if deficit <= 0 {
        return 0;
    }
    let per_account = i64::from(per_account);
    (deficit + per_account - 1) / per_account
}
