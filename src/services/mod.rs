pub mod automation;
pub mod bins;
pub mod boms;
pub mod dispatches;
pub mod reconciliation;
pub mod sales_orders;
pub mod status_poll;

use sha2::{Digest, Sha256};

/// Deterministic idempotency key for an external posting: a hash of the
/// record identity and its attempt counter, so a retried posting carries a
/// distinct key while an in-flight duplicate carries the same one.
pub(crate) fn posting_idempotency_key(kind: &str, id: &str, attempt: i32) -> String {
    let digest = Sha256::digest(format!("{}:{}:{}", kind, id, attempt).as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::posting_idempotency_key;

    #[test]
    fn idempotency_key_is_stable_per_attempt() {
        let a = posting_idempotency_key("bin", "abc", 1);
        let b = posting_idempotency_key("bin", "abc", 1);
        let c = posting_idempotency_key("bin", "abc", 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
