//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing within the same millisecond
    /// - Shorter than UUIDs when represented as strings
    ///
    /// Sortability matters here: activity-log ids double as the
    /// insertion-order tiebreak for same-instant entries.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a cryptographically secure random token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Use UUID v4 for tokens (no time component for security)
        Uuid::new_v4().simple().to_string()
    }

    /// Generate a transaction reference for a payment.
    ///
    /// Embeds a user-id prefix, an assignment-id prefix and a millisecond
    /// timestamp so operators can trace a provider checkout back to its
    /// local records by eye. A short random suffix keeps two calls within
    /// the same millisecond distinct.
    #[must_use]
    pub fn generate_transaction_reference(&self, user_id: &str, assignment_id: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let nonce = ulid::Ulid::new().to_string().to_lowercase();
        format!(
            "ACA-{}-{}-{millis}-{}",
            &user_id[..user_id.len().min(8)],
            &assignment_id[..assignment_id.len().min(8)],
            &nonce[nonce.len() - 6..],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
        // Note: ULIDs generated rapidly within the same millisecond
        // may not be strictly ordered due to the random component
    }

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();

        assert_eq!(token.len(), 32); // Simple UUID without hyphens
    }

    #[test]
    fn test_transaction_reference_shape() {
        let id_gen = IdGenerator::new();
        let tx_ref =
            id_gen.generate_transaction_reference("01hq3vxyzabcdefg", "01hq3w0123456789");

        assert!(tx_ref.starts_with("ACA-01hq3vxy-01hq3w01-"));
        let parts: Vec<&str> = tx_ref.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert!(parts[3].parse::<i64>().is_ok());
        assert_eq!(parts[4].len(), 6);
    }

    #[test]
    fn test_transaction_reference_unique_per_call() {
        let id_gen = IdGenerator::new();
        let a = id_gen.generate_transaction_reference("user", "assignment");
        let b = id_gen.generate_transaction_reference("user", "assignment");
        assert_ne!(a, b);
    }

    #[test]
    fn test_transaction_reference_short_ids() {
        let id_gen = IdGenerator::new();
        // Ids shorter than the 8-char prefix must not panic
        let tx_ref = id_gen.generate_transaction_reference("u1", "a1");
        assert!(tx_ref.starts_with("ACA-u1-a1-"));
    }
}
