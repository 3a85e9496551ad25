//! Row identity tokens.

use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::value::Value;

/// Length of a row token in hex characters.
pub const TOKEN_LEN: usize = 8;

/// Hashes an ordered row into a short printable token.
///
/// The token is the first [`TOKEN_LEN`] hex characters of the SHA-256 digest
/// of the row's JSON array text. Bytes hash like the equivalent text. Rows
/// with identical values share a token, and distinct rows may collide.
#[must_use]
pub fn row_token(row: &[Value]) -> String {
    let printed = JsonValue::Array(row.iter().map(Value::to_json).collect()).to_string();

    let mut hasher = Sha256::new();
    hasher.update(printed.as_bytes());
    let mut token = hex::encode(hasher.finalize());
    token.truncate(TOKEN_LEN);
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_deterministic() {
        let row = vec![Value::Int(1), Value::from("ann"), Value::Null];
        let token = row_token(&row);
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token, row_token(&row.clone()));
    }

    #[test]
    fn test_order_matters() {
        let a = vec![Value::from("x"), Value::from("y")];
        let b = vec![Value::from("y"), Value::from("x")];
        assert_ne!(row_token(&a), row_token(&b));
    }

    #[test]
    fn test_bytes_hash_like_text() {
        let text = vec![Value::from("abc")];
        let bytes = vec![Value::Bytes(b"abc".to_vec())];
        assert_eq!(row_token(&text), row_token(&bytes));
    }

    #[test]
    fn test_type_is_part_of_identity() {
        assert_ne!(
            row_token(&[Value::Int(1)]),
            row_token(&[Value::from("1")])
        );
    }
}
