//! Password hashing with bcrypt.

use crate::ResultEngine;

/// Cost used when the builder is not told otherwise.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;
/// Cheapest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;

pub(crate) fn hash(password: &str, cost: u32) -> ResultEngine<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// `false` for a wrong password and for a stored value that is not a bcrypt
/// hash.
pub(crate) fn verify(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash("rahasia", MIN_COST).unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(verify("rahasia", &hashed));
        assert!(!verify("salah", &hashed));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify("rahasia", "rahasia"));
    }
}
