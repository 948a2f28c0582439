//! Random tokens for public playlist feeds and stored file names.

use rand::RngCore;

/// Number of random bytes behind every token.
pub const TOKEN_BYTES: usize = 20;

/// Generate a lowercase hexadecimal token from the thread-local CSPRNG.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0_u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether `value` has the shape of a generated token (non-empty ASCII
/// alphanumerics, so it is safe to use as a file name).
#[must_use]
pub fn is_valid_token(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn tokens_are_hex_encoded() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(is_valid_token(&token));
    }

    #[rstest]
    fn tokens_differ() {
        assert_ne!(generate_token(), generate_token());
    }

    #[rstest]
    #[case("", false)]
    #[case("../etc/passwd", false)]
    #[case("abc123", true)]
    fn validates_token_shape(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_valid_token(value), valid);
    }
}
