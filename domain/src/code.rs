//! Public meeting codes.
//!
//! A code is two random 13 character base-36 fragments glued together. No
//! uniqueness check is made against existing meetings; the insert fails on
//! the unique index in the astronomically unlikely case of a collision.

use rand::Rng;

pub const FRAGMENT_LENGTH: usize = 13;
pub const MEETING_CODE_LENGTH: usize = FRAGMENT_LENGTH * 2;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn generate_meeting_code() -> String {
    let mut rng = rand::thread_rng();
    (0..MEETING_CODE_LENGTH)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// True for exactly [`MEETING_CODE_LENGTH`] lowercase ASCII letters or digits.
pub fn is_valid_meeting_code(code: &str) -> bool {
    code.len() == MEETING_CODE_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_always_match_the_pattern() {
        for _ in 0..1_000 {
            let code = generate_meeting_code();
            assert!(is_valid_meeting_code(&code), "malformed code {code}");
        }
    }

    #[test]
    fn generated_codes_differ() {
        assert_ne!(generate_meeting_code(), generate_meeting_code());
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(!is_valid_meeting_code(""));
        assert!(!is_valid_meeting_code("abc"));
        assert!(!is_valid_meeting_code("ABCDEFGHIJKLMNOPQRSTUVWXYZ"));
        assert!(!is_valid_meeting_code("abcdefghijklm/nopqrstuvwxy"));
        assert!(is_valid_meeting_code("demo0meeting0code000000000"));
    }
}
