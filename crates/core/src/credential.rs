use rand::Rng;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random alphanumeric password.
///
/// The credential crosses the boundary exactly once: it is handed to the
/// directory and delivered to the user in the confirmation message, never
/// stored.
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{generate_password, CHARSET};

    #[test]
    fn password_has_requested_length() {
        assert_eq!(generate_password(12).len(), 12);
        assert_eq!(generate_password(32).len(), 32);
    }

    #[test]
    fn password_only_uses_charset_characters() {
        let password = generate_password(64);
        assert!(password.bytes().all(|byte| CHARSET.contains(&byte)));
    }

    #[test]
    fn consecutive_passwords_differ() {
        // Collision odds at 24 alphanumeric characters are negligible.
        assert_ne!(generate_password(24), generate_password(24));
    }
}
