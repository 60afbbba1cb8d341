//! Avatar URLs derived from email addresses.

use sha2::{Digest, Sha256};

use super::email::Email;

/// Build a Gravatar URL for an email address.
///
/// Gravatar accepts the SHA-256 hex digest of the trimmed, lowercased
/// address; [`Email`] is already normalized that way. Unknown addresses fall
/// back to a generated "retro" avatar.
#[must_use]
pub fn avatar_url(email: &Email, size: u32) -> String {
    let digest = Sha256::digest(email.as_bytes());
    format!(
        "https://gravatar.com/avatar/{}?s={size}&d=retro",
        hex::encode(digest)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_url_shape() {
        let email = Email::parse("someone@example.com").unwrap();
        let url = avatar_url(&email, 200);
        assert!(url.starts_with("https://gravatar.com/avatar/"));
        assert!(url.ends_with("?s=200&d=retro"));
        let hash = url
            .trim_start_matches("https://gravatar.com/avatar/")
            .split('?')
            .next()
            .unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_avatar_url_ignores_case_and_whitespace() {
        let a = Email::parse("Someone@Example.com ").unwrap();
        let b = Email::parse("someone@example.com").unwrap();
        assert_eq!(avatar_url(&a, 80), avatar_url(&b, 80));
    }
}
