use regex::Regex;

/// Deliverability gate for every email the pipeline touches, whether it
/// came from discovery or from the fusion step. The fusion capability's own
/// judgment is never trusted as final.
pub struct EmailVerifier {
    syntax: Regex,
}

const REJECTED_FRAGMENTS: [&str; 6] = [
    "noreply",
    "no-reply",
    "donotreply",
    "example.com",
    "example.org",
    "placeholder",
];

impl EmailVerifier {
    pub fn new() -> Self {
        Self {
            syntax: Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap(),
        }
    }

    /// Returns the normalized (lowercased) address, or `None` when the
    /// address is undeliverable.
    pub fn verify(&self, email: &str) -> Option<String> {
        let email = email.trim().to_lowercase();
        if !self.syntax.is_match(&email) || email.contains("..") {
            return None;
        }
        if REJECTED_FRAGMENTS.iter().any(|f| email.contains(f)) {
            return None;
        }
        Some(email)
    }
}

impl Default for EmailVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_normalizes() {
        let verifier = EmailVerifier::new();
        assert_eq!(
            verifier.verify(" Contato@Acme.COM.br "),
            Some("contato@acme.com.br".to_string())
        );
    }

    #[test]
    fn rejects_malformed_and_placeholder_addresses() {
        let verifier = EmailVerifier::new();
        assert!(verifier.verify("not-an-email").is_none());
        assert!(verifier.verify("a@@b.com").is_none());
        assert!(verifier.verify("a..b@acme.com").is_none());
        assert!(verifier.verify("noreply@acme.com").is_none());
        assert!(verifier.verify("someone@example.com").is_none());
    }
}
