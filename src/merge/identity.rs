use crate::config::IdentityPrefixes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// Placeholder account created before Clerk was wired up
    Seed,
    /// Account issued by the production Clerk instance
    Live,
    Unknown,
}

pub fn classify_identity(key: &str, prefixes: &IdentityPrefixes) -> IdentityKind {
    if key.starts_with(&prefixes.seed) {
        IdentityKind::Seed
    } else if key.starts_with(&prefixes.live) {
        IdentityKind::Live
    } else {
        IdentityKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_default_prefixes() {
        let prefixes = IdentityPrefixes::default();

        assert_eq!(classify_identity("seed_clerk_1", &prefixes), IdentityKind::Seed);
        assert_eq!(classify_identity("user_2Nf8x", &prefixes), IdentityKind::Live);
        assert_eq!(classify_identity("", &prefixes), IdentityKind::Unknown);
        assert_eq!(classify_identity("org_19", &prefixes), IdentityKind::Unknown);
        // prefix match is case sensitive
        assert_eq!(classify_identity("USER_2Nf8x", &prefixes), IdentityKind::Unknown);
    }
}
