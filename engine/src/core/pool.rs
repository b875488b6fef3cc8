//! Credential pool with uniform random selection.
//!
//! Credentials are discovered by scanning the process environment for
//! variables whose names start with a configured prefix (`HF_TOKEN`,
//! `HF_TOKEN_2`, ...). Selection is independent per attempt: a credential may
//! repeat across consecutive attempts and no affinity or rotation order is
//! kept.

use rand::seq::SliceRandom;

use crate::types::Credential;

/// Pool of interchangeable API credentials
#[derive(Debug, Clone, Default)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
}

impl CredentialPool {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    /// Scan the environment for variables starting with `prefix`.
    ///
    /// Blank values are skipped. Entries are sorted by name so logs stay
    /// stable across runs; selection order is random either way.
    pub fn from_env(prefix: &str) -> Self {
        let mut credentials: Vec<Credential> = std::env::vars()
            .filter(|(name, value)| name.starts_with(prefix) && !value.trim().is_empty())
            .map(|(name, value)| Credential::new(name, value.trim().to_string()))
            .collect();
        credentials.sort_by(|a, b| a.name().cmp(b.name()));
        Self::new(credentials)
    }

    /// Pick one credential uniformly at random, `None` when the pool is empty
    pub fn pick(&self) -> Option<Credential> {
        self.credentials.choose(&mut rand::thread_rng()).cloned()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Credential names, for startup diagnostics
    pub fn names(&self) -> Vec<&str> {
        self.credentials.iter().map(|c| c.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_picks_nothing() {
        let pool = CredentialPool::new(vec![]);
        assert!(pool.pick().is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_single_credential_always_selected() {
        let pool = CredentialPool::new(vec![Credential::new("HF_TOKEN", "abc")]);
        for _ in 0..10 {
            let picked = pool.pick().unwrap();
            assert_eq!(picked.name(), "HF_TOKEN");
        }
    }

    #[test]
    fn test_every_credential_reachable() {
        let pool = CredentialPool::new(vec![
            Credential::new("HF_TOKEN", "a"),
            Credential::new("HF_TOKEN_2", "b"),
        ]);

        let mut seen_first = false;
        let mut seen_second = false;
        // 100 draws miss one of two equally likely entries with probability 2^-100
        for _ in 0..100 {
            match pool.pick().unwrap().name() {
                "HF_TOKEN" => seen_first = true,
                "HF_TOKEN_2" => seen_second = true,
                other => panic!("unexpected credential {other}"),
            }
        }
        assert!(seen_first && seen_second);
    }

    #[test]
    fn test_from_env_scans_prefix_and_skips_blanks() {
        std::env::set_var("POOLTEST_A_TOKEN", "first");
        std::env::set_var("POOLTEST_A_TOKEN_2", "second");
        std::env::set_var("POOLTEST_A_TOKEN_3", "   ");
        std::env::set_var("UNRELATED_POOLTEST_A", "ignored");

        let pool = CredentialPool::from_env("POOLTEST_A_TOKEN");
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.names(), vec!["POOLTEST_A_TOKEN", "POOLTEST_A_TOKEN_2"]);

        std::env::remove_var("POOLTEST_A_TOKEN");
        std::env::remove_var("POOLTEST_A_TOKEN_2");
        std::env::remove_var("POOLTEST_A_TOKEN_3");
        std::env::remove_var("UNRELATED_POOLTEST_A");
    }

    #[test]
    fn test_from_env_with_no_matches_is_empty() {
        let pool = CredentialPool::from_env("POOLTEST_B_TOKEN");
        assert!(pool.is_empty());
        assert!(pool.pick().is_none());
    }
}
