use crate::error::CredentialError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The decrypted credential set, keyed by case-sensitive service name.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct CredentialMap {
    entries: HashMap<String, CredentialEntry>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CredentialEntry {
    account_id: String,
    secret: String,
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("account_id", &self.account_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl CredentialEntry {
    pub fn new(account_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            secret: secret.into(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl CredentialMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        service: &str,
        account_id: &str,
        secret: &str,
    ) -> Result<(), CredentialError> {
        if self.entries.contains_key(service) {
            return Err(CredentialError::ServiceExists(service.to_string()));
        }
        self.entries
            .insert(service.to_string(), CredentialEntry::new(account_id, secret));
        Ok(())
    }

    pub fn get(&self, service: &str) -> Option<&CredentialEntry> {
        self.entries.get(service)
    }

    /// Replaces the entry for `original`, optionally moving it to `new_service`.
    pub fn update(
        &mut self,
        original: &str,
        new_service: &str,
        account_id: &str,
        secret: &str,
    ) -> Result<(), CredentialError> {
        if !self.entries.contains_key(original) {
            return Err(CredentialError::ServiceNotFound(original.to_string()));
        }
        if new_service != original && self.entries.contains_key(new_service) {
            return Err(CredentialError::ServiceExists(new_service.to_string()));
        }

        self.entries.remove(original);
        self.entries
            .insert(new_service.to_string(), CredentialEntry::new(account_id, secret));
        Ok(())
    }

    pub fn remove(&mut self, service: &str) -> Result<(), CredentialError> {
        match self.entries.remove(service) {
            Some(_) => Ok(()),
            None => Err(CredentialError::ServiceNotFound(service.to_string())),
        }
    }

    /// All entries ordered by service name.
    pub fn sorted(&self) -> Vec<(&str, &CredentialEntry)> {
        let mut items: Vec<_> = self
            .entries
            .iter()
            .map(|(service, entry)| (service.as_str(), entry))
            .collect();
        items.sort_by(|a, b| a.0.cmp(b.0));
        items
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.sorted().into_iter().map(|(service, _)| service).collect()
    }

    /// Case-insensitive substring match on service name or account id.
    pub fn search(&self, term: &str) -> Vec<(&str, &CredentialEntry)> {
        let needle = term.to_lowercase();
        self.sorted()
            .into_iter()
            .filter(|(service, entry)| {
                service.to_lowercase().contains(&needle)
                    || entry.account_id.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CredentialMap {
        let mut map = CredentialMap::new();
        map.insert("github", "octocat", "hunter2").unwrap();
        map.insert("Gmail", "me@example.com", "pw1").unwrap();
        map.insert("bank", "acct-42", "pw2").unwrap();
        map
    }

    #[test]
    fn new_map_is_empty() {
        let map = CredentialMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn insert_and_get_works() {
        let map = sample();
        let entry = map.get("github").unwrap();
        assert_eq!(entry.account_id(), "octocat");
        assert_eq!(entry.secret(), "hunter2");
    }

    #[test]
    fn insert_existing_service_fails() {
        let mut map = sample();
        match map.insert("github", "other", "x") {
            Err(CredentialError::ServiceExists(s)) => assert_eq!(s, "github"),
            other => panic!("expected ServiceExists, got: {other:?}"),
        }
        assert_eq!(map.get("github").unwrap().account_id(), "octocat");
    }

    #[test]
    fn service_names_are_case_sensitive() {
        let mut map = sample();
        map.insert("GitHub", "octocat2", "x").unwrap();
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn update_in_place_works() {
        let mut map = sample();
        map.update("github", "github", "octo", "new").unwrap();
        let entry = map.get("github").unwrap();
        assert_eq!(entry.account_id(), "octo");
        assert_eq!(entry.secret(), "new");
    }

    #[test]
    fn update_with_rename_moves_entry() {
        let mut map = sample();
        map.update("github", "gitlab", "octocat", "hunter2").unwrap();
        assert!(map.get("github").is_none());
        assert_eq!(map.get("gitlab").unwrap().secret(), "hunter2");
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn update_rename_onto_existing_fails() {
        let mut map = sample();
        match map.update("github", "bank", "a", "b") {
            Err(CredentialError::ServiceExists(s)) => assert_eq!(s, "bank"),
            other => panic!("expected ServiceExists, got: {other:?}"),
        }
        assert_eq!(map.get("github").unwrap().secret(), "hunter2");
    }

    #[test]
    fn update_missing_fails() {
        let mut map = sample();
        match map.update("nope", "nope", "a", "b") {
            Err(CredentialError::ServiceNotFound(s)) => assert_eq!(s, "nope"),
            other => panic!("expected ServiceNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn remove_works() {
        let mut map = sample();
        map.remove("bank").unwrap();
        assert!(map.get("bank").is_none());
        assert!(matches!(
            map.remove("bank"),
            Err(CredentialError::ServiceNotFound(_))
        ));
    }

    #[test]
    fn sorted_orders_by_service_name() {
        let map = sample();
        assert_eq!(map.service_names(), vec!["Gmail", "bank", "github"]);
    }

    #[test]
    fn search_matches_service_or_account_ignoring_case() {
        let map = sample();

        let names: Vec<_> = map.search("GIT").into_iter().map(|(s, _)| s).collect();
        assert_eq!(names, vec!["github"]);

        let names: Vec<_> = map.search("example").into_iter().map(|(s, _)| s).collect();
        assert_eq!(names, vec!["Gmail"]);

        assert!(map.search("zzz").is_empty());
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut map = CredentialMap::new();
        map.insert("svc", "acct", "pw").unwrap();

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"svc": {"account_id": "acct", "secret": "pw"}})
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let entry = CredentialEntry::new("acct", "topsecret");
        assert!(!format!("{entry:?}").contains("topsecret"));
    }
}
