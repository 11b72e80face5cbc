use anyhow::{Context, Result};

use crate::api::RiskSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Session cache of every club name the API knows about.
#[derive(Debug, Clone)]
pub struct ClubDirectory {
    names: Vec<String>,
    // Lowercased copies, index-aligned with `names`.
    folded: Vec<String>,
    status: DirectoryStatus,
}

impl Default for ClubDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ClubDirectory {
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            folded: Vec::new(),
            status: DirectoryStatus::Loading,
        }
    }

    pub fn from_names(names: Vec<String>) -> Self {
        let mut directory = Self::new();
        directory.install(names);
        directory
    }

    pub fn load(source: &dyn RiskSource) -> Result<Self> {
        let names = source.club_names().context("club directory fetch failed")?;
        Ok(Self::from_names(names))
    }

    pub fn install(&mut self, names: Vec<String>) {
        self.folded = names.iter().map(|n| n.to_lowercase()).collect();
        self.names = names;
        self.status = DirectoryStatus::Ready;
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = DirectoryStatus::Failed(message.into());
    }

    pub fn status(&self) -> &DirectoryStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == DirectoryStatus::Loading
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Case-insensitive substring match, in directory order.
    pub fn search(&self, term: &str) -> Vec<&str> {
        let needle = term.to_lowercase();
        self.names
            .iter()
            .zip(&self.folded)
            .filter(|(_, folded)| folded.contains(&needle))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> ClubDirectory {
        ClubDirectory::from_names(vec![
            "Manchester City".to_string(),
            "Liverpool".to_string(),
            "Manchester Utd".to_string(),
        ])
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let dir = directory();
        assert_eq!(dir.search("man"), vec!["Manchester City", "Manchester Utd"]);
        assert_eq!(dir.search("POOL"), vec!["Liverpool"]);
        assert_eq!(dir.search("ester c"), vec!["Manchester City"]);
        assert!(dir.search("arsenal").is_empty());
    }

    #[test]
    fn empty_term_matches_everything() {
        assert_eq!(directory().search("").len(), 3);
    }

    #[test]
    fn non_ascii_names_fold() {
        let dir = ClubDirectory::from_names(vec!["Atlético Madrid".to_string()]);
        assert_eq!(dir.search("ATLÉTICO"), vec!["Atlético Madrid"]);
    }

    #[test]
    fn status_transitions() {
        let mut dir = ClubDirectory::new();
        assert!(dir.is_loading());
        dir.mark_failed("offline");
        assert_eq!(dir.status(), &DirectoryStatus::Failed("offline".to_string()));
        assert!(dir.search("a").is_empty());
        dir.install(vec!["Arsenal".to_string()]);
        assert_eq!(dir.status(), &DirectoryStatus::Ready);
        assert!(dir.contains("Arsenal"));
    }
}
