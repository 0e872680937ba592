use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// One catalog record: a piece to acquire scores for.
///
/// Identity is the (title, composer) pair; the level is a display label that
/// also prefixes saved filenames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub level: String,
    pub composer: String,
    pub title: String,
}

impl CatalogEntry {
    pub fn new(level: &str, composer: &str, title: &str) -> Result<Self, ScoreError> {
        let level = level.trim().to_string();
        let composer = composer.trim().to_string();
        let title = title.trim().to_string();
        if title.is_empty() || composer.is_empty() {
            return Err(ScoreError::InvalidEntry(format!(
                "{level},{composer},{title}"
            )));
        }
        Ok(Self {
            level,
            composer,
            title,
        })
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {} (level {})", self.title, self.composer, self.level)
    }
}

/// A whitespace-token prefix of an entry's title.
///
/// `narrowed` drops the last token; the sequence of variants for one entry is
/// strictly decreasing in token count and bottoms out at a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleVariant {
    tokens: Vec<String>,
}

impl TitleVariant {
    pub fn full(title: &str) -> Self {
        let tokens = title
            .split_whitespace()
            .map(|token| token.to_string())
            .collect::<Vec<_>>();
        Self { tokens }
    }

    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// The next shorter variant, or `None` once a single token has been tried.
    pub fn narrowed(&self) -> Option<Self> {
        if self.tokens.len() <= 1 {
            return None;
        }
        let mut tokens = self.tokens.clone();
        tokens.pop();
        Some(Self { tokens })
    }
}

impl fmt::Display for TitleVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Identifies which connector produced a candidate or an accepted download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    DuckDuckGo,
    Imslp,
    Archive,
    Mutopia,
}

impl SourceTag {
    pub const ALL: [SourceTag; 4] = [
        SourceTag::DuckDuckGo,
        SourceTag::Imslp,
        SourceTag::Archive,
        SourceTag::Mutopia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::DuckDuckGo => "duckduckgo",
            SourceTag::Imslp => "imslp",
            SourceTag::Archive => "archive",
            SourceTag::Mutopia => "mutopia",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate PDF URL, alive only within one cascade step.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub url: String,
    pub source: SourceTag,
    pub variant: String,
}

/// How processing one entry ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOutcome {
    Complete,
    Incomplete,
    Aborted(String),
}

impl EntryOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, EntryOutcome::Complete)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn entry_requires_title_and_composer() {
        let entry = CatalogEntry::new(" 3 ", " J.S. Bach ", " Minuet in G ").unwrap();
        assert_eq!(entry.level, "3");
        assert_eq!(entry.composer, "J.S. Bach");
        assert_eq!(entry.title, "Minuet in G");

        let err = CatalogEntry::new("3", "", "Minuet in G").unwrap_err();
        assert_matches!(err, ScoreError::InvalidEntry(_));
        let err = CatalogEntry::new("3", "J.S. Bach", "  ").unwrap_err();
        assert_matches!(err, ScoreError::InvalidEntry(_));
    }

    #[test]
    fn variant_narrows_one_token_at_a_time() {
        let mut variant = TitleVariant::full("Minuet in G major");
        let mut counts = vec![variant.token_count()];
        while let Some(next) = variant.narrowed() {
            counts.push(next.token_count());
            variant = next;
        }
        assert_eq!(counts, vec![4, 3, 2, 1]);
        assert_eq!(variant.text(), "Minuet");
        assert!(variant.narrowed().is_none());
    }

    #[test]
    fn single_token_title_has_no_narrower_variant() {
        let variant = TitleVariant::full("Clair");
        assert_eq!(variant.token_count(), 1);
        assert!(variant.narrowed().is_none());
    }

    #[test]
    fn outcome_classification() {
        assert!(EntryOutcome::Complete.is_complete());
        assert!(!EntryOutcome::Incomplete.is_complete());
        assert!(!EntryOutcome::Aborted("disk full".to_string()).is_complete());
    }
}
